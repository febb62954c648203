pub mod api;
pub mod bundle;
pub mod config;
pub mod generator;
pub mod images;
pub mod pipeline;
pub mod publish;
pub mod review;
pub mod topic;
pub mod video;
pub mod voice;
pub mod workspace;

pub(crate) fn logv(tag: &str, message: &str) {
    eprintln!("[{}] {}", tag, message);
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
