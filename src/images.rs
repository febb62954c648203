use crate::api::pexels::Pexels;
use crate::api::pixabay::Pixabay;
use crate::bundle::ContentBundle;
use crate::config::Config;
use crate::topic::{expand_queries, resolve_base_query};
use crate::workspace::{Workspace, IMAGE_EXTENSIONS};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;

const PER_PROVIDER_LIMIT: usize = 6;
const RAW_URL_SOFT_CAP: usize = 12;
const FALLBACK_SOFT_CAP: usize = 10;
const MAX_DOWNLOADS: usize = 10;
const FALLBACK_QUERY: &str = "supercar";

/// A stock-photo search service. Implementations never propagate errors:
/// a failed or keyless provider is an empty result list, not an abort.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn enabled(&self) -> bool;
    async fn search(&self, query: &str, limit: usize) -> Vec<String>;
}

/// Drops duplicate URLs, keeping the first occurrence of each in its
/// original relative order.
pub fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(urls.len());
    for url in urls {
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out
}

/// File extension inferred from the URL path (query string ignored),
/// defaulting to .jpg for anything unrecognized.
pub fn infer_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();

    for ext in IMAGE_EXTENSIONS {
        let suffix = format!(".{}", ext);
        if path.ends_with(&suffix) {
            return suffix;
        }
    }
    ".jpg".to_string()
}

/// Zero-padded positional names so lexical sort equals download order.
pub fn image_filename(index: usize, ext: &str) -> String {
    format!("car_{:02}{}", index, ext)
}

async fn collect_urls(
    providers: &[&dyn ImageProvider],
    queries: &[String],
    soft_cap: usize,
) -> Vec<String> {
    let mut raw = Vec::new();
    for query in queries {
        // Soft cap: checked before each query, so one extra round of
        // provider calls may overshoot slightly.
        if raw.len() >= soft_cap {
            break;
        }
        for provider in providers {
            raw.extend(provider.search(query, PER_PROVIDER_LIMIT).await);
        }
    }
    raw
}

/// Query all providers across the shuffled variants, then dedup. An empty
/// result triggers one full retry with the hard-coded fallback phrase;
/// still-empty is fatal since there is nothing to compose a video from.
pub async fn gather_urls(providers: &[&dyn ImageProvider], base_query: &str) -> Result<Vec<String>> {
    let queries = expand_queries(base_query);
    let urls = dedup_urls(collect_urls(providers, &queries, RAW_URL_SOFT_CAP).await);
    if !urls.is_empty() {
        return Ok(urls);
    }

    logw(format!(
        "No images found for {:?}. Falling back to generic {:?}.",
        base_query, FALLBACK_QUERY
    ));
    let fallback_queries = expand_queries(FALLBACK_QUERY);
    let urls = dedup_urls(collect_urls(providers, &fallback_queries, FALLBACK_SOFT_CAP).await);
    if urls.is_empty() {
        anyhow::bail!("Still no images found. Check API keys or internet.");
    }
    Ok(urls)
}

async fn purge_images(ws: &Workspace) -> Result<()> {
    let dir = ws.images_dir();
    if !dir.exists() {
        return Ok(());
    }
    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            fs::remove_file(&path).await.ok();
        }
    }
    Ok(())
}

async fn download_images(
    client: &Client,
    ws: &Workspace,
    urls: &[String],
) -> Result<Vec<PathBuf>> {
    ws.ensure_directories().await?;
    purge_images(ws).await?;

    let selected = &urls[..urls.len().min(MAX_DOWNLOADS)];
    logi(format!("Downloading {} images...", selected.len()));

    let mut saved = Vec::new();
    for (i, url) in selected.iter().enumerate() {
        let ext = infer_extension(url);
        let out_path = ws.images_dir().join(image_filename(i, &ext));

        let result = async {
            let resp = client
                .get(url)
                .timeout(std::time::Duration::from_secs(20))
                .send()
                .await?;
            let resp = resp.error_for_status()?;
            let bytes = resp.bytes().await?;
            fs::write(&out_path, &bytes).await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                logok(format!("Saved {}", out_path.display()));
                saved.push(out_path);
            }
            Err(err) => {
                logw(format!("Failed {}: {}", url, err));
            }
        }
    }

    // A run where every download fails must not slide an empty image set
    // into the video assembler.
    if saved.is_empty() {
        anyhow::bail!("All image downloads failed; nothing saved.");
    }

    Ok(saved)
}

/// Image aggregation stage: resolve the base query from generated content,
/// fan out to the providers, download a bounded deduplicated set.
pub async fn run(ws: &Workspace, cfg: &Config, client: &Client) -> Result<Vec<PathBuf>> {
    let bundle = ContentBundle::load(ws).await;

    let base = resolve_base_query(&bundle.title, &bundle.script, &bundle.image_query);
    if bundle.image_query.trim().is_empty() {
        logi(format!("No AI image_query found. Detected car topic: {}", base));
    } else {
        logi(format!("Using AI image_query from model: {}", base));
    }

    let pexels = Pexels::new(client.clone(), cfg.pexels_api_key.clone());
    let pixabay = Pixabay::new(client.clone(), cfg.pixabay_api_key.clone());
    let providers: [&dyn ImageProvider; 2] = [&pexels, &pixabay];
    for provider in providers {
        if !provider.enabled() {
            logw(format!("{} has no API key; provider disabled.", provider.name()));
        }
    }

    let urls = gather_urls(&providers, &base).await?;
    logi(format!("Collected {} unique image URLs", urls.len()));

    let saved = download_images(client, ws, &urls)
        .await
        .context("Image download step failed")?;
    logok(format!("Images downloaded: {}", saved.len()));
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeProvider {
        batches: Mutex<Vec<Vec<String>>>,
        calls: Mutex<usize>,
    }

    impl FakeProvider {
        fn new(batches: Vec<Vec<String>>) -> Self {
            Self {
                batches: Mutex::new(batches),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ImageProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "Fake"
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn search(&self, _query: &str, _limit: usize) -> Vec<String> {
            *self.calls.lock().unwrap() += 1;
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.remove(0)
            }
        }
    }

    fn urls(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://x/{}{}.jpg", prefix, i)).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let input = vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
            "b".to_string(),
        ];
        assert_eq!(dedup_urls(input), vec!["a", "b", "c"]);
    }

    #[test]
    fn extension_inferred_from_path_not_query() {
        assert_eq!(infer_extension("https://x/a.png?fm=jpg"), ".png");
        assert_eq!(infer_extension("https://x/a.WEBP"), ".webp");
        assert_eq!(infer_extension("https://x/photo"), ".jpg");
        assert_eq!(infer_extension("https://x/a.jpeg#frag"), ".jpeg");
    }

    #[test]
    fn filenames_are_zero_padded() {
        assert_eq!(image_filename(0, ".jpg"), "car_00.jpg");
        assert_eq!(image_filename(9, ".png"), "car_09.png");
    }

    #[tokio::test]
    async fn soft_cap_stops_further_queries() {
        // 7 shuffled queries against one provider returning 6 per call:
        // after two queries the 12-URL cap is reached, so only 2 calls.
        let provider = FakeProvider::new(vec![
            urls("a", 6),
            urls("b", 6),
            urls("c", 6),
            urls("d", 6),
            urls("e", 6),
            urls("f", 6),
            urls("g", 6),
        ]);
        let providers: [&dyn ImageProvider; 1] = [&provider];

        let got = gather_urls(&providers, "jdm car").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(got.len(), 12);
    }

    #[tokio::test]
    async fn empty_results_fall_back_then_fail() {
        let provider = FakeProvider::new(Vec::new());
        let providers: [&dyn ImageProvider; 1] = [&provider];

        let err = gather_urls(&providers, "jdm car").await.unwrap_err();
        assert!(err.to_string().contains("no images"));
        // Primary pass (7 queries) plus fallback pass (7 queries).
        assert_eq!(provider.call_count(), 14);
    }

    #[tokio::test]
    async fn fallback_pass_can_rescue_a_run() {
        // Primary pass returns nothing (7 empty batches), fallback hits.
        let mut batches = vec![Vec::new(); 7];
        batches.push(urls("fb", 3));
        let provider = FakeProvider::new(batches);
        let providers: [&dyn ImageProvider; 1] = [&provider];

        let got = gather_urls(&providers, "jdm car").await.unwrap();
        assert_eq!(got.len(), 3);
    }
}
