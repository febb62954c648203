use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::{logi, logok};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// All pipeline artifacts live under a single root so stages hand data to
/// each other through well-known paths instead of in-process calls.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("assets/images")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("assets/videos")
    }

    pub fn latest_dir(&self) -> PathBuf {
        self.root.join("assets/latest_video")
    }

    pub fn title_path(&self) -> PathBuf {
        self.data_dir().join("title.txt")
    }

    pub fn description_path(&self) -> PathBuf {
        self.data_dir().join("description.txt")
    }

    pub fn hashtags_path(&self) -> PathBuf {
        self.data_dir().join("hashtags.txt")
    }

    pub fn script_path(&self) -> PathBuf {
        self.data_dir().join("script.txt")
    }

    pub fn image_query_path(&self) -> PathBuf {
        self.data_dir().join("image_query.txt")
    }

    pub fn voice_path(&self) -> PathBuf {
        self.data_dir().join("voice.mp3")
    }

    pub fn voice_processed_path(&self) -> PathBuf {
        self.data_dir().join("voice_processed.mp3")
    }

    pub fn video_output_path(&self) -> PathBuf {
        self.videos_dir().join("video_output.mp4")
    }

    pub fn latest_video_path(&self) -> PathBuf {
        self.latest_dir().join("final.mp4")
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.images_dir().join("thumbnail.jpg")
    }

    pub fn token_path(&self) -> PathBuf {
        self.root.join("token.json")
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.root.join("client_secret.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.data_dir(),
            self.images_dir(),
            self.videos_dir(),
            self.latest_dir(),
        ] {
            if !dir.exists() {
                fs::create_dir_all(&dir).await?;
            }
        }
        Ok(())
    }

    /// Unconditional pre-run reset: every artifact is regenerated each run,
    /// so prior contents are cleared wholesale. OAuth files at the root are
    /// untouched.
    pub async fn reset(&self) -> Result<()> {
        logi("Resetting workspace directories...");
        for dir in [
            self.data_dir(),
            self.images_dir(),
            self.videos_dir(),
            self.latest_dir(),
        ] {
            clear_directory_contents(&dir).await?;
        }
        self.ensure_directories().await?;
        logok("Workspace reset complete.");
        Ok(())
    }
}

async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

pub async fn clear_directory_contents(dir_path: &Path) -> Result<()> {
    if !dir_exists(dir_path).await {
        return Ok(());
    }

    for entry in WalkDir::new(dir_path).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir(path).await.ok();
        } else {
            fs::remove_file(path).await.ok();
        }
    }

    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
