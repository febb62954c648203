//! Stage boundary checks: every stage validates its upstream artifacts
//! before touching the network or spawning ffmpeg, so a half-run workspace
//! fails fast with an actionable message.

use car_shorts::bundle::ContentBundle;
use car_shorts::config::Config;
use car_shorts::workspace::Workspace;
use car_shorts::{video, voice};
use reqwest::Client;
use tempfile::TempDir;
use tokio::fs;

#[tokio::test]
async fn assembler_fails_without_images_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::new(tmp.path());
    ws.ensure_directories().await.unwrap();

    // Narration exists, image directory is empty.
    fs::write(ws.voice_path(), b"fake mp3 bytes").await.unwrap();

    let err = video::run(&ws).await.unwrap_err();
    assert!(err.to_string().contains("No images found"));
    assert!(!ws.video_output_path().exists());
    assert!(!ws.latest_video_path().exists());
}

#[tokio::test]
async fn assembler_fails_without_narration() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::new(tmp.path());
    ws.ensure_directories().await.unwrap();
    fs::write(ws.images_dir().join("car_00.jpg"), b"img")
        .await
        .unwrap();

    let err = video::run(&ws).await.unwrap_err();
    assert!(err.to_string().contains("voice stage"));
}

#[tokio::test]
async fn voice_fails_when_script_is_absent() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::new(tmp.path());
    ws.ensure_directories().await.unwrap();

    // No data/script.txt: must fail before any network call, which is why an
    // unroutable config never gets exercised here.
    let cfg = Config::default();
    let err = voice::run(&ws, &cfg, &Client::new()).await.unwrap_err();
    assert!(err.to_string().contains("generate stage"));
    assert!(!ws.voice_path().exists());
}

#[tokio::test]
async fn voice_fails_on_empty_script() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::new(tmp.path());
    ws.ensure_directories().await.unwrap();
    fs::write(ws.script_path(), "   \n").await.unwrap();

    let cfg = Config::default();
    let err = voice::run(&ws, &cfg, &Client::new()).await.unwrap_err();
    assert!(err.to_string().contains("Script is empty"));
}

#[tokio::test]
async fn bundle_files_survive_between_stages() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::new(tmp.path());

    let mut bundle = ContentBundle::placeholder();
    bundle.title = "Turbo Secrets 🔥".to_string();
    bundle.save(&ws).await.unwrap();

    // A later stage sees exactly what the generator wrote.
    let loaded = ContentBundle::load(&ws).await;
    assert_eq!(loaded.title, "Turbo Secrets 🔥");
    assert_eq!(loaded.hashtags, "#cars");
}
