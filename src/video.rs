use crate::workspace::{Workspace, IMAGE_EXTENSIONS};
use crate::{logi, logok};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

const FRAME_WIDTH: i32 = 1080;
const FRAME_HEIGHT: i32 = 1920;
const FRAME_RATE: i32 = 30;

// Uniform narration slow-down applied before timing the slideshow.
const AUDIO_TEMPO: &str = "atempo=0.9";

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

async fn ffmpeg_process_audio(in_mp3: &Path, out_mp3: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        in_mp3.display().to_string(),
        "-filter:a".to_string(),
        AUDIO_TEMPO.to_string(),
        out_mp3.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp3.exists())
}

/// Equal-split timing: each image holds the screen for the same share of the
/// narration. Deliberate simplification, no per-image weighting.
pub fn per_image_duration(audio_duration: f64, image_count: usize) -> f64 {
    audio_duration / image_count.max(1) as f64
}

/// Images sorted by filename; the aggregator's zero-padded positional names
/// make lexical sort match download order.
pub async fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            out.push(path);
        }
    }

    out.sort();
    Ok(out)
}

/// Concat-demuxer input listing each image with its on-screen duration. The
/// demuxer ignores the duration on the final entry, so the last file is
/// repeated.
pub fn build_concat_list(images: &[PathBuf], per_image: f64) -> String {
    let mut out = String::new();
    for img in images {
        out.push_str(&format!(
            "file '{}'\nduration {:.6}\n",
            img.display(),
            per_image
        ));
    }
    if let Some(last) = images.last() {
        out.push_str(&format!("file '{}'\n", last.display()));
    }
    out
}

async fn ffmpeg_render_slideshow(
    list_txt: &Path,
    audio_in: &Path,
    out_mp4: &Path,
) -> Result<bool> {
    let filter = format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,fps={fps}[v]",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = FRAME_RATE
    );

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-i".to_string(),
        audio_in.display().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-shortest".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Video assembly stage: slow the narration, time the images against its
/// duration, render the vertical slideshow, and refresh the latest slot the
/// publisher reads.
pub async fn run(ws: &Workspace) -> Result<()> {
    let raw_audio = ws.voice_path();
    if !raw_audio.exists() {
        anyhow::bail!(
            "{} not found. Run the voice stage first.",
            raw_audio.display()
        );
    }

    let images = list_image_files(&ws.images_dir()).await?;
    if images.is_empty() {
        anyhow::bail!(
            "No images found in {}. Run the images stage first.",
            ws.images_dir().display()
        );
    }

    logi("Processing audio with ffmpeg...");
    let processed_audio = ws.voice_processed_path();
    if !ffmpeg_process_audio(&raw_audio, &processed_audio).await? {
        anyhow::bail!("Audio processing failed.");
    }

    let duration = ffprobe_duration_seconds(&processed_audio).await?;
    let per_image = per_image_duration(duration, images.len());
    logi(format!(
        "Audio {:.2}s across {} images ({:.2}s each)",
        duration,
        images.len(),
        per_image
    ));

    ws.ensure_directories().await?;
    let list_path = ws.videos_dir().join("slideshow_list.txt");
    fs::write(&list_path, build_concat_list(&images, per_image)).await?;

    let output_path = ws.video_output_path();
    logi(format!("Rendering slideshow -> {}", output_path.display()));
    if !ffmpeg_render_slideshow(&list_path, &processed_audio, &output_path).await? {
        anyhow::bail!("Slideshow render failed.");
    }

    let latest_path = ws.latest_video_path();
    fs::copy(&output_path, &latest_path)
        .await
        .with_context(|| format!("Failed to update latest slot: {}", latest_path.display()))?;

    logok(format!("Latest video updated: {}", latest_path.display()));
    logok(format!("Video created successfully: {}", output_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn equal_split_timing() {
        let per = per_image_duration(30.0, 5);
        assert_eq!(per, 6.0);
        assert_eq!(per * 5.0, 30.0);
    }

    #[test]
    fn timing_never_divides_by_zero() {
        assert_eq!(per_image_duration(30.0, 0), 30.0);
    }

    #[test]
    fn concat_list_repeats_final_entry() {
        let images = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
        let list = build_concat_list(&images, 6.0);
        let expected = "file 'a.jpg'\nduration 6.000000\nfile 'b.jpg'\nduration 6.000000\nfile 'b.jpg'\n";
        assert_eq!(list, expected);
    }

    #[tokio::test]
    async fn image_listing_sorts_and_filters() {
        let tmp = TempDir::new().unwrap();
        for name in ["car_02.jpg", "car_00.png", "car_01.webp", "notes.txt"] {
            fs::write(tmp.path().join(name), b"x").await.unwrap();
        }

        let files = list_image_files(tmp.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["car_00.png", "car_01.webp", "car_02.jpg"]);
    }
}
