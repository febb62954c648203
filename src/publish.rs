use crate::api::youtube;
use crate::bundle::ContentBundle;
use crate::workspace::Workspace;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use reqwest::Client;

/// Description and hashtags, blank-line separated, as one upload field.
pub fn compose_description(description: &str, hashtags: &str) -> String {
    format!("{}\n\n{}", description, hashtags)
}

/// Publish stage: upload the latest slot with its metadata, then attach the
/// thumbnail if one exists. The thumbnail call is best-effort; its failure
/// is reported but never fails the stage.
pub async fn run(ws: &Workspace, client: &Client) -> Result<()> {
    let video_path = ws.latest_video_path();
    if !video_path.exists() {
        anyhow::bail!(
            "Latest video not found at {}. Run the video stage first.",
            video_path.display()
        );
    }

    let bundle = ContentBundle::load(ws).await;
    if bundle.title.is_empty() {
        anyhow::bail!("No title found. Run the generate stage first.");
    }
    let full_description = compose_description(&bundle.description, &bundle.hashtags);

    let access_token = youtube::get_access_token(client, ws)
        .await
        .context("YouTube authentication failed")?;

    logi(format!("Uploading video: {}", video_path.display()));
    let video_id =
        youtube::upload_video(client, &access_token, &video_path, &bundle.title, &full_description)
            .await?;
    logok(format!("Video uploaded successfully! Video ID: {}", video_id));

    let thumb_path = ws.thumbnail_path();
    if thumb_path.exists() {
        logi("Uploading thumbnail...");
        match youtube::set_thumbnail(client, &access_token, &video_id, &thumb_path).await {
            Ok(()) => logok("Thumbnail set."),
            Err(err) => logw(format!("Thumbnail upload failed (non-fatal): {}", err)),
        }
    }

    logok("Upload complete.");
    Ok(())
}
