use crate::workspace::Workspace;
use crate::{logi, logok};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

const SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const THUMBNAIL_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";

// Installed-app redirect: the user pastes the code back by hand.
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: InstalledSecret,
}

#[derive(Debug, Deserialize)]
struct InstalledSecret {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_at: u64,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn load_client_secret(ws: &Workspace) -> Result<InstalledSecret> {
    let path = ws.client_secret_path();
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: ClientSecretFile =
        serde_json::from_str(&content).context("client_secret.json: unexpected format")?;
    Ok(parsed.installed)
}

async fn exchange_token(
    client: &Client,
    secret: &InstalledSecret,
    params: &[(&str, &str)],
) -> Result<StoredToken> {
    let mut form: Vec<(&str, &str)> = vec![
        ("client_id", secret.client_id.as_str()),
        ("client_secret", secret.client_secret.as_str()),
    ];
    form.extend_from_slice(params);

    let resp = client
        .post(TOKEN_URL)
        .form(&form)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("OAuth token request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        let snippet = raw.chars().take(400).collect::<String>();
        anyhow::bail!("OAuth token endpoint HTTP {}: {}", status.as_u16(), snippet);
    }

    let root: serde_json::Value =
        serde_json::from_str(&raw).context("OAuth token response was not valid JSON")?;
    let access_token = root
        .get("access_token")
        .and_then(|v| v.as_str())
        .context("OAuth response missing access_token")?
        .to_string();
    let refresh_token = root
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let expires_in = root.get("expires_in").and_then(|v| v.as_u64()).unwrap_or(0);

    Ok(StoredToken {
        access_token,
        refresh_token,
        expires_at: now_unix() + expires_in,
    })
}

fn prompt_auth_code(secret: &InstalledSecret) -> Result<String> {
    let consent_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline",
        AUTH_URL, secret.client_id, REDIRECT_URI, SCOPE
    );

    logi("No stored token found. Complete the one-time OAuth consent:");
    logi(format!("  1. Open: {}", consent_url));
    eprint!("  2. Paste the authorization code here: ");

    let mut code = String::new();
    std::io::stdin()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;
    let code = code.trim().to_string();
    if code.is_empty() {
        anyhow::bail!("Empty authorization code");
    }
    Ok(code)
}

async fn save_token(ws: &Workspace, token: &StoredToken) -> Result<()> {
    let json = serde_json::to_string_pretty(token)?;
    fs::write(ws.token_path(), json)
        .await
        .context("Failed to persist token.json")?;
    Ok(())
}

/// Returns a usable access token: the stored one when still fresh, a
/// refreshed one when expired, or the result of the one-time interactive
/// consent flow when no token has been persisted yet.
pub async fn get_access_token(client: &Client, ws: &Workspace) -> Result<String> {
    let token_path = ws.token_path();

    if token_path.exists() {
        let content = fs::read_to_string(&token_path)
            .await
            .context("Failed to read token.json")?;
        let stored: StoredToken =
            serde_json::from_str(&content).context("token.json: unexpected format")?;

        if stored.expires_at > now_unix() + 60 {
            return Ok(stored.access_token);
        }

        if !stored.refresh_token.is_empty() {
            let secret = load_client_secret(ws).await?;
            let mut refreshed = exchange_token(
                client,
                &secret,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", stored.refresh_token.as_str()),
                ],
            )
            .await?;
            if refreshed.refresh_token.is_empty() {
                refreshed.refresh_token = stored.refresh_token;
            }
            save_token(ws, &refreshed).await?;
            return Ok(refreshed.access_token);
        }
    }

    let secret = load_client_secret(ws).await?;
    let code = prompt_auth_code(&secret)?;
    let token = exchange_token(
        client,
        &secret,
        &[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ],
    )
    .await?;
    save_token(ws, &token).await?;
    logok("OAuth token saved to token.json");
    Ok(token.access_token)
}

/// Resumable upload: open a session with the metadata, then PUT the bytes.
/// Returns the platform-assigned video id.
pub async fn upload_video(
    client: &Client,
    access_token: &str,
    video_path: &Path,
    title: &str,
    description: &str,
) -> Result<String> {
    let metadata = json!({
        "snippet": {
            "title": title,
            "description": description,
            "categoryId": "28",
        },
        "status": {
            "privacyStatus": "public",
        },
    });

    let resp = client
        .post(UPLOAD_URL)
        .bearer_auth(access_token)
        .header("X-Upload-Content-Type", "video/mp4")
        .json(&metadata)
        .timeout(std::time::Duration::from_secs(60))
        .send()
        .await
        .context("Upload session request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let raw = resp.text().await.unwrap_or_default();
        let snippet = raw.chars().take(400).collect::<String>();
        anyhow::bail!("Upload session HTTP {}: {}", status.as_u16(), snippet);
    }

    let session_uri = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .context("Upload session response missing Location header")?
        .to_string();

    let bytes = fs::read(video_path)
        .await
        .with_context(|| format!("Failed to read video: {}", video_path.display()))?;
    logi(format!("Uploading {} bytes...", bytes.len()));

    let resp = client
        .put(&session_uri)
        .bearer_auth(access_token)
        .header("Content-Type", "video/mp4")
        .body(bytes)
        .timeout(std::time::Duration::from_secs(1800))
        .send()
        .await
        .context("Video upload failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        let snippet = raw.chars().take(400).collect::<String>();
        anyhow::bail!("Video upload HTTP {}: {}", status.as_u16(), snippet);
    }

    let root: serde_json::Value =
        serde_json::from_str(&raw).context("Upload response was not valid JSON")?;
    let video_id = root
        .get("id")
        .and_then(|v| v.as_str())
        .context("Upload response missing video id")?
        .to_string();

    Ok(video_id)
}

/// Secondary best-effort call. The caller decides what a failure means; this
/// reports it instead of swallowing it.
pub async fn set_thumbnail(
    client: &Client,
    access_token: &str,
    video_id: &str,
    thumbnail_path: &Path,
) -> Result<()> {
    let bytes = fs::read(thumbnail_path)
        .await
        .with_context(|| format!("Failed to read thumbnail: {}", thumbnail_path.display()))?;

    let resp = client
        .post(THUMBNAIL_URL)
        .query(&[("videoId", video_id)])
        .bearer_auth(access_token)
        .header("Content-Type", "image/jpeg")
        .body(bytes)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Thumbnail upload failed")?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("Thumbnail upload HTTP {}", status.as_u16());
    }
    Ok(())
}
