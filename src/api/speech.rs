use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::warn;

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn build_ssml(cfg: &Config, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='en-US'><voice name='{}'><prosody rate='{}'>{}</prosody></voice></speak>",
        cfg.speech_voice,
        cfg.speech_rate,
        xml_escape(text)
    )
}

/// Synthesizes narration speech to an mp3 file. Fixed voice identity and
/// rate come from config; the call itself is a single POST, no retry.
pub async fn synthesize_to_mp3(
    client: &Client,
    cfg: &Config,
    text: &str,
    out_mp3_path: &Path,
) -> Result<bool> {
    let url = format!(
        "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
        cfg.speech_region
    );

    let ssml = build_ssml(cfg, text);

    let resp = client
        .post(&url)
        .header("Ocp-Apim-Subscription-Key", &cfg.speech_api_key)
        .header("Content-Type", "application/ssml+xml")
        .header("X-Microsoft-OutputFormat", "audio-24khz-48kbitrate-mono-mp3")
        .body(ssml)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Speech synthesis request failed")?;

    if !resp.status().is_success() {
        warn!("Speech synthesis failed HTTP {}", resp.status().as_u16());
        return Ok(false);
    }

    let bytes = resp.bytes().await.context("Speech response read failed")?;
    if let Some(parent) = out_mp3_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    fs::write(out_mp3_path, &bytes).await?;

    Ok(fs::metadata(out_mp3_path).await.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssml_escapes_script_text() {
        let cfg = Config::default();
        let ssml = build_ssml(&cfg, "V8s & V12s are <loud>");
        assert!(ssml.contains("V8s &amp; V12s are &lt;loud&gt;"));
        assert!(ssml.contains("en-US-GuyNeural"));
        assert!(ssml.contains("rate='+0%'"));
    }
}
