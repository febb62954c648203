use crate::api::speech;
use crate::config::Config;
use crate::workspace::Workspace;
use crate::logok;
use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;

/// Voice synthesis stage. Preconditions are checked before any network
/// traffic: a missing or empty script means the generator never ran, which
/// is an operator error, not a transient one.
pub async fn run(ws: &Workspace, cfg: &Config, client: &Client) -> Result<()> {
    let script_path = ws.script_path();
    let text = fs::read_to_string(&script_path).await.with_context(|| {
        format!(
            "{} not found. Run the generate stage first.",
            script_path.display()
        )
    })?;
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Script is empty.");
    }

    if cfg.speech_api_key.is_empty() {
        anyhow::bail!("config.json: speech_api_key missing (required for voice synthesis)");
    }

    let out_path = ws.voice_path();
    if !speech::synthesize_to_mp3(client, cfg, text, &out_path).await? {
        anyhow::bail!("Voice synthesis failed.");
    }

    logok(format!("Voice generated: {}", out_path.display()));
    Ok(())
}
