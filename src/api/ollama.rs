use crate::config::Config;
use crate::logi;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

/// Sends a generation prompt to the local Ollama endpoint and returns the raw
/// response text. An unreachable endpoint or a non-200 status is fatal here:
/// with no model output there is nothing downstream to repair.
pub async fn generate(client: &Client, cfg: &Config, prompt: &str) -> Result<String> {
    logi(format!("Calling Ollama at {}", cfg.ollama_url));

    let body = json!({
        "model": cfg.ollama_model,
        "prompt": prompt,
        "stream": false,
        "options": {
            "num_predict": 220,
            "temperature": 0.8,
        },
    });

    let resp = client
        .post(&cfg.ollama_url)
        .json(&body)
        .timeout(std::time::Duration::from_secs(150))
        .send()
        .await
        .with_context(|| {
            format!(
                "Could not connect to Ollama at {} (is `ollama serve` running and is {} pulled?)",
                cfg.ollama_url, cfg.ollama_model
            )
        })?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        let snippet = raw.chars().take(400).collect::<String>();
        anyhow::bail!("Ollama returned HTTP {} (body starts: {})", status.as_u16(), snippet);
    }

    let root: serde_json::Value =
        serde_json::from_str(&raw).context("Ollama response was not valid JSON")?;
    let text = root
        .get("response")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(text)
}
