use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::logw;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    /// Empty means the provider is disabled, not misconfigured.
    #[serde(default)]
    pub pexels_api_key: String,
    #[serde(default)]
    pub pixabay_api_key: String,
    #[serde(default = "default_speech_region")]
    pub speech_region: String,
    #[serde(default)]
    pub speech_api_key: String,
    #[serde(default = "default_speech_voice")]
    pub speech_voice: String,
    #[serde(default = "default_speech_rate")]
    pub speech_rate: String,
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:1b".to_string()
}

fn default_speech_region() -> String {
    "eastus".to_string()
}

fn default_speech_voice() -> String {
    "en-US-GuyNeural".to_string()
}

fn default_speech_rate() -> String {
    "+0%".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            pexels_api_key: String::new(),
            pixabay_api_key: String::new(),
            speech_region: default_speech_region(),
            speech_api_key: String::new(),
            speech_voice: default_speech_voice(),
            speech_rate: default_speech_rate(),
        }
    }
}

impl Config {
    /// Loads config.json, falling back to all-defaults when the file is
    /// missing. Credential checks happen at the stage that needs them, so a
    /// keyless config can still run the local-only stages.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            logw(format!(
                "{} not found; using defaults (stock-photo providers disabled)",
                path.display()
            ));
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: Config = serde_json::from_str(r#"{"pexels_api_key":"abc"}"#).unwrap();
        assert_eq!(cfg.pexels_api_key, "abc");
        assert_eq!(cfg.pixabay_api_key, "");
        assert_eq!(cfg.ollama_model, "llama3.2:1b");
        assert_eq!(cfg.speech_voice, "en-US-GuyNeural");
        assert_eq!(cfg.speech_rate, "+0%");
    }
}
