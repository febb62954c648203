use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::workspace::Workspace;

/// The five generated-text fields every run produces. Fields are always
/// present as strings, never absent; a degraded generation yields
/// placeholders instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub image_query: String,
}

/// How much repair it took to get a usable bundle out of the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFidelity {
    /// The output contained a parseable JSON object.
    Parsed,
    /// No valid JSON, but `"key": "value"` pairs were scavenged from the text.
    PartiallyRepaired,
    /// Nothing usable at all; the fixed placeholder bundle was substituted.
    Placeholder,
}

impl ContentBundle {
    pub fn placeholder() -> Self {
        Self {
            title: "Unknown Title".to_string(),
            description: "No description generated.".to_string(),
            hashtags: "#cars".to_string(),
            script: "No script generated.".to_string(),
            image_query: "car engine".to_string(),
        }
    }

    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.hashtags = self.hashtags.trim().to_string();
        self.script = self.script.trim().to_string();
        self.image_query = self.image_query.trim().to_string();
        self
    }

    pub async fn save(&self, ws: &Workspace) -> Result<()> {
        ws.ensure_directories().await?;
        for (path, value) in [
            (ws.title_path(), &self.title),
            (ws.description_path(), &self.description),
            (ws.hashtags_path(), &self.hashtags),
            (ws.script_path(), &self.script),
            (ws.image_query_path(), &self.image_query),
        ] {
            fs::write(&path, value.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }

    /// Missing files read back as empty strings; downstream stages decide
    /// whether empty is fatal for them.
    pub async fn load(ws: &Workspace) -> Self {
        async fn read_or_empty(path: std::path::PathBuf) -> String {
            fs::read_to_string(&path)
                .await
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        }

        Self {
            title: read_or_empty(ws.title_path()).await,
            description: read_or_empty(ws.description_path()).await,
            hashtags: read_or_empty(ws.hashtags_path()).await,
            script: read_or_empty(ws.script_path()).await,
            image_query: read_or_empty(ws.image_query_path()).await,
        }
    }
}

fn pair_regex() -> &'static Regex {
    static PAIR_RE: OnceCell<Regex> = OnceCell::new();
    PAIR_RE.get_or_init(|| {
        Regex::new(r#""([^"]+)"\s*:\s*"([^"]*)""#).expect("pair regex is valid")
    })
}

fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Repair ladder for raw model output; first rung that succeeds wins.
/// Always returns a bundle, tagged with how degraded it is.
pub fn extract_bundle(raw: &str) -> (ContentBundle, ContentFidelity) {
    if let Some(block) = first_json_object(raw) {
        if let Ok(bundle) = serde_json::from_str::<ContentBundle>(block) {
            return (bundle.trimmed(), ContentFidelity::Parsed);
        }
    }

    let mut found_any = false;
    let mut bundle = ContentBundle::default();
    for cap in pair_regex().captures_iter(raw) {
        found_any = true;
        let value = cap[2].to_string();
        match &cap[1] {
            "title" => bundle.title = value,
            "description" => bundle.description = value,
            "hashtags" => bundle.hashtags = value,
            "script" => bundle.script = value,
            "image_query" => bundle.image_query = value,
            _ => {}
        }
    }
    if found_any {
        return (bundle.trimmed(), ContentFidelity::PartiallyRepaired);
    }

    (ContentBundle::placeholder(), ContentFidelity::Placeholder)
}

pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|p| !p.trim().is_empty())
        .count()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().filter(|w| !w.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_parses_exactly() {
        let raw = r##"Sure, here is your JSON:
{
  "title": "Turbo Secrets 🔥",
  "description": "A quick look at turbo lag.",
  "hashtags": "#cars #turbo #jdm #engineering #speed",
  "script": "Turbos changed everything. Here is why.",
  "image_query": "turbo engine bay"
}
Hope that helps!"##;

        let (bundle, fidelity) = extract_bundle(raw);
        assert_eq!(fidelity, ContentFidelity::Parsed);
        assert_eq!(bundle.title, "Turbo Secrets 🔥");
        assert_eq!(bundle.image_query, "turbo engine bay");
    }

    #[test]
    fn broken_json_falls_back_to_pair_scan() {
        // Trailing comma makes the object unparseable; pairs still salvage.
        let raw = r#"{ "title": "V12 Facts 🏎", "script": "Twelve cylinders.", }"#;
        let (bundle, fidelity) = extract_bundle(raw);
        assert_eq!(fidelity, ContentFidelity::PartiallyRepaired);
        assert_eq!(bundle.title, "V12 Facts 🏎");
        assert_eq!(bundle.script, "Twelve cylinders.");
        // Unmatched keys stay empty, never absent.
        assert_eq!(bundle.description, "");
        assert_eq!(bundle.hashtags, "");
    }

    #[test]
    fn pair_scan_ignores_unknown_keys() {
        let raw = r#"garbage "title": "A", "mood": "excited" garbage"#;
        let (bundle, fidelity) = extract_bundle(raw);
        assert_eq!(fidelity, ContentFidelity::PartiallyRepaired);
        assert_eq!(bundle.title, "A");
        assert_eq!(bundle.script, "");
    }

    #[test]
    fn hopeless_output_yields_placeholder() {
        let (bundle, fidelity) = extract_bundle("I refuse to answer in JSON.");
        assert_eq!(fidelity, ContentFidelity::Placeholder);
        assert_eq!(bundle, ContentBundle::placeholder());

        // Deterministic and idempotent.
        let (again, f2) = extract_bundle("I refuse to answer in JSON.");
        assert_eq!(f2, ContentFidelity::Placeholder);
        assert_eq!(again, bundle);
    }

    #[test]
    fn fields_are_trimmed() {
        let raw = r#"{ "title": "  Spaces 🚗  ", "description": " x " }"#;
        let (bundle, _) = extract_bundle(raw);
        assert_eq!(bundle.title, "Spaces 🚗");
        assert_eq!(bundle.description, "x");
    }

    #[test]
    fn sentence_and_word_counters() {
        let text = "One. Two! Three? ";
        assert_eq!(count_sentences(text), 3);
        assert_eq!(count_words("a quick brown fox"), 4);
        assert_eq!(count_words(""), 0);
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let bundle = ContentBundle::placeholder();
        bundle.save(&ws).await.unwrap();

        let loaded = ContentBundle::load(&ws).await;
        assert_eq!(loaded, bundle);
    }

    #[tokio::test]
    async fn load_defaults_missing_files_to_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        let loaded = ContentBundle::load(&ws).await;
        assert_eq!(loaded, ContentBundle::default());
    }
}
