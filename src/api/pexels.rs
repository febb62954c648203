use crate::images::ImageProvider;
use crate::{logi, logw};
use async_trait::async_trait;
use reqwest::Client;

const SEARCH_URL: &str = "https://api.pexels.com/v1/search";

pub struct Pexels {
    client: Client,
    api_key: String,
}

impl Pexels {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ImageProvider for Pexels {
    fn name(&self) -> &'static str {
        "Pexels"
    }

    fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// One bounded GET per query. Errors and non-success statuses yield an
    /// empty list; a single failed provider call never aborts a run.
    async fn search(&self, query: &str, limit: usize) -> Vec<String> {
        if !self.enabled() {
            logw("No pexels_api_key set. Skipping Pexels.");
            return Vec::new();
        }

        logi(format!("Pexels search: {:?}", query));
        let per_page = limit.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "portrait"),
            ])
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                logw(format!("Pexels HTTP {} for {:?}", r.status().as_u16(), query));
                return Vec::new();
            }
            Err(err) => {
                logw(format!("Pexels request failed: {}", err));
                return Vec::new();
            }
        };

        let root: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(err) => {
                logw(format!("Pexels response parse failed: {}", err));
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        if let Some(photos) = root.get("photos").and_then(|v| v.as_array()) {
            for photo in photos {
                let src = photo.get("src");
                let link = src
                    .and_then(|s| s.get("large"))
                    .or_else(|| src.and_then(|s| s.get("large2x")))
                    .or_else(|| src.and_then(|s| s.get("original")))
                    .and_then(|v| v.as_str());
                if let Some(link) = link {
                    out.push(link.to_string());
                }
            }
        }
        out
    }
}
