use crate::images::ImageProvider;
use crate::{logi, logw};
use async_trait::async_trait;
use reqwest::Client;

const SEARCH_URL: &str = "https://pixabay.com/api/";

pub struct Pixabay {
    client: Client,
    api_key: String,
}

impl Pixabay {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ImageProvider for Pixabay {
    fn name(&self) -> &'static str {
        "Pixabay"
    }

    fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<String> {
        if !self.enabled() {
            logw("No pixabay_api_key set. Skipping Pixabay.");
            return Vec::new();
        }

        logi(format!("Pixabay search: {:?}", query));
        let per_page = limit.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("image_type", "photo"),
                ("orientation", "vertical"),
                ("category", "transportation"),
                ("per_page", per_page.as_str()),
                ("safesearch", "true"),
            ])
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                logw(format!("Pixabay HTTP {} for {:?}", r.status().as_u16(), query));
                return Vec::new();
            }
            Err(err) => {
                logw(format!("Pixabay request failed: {}", err));
                return Vec::new();
            }
        };

        let root: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(err) => {
                logw(format!("Pixabay response parse failed: {}", err));
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        if let Some(hits) = root.get("hits").and_then(|v| v.as_array()) {
            for hit in hits {
                let link = hit
                    .get("largeImageURL")
                    .or_else(|| hit.get("webformatURL"))
                    .and_then(|v| v.as_str());
                if let Some(link) = link {
                    out.push(link.to_string());
                }
            }
        }
        out
    }
}
