use crate::api::ollama;
use crate::bundle::{count_sentences, count_words, extract_bundle, ContentBundle, ContentFidelity};
use crate::config::Config;
use crate::workspace::Workspace;
use crate::{logi, logok, logw};
use anyhow::Result;
use reqwest::Client;

const PROMPT: &str = r#"You MUST return ONLY a valid JSON object with EXACTLY these five keys:
"title", "description", "hashtags", "script", "image_query".

Format STRICTLY like this:

{
  "title": "...",
  "description": "...",
  "hashtags": "...",
  "script": "...",
  "image_query": "..."
}

Do NOT add explanations.
Do NOT add extra words.
Do NOT add markdown.
Return ONLY the JSON object.

=====================
CONTENT RULES:
=====================

TOPIC:
- Must be a car fact, car engineering detail, automotive history, supercar feature, or racing fact.

TITLE RULES:
- Max 55 characters.
- Must include exactly ONE emoji.
- No quotes.
- No hashtags.

DESCRIPTION RULES:
- 1-2 short sentences only.
- No emojis.
- No hashtags.

HASHTAG RULES:
- 5 to 12 hashtags.
- Space-separated, no commas.

IMAGE_QUERY RULES:
- 3-6 words.
- MUST be about cars or engines.
- Must be based on our script and title.
- No emojis, no hashtags, no quotes.

=====================
30-SECOND SCRIPT RULES:
=====================

LENGTH:
- Script MUST be 6 to 8 sentences.
- Script MUST be 70 to 95 words.
- Script MUST sound natural when spoken aloud.
- Style should feel like storytelling.

STYLE:
- Conversational, energetic, simple English.
- No emojis.
- No hashtags.
- No references to YouTube or "video".
- No filler lines like "hi guys" or "subscribe".
- No repeated sentences.

STRUCTURE:
1. Hook sentence that grabs attention fast.
2. Introduce the car or technology.
3. Explain the problem or challenge.
4. Reveal the surprising fact.
5. Explain the impact.
6. Add a rare/unknown twist.
7. Why it matters.
8. Strong closing sentence with a punch.

Return ONLY the JSON."#;

/// Content generation stage: prompt the model, repair the output into a
/// ContentBundle, persist the five field files. Only the endpoint call
/// itself can fail here; malformed output is repaired, never fatal.
pub async fn run(ws: &Workspace, cfg: &Config, client: &Client) -> Result<ContentBundle> {
    logi("Asking Ollama for car content...");

    let raw = ollama::generate(client, cfg, PROMPT).await?;
    logi(format!("Raw model output ({} bytes)", raw.len()));

    let (bundle, fidelity) = extract_bundle(&raw);
    match fidelity {
        ContentFidelity::Parsed => {}
        ContentFidelity::PartiallyRepaired => {
            logw("Model output was not valid JSON; repaired from key/value pairs.");
        }
        ContentFidelity::Placeholder => {
            logw("Model output contained nothing usable; falling back to placeholder content.");
        }
    }

    let sentences = count_sentences(&bundle.script);
    let words = count_words(&bundle.script);
    if !(6..=8).contains(&sentences) || !(70..=95).contains(&words) {
        logw(format!(
            "Script off target: {} sentences / {} words (wanted 6-8 / 70-95)",
            sentences, words
        ));
    }

    bundle.save(ws).await?;

    logok("AI content generated.");
    logi(format!("Title: {}", bundle.title));
    logi(format!("Image query: {}", bundle.image_query));

    Ok(bundle)
}
