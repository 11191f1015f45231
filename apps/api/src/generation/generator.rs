//! Post generation — orchestrates one request end to end.
//!
//! Flow: validate → build prompt → AI call → parse content → persist → return.
//!
//! Nothing is persisted unless the AI reply parsed completely. A failed save
//! is reported as `AppError::Persist`, separate from generation failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::POST_PROMPT_TEMPLATE;
use crate::llm_client::LlmClient;
use crate::models::post::{NewPost, Post};
use crate::posts::store::PostStore;

pub const MISSING_FIELDS: &str = "Missing required fields";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /generate`, as sent by the client.
/// Fields are optional here so that absence is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub platform: Option<String>,
    pub persona: Option<String>,
}

/// A validated generation request. All fields are non-blank.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub topic: String,
    pub tone: String,
    pub platform: String,
    pub persona: String,
}

/// The three artifacts the AI service must return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub caption: String,
    pub image_prompt: String,
    pub hashtags: Vec<String>,
}

/// Everything a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub envelope: Value,
    pub content: GeneratedContent,
    pub post: Post,
}

impl GenerateBody {
    pub fn validate(self) -> Result<GenerationRequest, AppError> {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|v| !v.trim().is_empty())
        }

        match (
            present(self.topic),
            present(self.tone),
            present(self.platform),
            present(self.persona),
        ) {
            (Some(topic), Some(tone), Some(platform), Some(persona)) => Ok(GenerationRequest {
                topic,
                tone,
                platform,
                persona,
            }),
            _ => Err(AppError::Validation(MISSING_FIELDS.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs one generation and persists the result.
pub async fn generate_post(
    llm: &LlmClient,
    store: &dyn PostStore,
    request: GenerationRequest,
) -> Result<GenerationOutcome, AppError> {
    info!(
        "Generating post: topic={:?} platform={:?}",
        request.topic, request.platform
    );

    let prompt = build_prompt(&request);
    let generation = llm.call_json::<GeneratedContent>(&prompt).await?;
    let content = generation.content;

    let post = store
        .save(NewPost {
            topic: request.topic,
            persona: request.persona,
            tone: request.tone,
            platform: request.platform,
            caption: content.caption.clone(),
            image_prompt: content.image_prompt.clone(),
            hashtags: content.hashtags.clone(),
        })
        .await
        .map_err(AppError::Persist)?;

    info!(
        "Generated post {} with {} hashtags",
        post.id,
        post.hashtags.len()
    );

    Ok(GenerationOutcome {
        envelope: generation.envelope,
        content,
        post,
    })
}

/// Fills the prompt template with the request fields.
pub fn build_prompt(request: &GenerationRequest) -> String {
    fill_template(
        POST_PROMPT_TEMPLATE,
        &[
            ("persona", request.persona.as_str()),
            ("topic", request.topic.as_str()),
            ("tone", request.tone.as_str()),
            ("platform", request.platform.as_str()),
        ],
    )
}

/// Substitutes `{key}` placeholders in a single pass over the template.
/// Substituted values are copied verbatim and never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let after_brace = &rest[start + 1..];

        let substitution = values.iter().find_map(|(key, value)| {
            after_brace
                .strip_prefix(*key)
                .and_then(|s| s.strip_prefix('}'))
                .map(|remaining| (*value, remaining))
        });

        match substitution {
            Some((value, remaining)) => {
                filled.push_str(value);
                rest = remaining;
            }
            None => {
                filled.push('{');
                rest = after_brace;
            }
        }
    }

    filled.push_str(rest);
    filled
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
