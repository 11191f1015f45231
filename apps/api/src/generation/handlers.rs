//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::ResponseShape;
use crate::errors::AppError;
use crate::generation::generator::{generate_post, GenerateBody, GeneratedContent};
use crate::models::post::Post;
use crate::state::AppState;

/// Flattened response for `ResponseShape::Content`.
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    #[serde(flatten)]
    pub content: GeneratedContent,
    pub post: Post,
}

/// POST /generate
///
/// Validates the body, runs one generation and saves it. Returns either the
/// upstream envelope or the parsed content, per `GENERATE_RESPONSE`.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;
    let request = body.validate()?;

    let outcome = generate_post(&state.llm, state.store.as_ref(), request).await?;

    Ok(match state.response_shape {
        ResponseShape::Envelope => Json(outcome.envelope).into_response(),
        ResponseShape::Content => Json(ContentResponse {
            content: outcome.content,
            post: outcome.post,
        })
        .into_response(),
    })
}
