use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::post::Post;
use crate::state::AppState;

/// GET /posts
///
/// Every saved post, most recent first.
pub async fn handle_list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state.store.list().await?;
    Ok(Json(posts))
}
