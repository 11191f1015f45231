pub mod health;

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeFile;

use crate::generation::handlers::handle_generate;
use crate::posts::handlers::handle_list_posts;
use crate::state::AppState;

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        // Frontend entry page
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/health", get(health::health_handler))
        .route("/generate", post(handle_generate))
        .route("/posts", get(handle_list_posts))
        .with_state(state)
}
