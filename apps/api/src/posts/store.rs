//! Post persistence. `AppState` holds an `Arc<dyn PostStore>`, chosen at startup.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::post::{encode_hashtags, NewPost, Post, PostRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("hashtags could not be encoded or decoded: {0}")]
    Hashtags(#[from] serde_json::Error),
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Writes one post atomically and returns it with its id and timestamp.
    async fn save(&self, post: NewPost) -> Result<Post, StoreError>;

    /// All posts, most recent first.
    async fn list(&self) -> Result<Vec<Post>, StoreError>;
}

/// PostgreSQL-backed store. One transaction per save.
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn save(&self, post: NewPost) -> Result<Post, StoreError> {
        let hashtags = encode_hashtags(&post.hashtags)?;
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, topic, persona, tone, platform, caption, image_prompt, hashtags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, topic, persona, tone, platform, caption, image_prompt, hashtags, created_at
            "#,
        )
        .bind(id)
        .bind(&post.topic)
        .bind(&post.persona)
        .bind(&post.tone)
        .bind(&post.platform)
        .bind(&post.caption)
        .bind(&post.image_prompt)
        .bind(&hashtags)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                warn!("Insert of post {id} failed, rolling back: {e}");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback of post {id} failed: {rollback_err}");
                }
                return Err(StoreError::Database(e));
            }
        };

        tx.commit().await?;
        info!("Saved post {id}");

        Ok(Post::try_from(row)?)
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, topic, persona, tone, platform, caption, image_prompt, hashtags, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Post::try_from(row).map_err(StoreError::from))
            .collect()
    }
}
