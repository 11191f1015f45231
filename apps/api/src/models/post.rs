use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted generation result, as returned by `GET /posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub topic: String,
    pub persona: String,
    pub tone: String,
    pub platform: String,
    pub caption: String,
    pub image_prompt: String,
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller of `PostStore::save`. Id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub topic: String,
    pub persona: String,
    pub tone: String,
    pub platform: String,
    pub caption: String,
    pub image_prompt: String,
    pub hashtags: Vec<String>,
}

/// Row shape of the `posts` table. `hashtags` holds a JSON array encoded as text.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub topic: String,
    pub persona: String,
    pub tone: String,
    pub platform: String,
    pub caption: String,
    pub image_prompt: String,
    pub hashtags: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = serde_json::Error;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            hashtags: decode_hashtags(&row.hashtags)?,
            id: row.id,
            topic: row.topic,
            persona: row.persona,
            tone: row.tone,
            platform: row.platform,
            caption: row.caption,
            image_prompt: row.image_prompt,
            created_at: row.created_at,
        })
    }
}

pub fn encode_hashtags(hashtags: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(hashtags)
}

pub fn decode_hashtags(stored: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(stored)
}
