use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::post::{NewPost, Post};
use crate::posts::store::{PostStore, StoreError};

/// In-process store for running without a database. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn save(&self, post: NewPost) -> Result<Post, StoreError> {
        let saved = Post {
            id: Uuid::new_v4(),
            topic: post.topic,
            persona: post.persona,
            tone: post.tone,
            platform: post.platform,
            caption: post.caption,
            image_prompt: post.image_prompt,
            hashtags: post.hashtags,
            created_at: Utc::now(),
        };
        self.posts.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        // Newest insert first on timestamp ties; the sort is stable.
        let mut posts: Vec<Post> = self.posts.read().await.iter().rev().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
}
