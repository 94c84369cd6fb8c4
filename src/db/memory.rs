use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{NewPost, NewUser, PageRequest, Post, PostView, User};

/// Process-local store backing both traits. Used for local runs without a
/// database and as the test fixture.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    // Insertion order; the feed sorts on read.
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AppError::UsernameTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            avatar: String::new(),
            created_at: Utc::now(),
        };
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            category: post.category,
            image_urls: post.image_urls,
            author_id: post.author_id,
            view_count: 0,
            like_count: 0,
            comments: Json(Vec::new()),
            created_at: Utc::now(),
        };
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn list(&self, request: &PageRequest) -> Result<(Vec<PostView>, i64)> {
        let posts = self.posts.read().await;

        // Newest insert first, then a stable sort keeps that order on timestamp ties.
        let mut matching: Vec<&Post> = posts
            .iter()
            .rev()
            .filter(|p| match &request.category {
                Some(category) => &p.category == category,
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.page_size).unwrap_or(usize::MAX);

        let users = self.users.read().await;
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|post| {
                let author = users
                    .values()
                    .find(|u| u.id == post.author_id)
                    .map(User::summary);
                PostView::new(post.clone(), author)
            })
            .collect();

        Ok((page, total))
    }
}
