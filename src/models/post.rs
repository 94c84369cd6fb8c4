use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::Validate;

use super::UserSummary;

pub const MAX_IMAGES_PER_POST: usize = 3;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Embedded comment. Stored inside the post row, never addressed on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "images")]
    pub image_urls: Vec<String>,
    #[serde(rename = "author")]
    pub author_id: Uuid,
    #[serde(rename = "views")]
    pub view_count: i64,
    #[serde(rename = "likes")]
    pub like_count: i64,
    pub comments: Json<Vec<Comment>>,
    pub created_at: DateTime<Utc>,
}

/// Post as listed in the feed, with the author reference resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "images")]
    pub image_urls: Vec<String>,
    pub author: Option<UserSummary>,
    #[serde(rename = "views")]
    pub view_count: i64,
    #[serde(rename = "likes")]
    pub like_count: i64,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(post: Post, author: Option<UserSummary>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            category: post.category,
            image_urls: post.image_urls,
            author,
            view_count: post.view_count,
            like_count: post.like_count,
            comments: post.comments.0,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewPost {
    pub author_id: Uuid,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[validate(length(min = 1, message = "type is required"))]
    pub category: String,
    #[validate(length(max = 3, message = "at most 3 images per post"))]
    pub image_urls: Vec<String>,
}

/// Feed query after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub category: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Normalizes raw query values. Blank categories match everything; page
    /// and page size are floored at 1 so offsets and page counts stay defined.
    pub fn new(category: Option<String>, page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        total / self.page_size + i64::from(total % self.page_size != 0)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub total_pages: i64,
    pub current_page: i64,
}
