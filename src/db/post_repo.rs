use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::PostStore;
use crate::error::Result;
use crate::models::{NewPost, PageRequest, Post, PostView, UserSummary};

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Feed row: the post joined with whatever is left of its author.
#[derive(Debug, FromRow)]
struct PostWithAuthorRow {
    #[sqlx(flatten)]
    post: Post,
    author_username: Option<String>,
    author_avatar: Option<String>,
}

impl From<PostWithAuthorRow> for PostView {
    fn from(row: PostWithAuthorRow) -> Self {
        let author = row.author_username.map(|username| UserSummary {
            id: row.post.author_id,
            username,
            avatar: row.author_avatar.unwrap_or_default(),
        });
        PostView::new(row.post, author)
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, content, category, image_urls, author_id, comments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, content, category, image_urls, author_id,
                      view_count, like_count, comments, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(&post.image_urls)
        .bind(post.author_id)
        .bind(Json(Vec::<crate::models::Comment>::new()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list(&self, request: &PageRequest) -> Result<(Vec<PostView>, i64)> {
        let rows = sqlx::query_as::<_, PostWithAuthorRow>(
            r#"
            SELECT
                p.id, p.title, p.content, p.category, p.image_urls, p.author_id,
                p.view_count, p.like_count, p.comments, p.created_at,
                u.username AS author_username,
                u.avatar AS author_avatar
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE ($1::text IS NULL OR p.category = $1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(request.category.as_deref())
        .bind(request.page_size)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE ($1::text IS NULL OR category = $1)",
        )
        .bind(request.category.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(PostView::from).collect(), total))
    }
}
