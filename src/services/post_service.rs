// Post service - post creation and the paginated feed
use std::sync::Arc;

use validator::Validate;

use crate::db::PostStore;
use crate::error::Result;
use crate::models::{NewPost, PageRequest, Post, PostPage};

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    /// The author id comes from a verified session and is not looked up again.
    pub async fn create(&self, new_post: NewPost) -> Result<Post> {
        new_post.validate()?;

        let post = self.posts.insert(new_post).await?;
        tracing::info!(
            post_id = %post.id,
            author_id = %post.author_id,
            images = post.image_urls.len(),
            "Post created"
        );
        Ok(post)
    }

    pub async fn list(&self, request: PageRequest) -> Result<PostPage> {
        let (posts, total) = self.posts.list(&request).await?;

        Ok(PostPage {
            posts,
            total_pages: request.total_pages(total),
            current_page: request.page,
        })
    }
}
