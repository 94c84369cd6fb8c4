use axum::{
    extract::{Multipart, Query, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{require_auth, CurrentUser};
use crate::models::{NewPost, PageRequest, Post, PostPage};
use crate::services::UploadedFile;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    // Only the POST handler is gated; other methods still get 405.
    let create = create_post.layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().route("/posts", get(list_posts).post(create))
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub message: String,
    pub post: Post,
}

async fn list_posts(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListPostsQuery>, AppError>,
) -> Result<Json<PostPage>> {
    let request = PageRequest::new(query.category, query.page, query.limit);
    let page = state.posts.list(request).await?;
    Ok(Json(page))
}

/// Fields collected from the multipart body before anything is persisted.
#[derive(Default)]
struct PostForm {
    title: String,
    content: String,
    category: String,
    images: Vec<UploadedFile>,
}

async fn read_form(mut multipart: Multipart, max_images: usize) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        AppError::BadRequest("malformed multipart body".to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" | "content" | "type" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest(format!("invalid {} field", name)))?;
                match name.as_str() {
                    "title" => form.title = text,
                    "content" => form.content = text,
                    _ => form.category = text,
                }
            }
            "images" => {
                if form.images.len() == max_images {
                    return Err(AppError::BadRequest(format!(
                        "at most {} images per post",
                        max_images
                    )));
                }
                let file_name = field.file_name().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("invalid image upload".to_string()))?;
                form.images.push(UploadedFile { file_name, data });
            }
            _ => {
                // Skip unknown fields
            }
        }
    }

    Ok(form)
}

async fn create_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<CreatePostResponse>)> {
    let form = read_form(multipart, state.attachments.max_files()).await?;

    let mut new_post = NewPost {
        author_id: current_user.id,
        title: form.title,
        content: form.content,
        category: form.category,
        image_urls: Vec::new(),
    };
    // Reject bad text fields before any image touches the disk.
    new_post.validate()?;

    let image_urls = state.attachments.store(form.images).await?;
    new_post.image_urls = image_urls.clone();
    let post = match state.posts.create(new_post).await {
        Ok(post) => post,
        Err(e) => {
            state.attachments.discard(&image_urls).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post published".to_string(),
            post,
        }),
    ))
}
