//! Community board backend.
//!
//! Accounts with password login, bearer session tokens, and a paginated post
//! feed whose posts carry up to three uploaded images.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::Stores;
use crate::services::{AttachmentStore, AuthService, PostService, SessionKeys};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub sessions: SessionKeys,
    pub posts: PostService,
    pub attachments: AttachmentStore,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        Self {
            auth: AuthService::new(stores.users),
            sessions: SessionKeys::new(&config.jwt.secret),
            posts: PostService::new(stores.posts),
            attachments: AttachmentStore::from_config(&config),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.attachments.dir());
    let url_prefix = format!("/{}", state.config.uploads.url_prefix.trim_matches('/'));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::routes(state.clone()))
        .nest_service(&url_prefix, uploads)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_request_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
