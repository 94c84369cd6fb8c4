mod memory;
mod post_repo;
mod user_repo;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{NewPost, NewUser, PageRequest, Post, PostView, User};

pub use memory::MemoryStore;
pub use post_repo::PgPostStore;
pub use user_repo::PgUserStore;

/// Persistence for accounts. Implementations must report a duplicate
/// username on insert as `AppError::UsernameTaken`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<User>;
}

/// Persistence for posts and the feed query.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post>;

    /// One page of posts, newest first, with authors resolved, plus the total
    /// number of posts matching the filter.
    async fn list(&self, request: &PageRequest) -> Result<(Vec<PostView>, i64)>;
}

#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig, url: &str) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");

        Ok(Self { pg })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
}

impl Stores {
    pub fn postgres(db: &Database) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(db.pg.clone())),
            posts: Arc::new(PgPostStore::new(db.pg.clone())),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            posts: store,
        }
    }

    /// Postgres when a connection string is configured, in-memory otherwise.
    pub async fn from_config(config: &DatabaseConfig) -> anyhow::Result<Self> {
        match config.url.as_deref() {
            Some(url) => {
                let db = Database::connect(config, url).await?;
                db.run_migrations().await?;
                Ok(Self::postgres(&db))
            }
            None => {
                tracing::warn!("DATABASE__URL not set, using in-memory storage; data will not persist");
                Ok(Self::memory())
            }
        }
    }
}
