use serde::Deserialize;

pub const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin prepended to attachment URLs handed back to clients.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Unset means in-memory storage.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_url_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_files() -> usize {
    crate::models::MAX_IMAGES_PER_POST
}

fn default_max_request_bytes() -> usize {
    20 * 1024 * 1024
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.public_url", default_public_url())?
            .set_default("database.max_connections", default_max_connections() as i64)?
            .set_default("jwt.secret", DEV_JWT_SECRET)?
            .set_default("uploads.dir", default_upload_dir())?
            .set_default("uploads.url_prefix", default_url_prefix())?
            .set_default("uploads.max_files", default_max_files() as i64)?
            .set_default("uploads.max_request_bytes", default_max_request_bytes() as i64)?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
