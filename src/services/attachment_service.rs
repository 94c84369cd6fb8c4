// Attachment handler - writes post images to the upload directory
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::MAX_IMAGES_PER_POST;

const MAX_EXTENSION_LEN: usize = 10;

/// One file part taken from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
    base_url: String,
    max_files: usize,
}

impl AttachmentStore {
    /// `max_files` can lower the per-post image limit but never raise it.
    pub fn new(dir: impl Into<PathBuf>, public_url: &str, url_prefix: &str, max_files: usize) -> Self {
        if max_files > MAX_IMAGES_PER_POST {
            tracing::warn!(
                configured = max_files,
                limit = MAX_IMAGES_PER_POST,
                "uploads.max_files above the per-post limit, clamping"
            );
        }
        let prefix = url_prefix.trim_matches('/');
        Self {
            dir: dir.into(),
            base_url: format!("{}/{}", public_url.trim_end_matches('/'), prefix),
            max_files: max_files.min(MAX_IMAGES_PER_POST),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.uploads.dir,
            &config.server.public_url,
            &config.uploads.url_prefix,
            config.uploads.max_files,
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Persists every file and returns their public URLs in input order.
    /// Either all files are stored or none are left behind.
    pub async fn store(&self, files: Vec<UploadedFile>) -> Result<Vec<String>> {
        if files.len() > self.max_files {
            return Err(AppError::BadRequest(format!(
                "at most {} images per post",
                self.max_files
            )));
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
        let mut urls = Vec::with_capacity(files.len());

        for file in files {
            let name = stored_file_name(file.file_name.as_deref());
            let path = self.dir.join(&name);

            if let Err(e) = tokio::fs::write(&path, &file.data).await {
                for path in &written {
                    let _ = tokio::fs::remove_file(path).await;
                }
                return Err(e.into());
            }

            tracing::debug!(file = %name, bytes = file.data.len(), "Stored attachment");
            written.push(path);
            urls.push(format!("{}/{}", self.base_url, name));
        }

        Ok(urls)
    }

    /// Best-effort removal of files returned by `store`, for requests that
    /// failed after their images were written.
    pub async fn discard(&self, urls: &[String]) {
        for url in urls {
            let Some(name) = url.strip_prefix(&self.base_url).map(|n| n.trim_start_matches('/')) else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
                tracing::warn!(file = %name, "Failed to discard attachment: {}", e);
            }
        }
    }
}

/// Random name keeping the client's extension when it is plain ASCII.
fn stored_file_name(original: Option<&str>) -> String {
    let id = Uuid::new_v4().simple();
    let extension = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}
