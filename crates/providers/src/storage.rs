//! Object storage for uploaded documents.
//!
//! The portal only persists the URL a store returns. The bundled
//! implementation writes to a local directory that the API serves under a
//! public base URL.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ProviderError;

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Object storage seam.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `file` under `folder` and return its public URL.
    async fn store(&self, folder: &str, file: UploadedFile) -> Result<String, ProviderError>;
}

/// Filesystem-backed store.
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Keep ASCII letters, digits, dots, dashes and underscores; everything else
/// becomes `_`. Leading dots are stripped so names cannot be hidden files or
/// traverse upwards.
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn store(&self, folder: &str, file: UploadedFile) -> Result<String, ProviderError> {
        let folder: Vec<String> = folder
            .split('/')
            .filter(|s| !s.is_empty())
            .map(sanitize_segment)
            .collect();
        let name = format!("{}-{}", uuid::Uuid::new_v4(), sanitize_segment(&file.file_name));

        let mut dir = self.root.clone();
        dir.extend(&folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &file.bytes).await?;

        let mut key = folder;
        key.push(name);
        let url = format!("{}/{}", self.public_base_url, key.join("/"));
        tracing::debug!(%url, size = file.bytes.len(), "Stored upload");
        Ok(url)
    }
}
