//! Upload directory handling

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ServiceError;

const OUTPUT_PREFIX: &str = "private_";
const FALLBACK_NAME: &str = "upload.csv";

/// Reduces a client-supplied filename to a safe ASCII base name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// Files belonging to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub key: Uuid,
    pub file_name: String,
    pub path: PathBuf,
}

impl StoredUpload {
    /// Name offered to the client for the anonymized file.
    pub fn attachment_name(&self) -> String {
        format!("{}{}", OUTPUT_PREFIX, self.file_name)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes the upload under a fresh per-request key so requests sharing a
    /// filename never overwrite each other.
    pub async fn save(&self, original_name: &str, contents: &[u8]) -> Result<StoredUpload, ServiceError> {
        let key = Uuid::new_v4();
        let file_name = sanitize_filename(original_name);
        let path = self.dir.join(format!("{}_{}", key, file_name));
        tokio::fs::write(&path, contents).await?;

        Ok(StoredUpload {
            key,
            file_name,
            path,
        })
    }

    pub fn output_path(&self, upload: &StoredUpload) -> PathBuf {
        self.dir
            .join(format!("{}{}_{}", OUTPUT_PREFIX, upload.key, upload.file_name))
    }
}
