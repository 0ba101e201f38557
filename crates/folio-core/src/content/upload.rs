//! Upload validation for resource files and images.

use crate::error::{FolioError, Result};
use std::path::Path;

const MIB: u64 = 1024 * 1024;

/// Size and extension rules for one kind of upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    /// Lowercase extensions without the dot
    pub allowed_extensions: Vec<String>,
}

/// An upload that passed [`UploadPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub extension: String,
    pub content_type: String,
    pub size: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64, allowed_extensions: &[&str]) -> Self {
        Self {
            max_bytes,
            allowed_extensions: allowed_extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Documents offered for download.
    pub fn documents() -> Self {
        Self::new(
            50 * MIB,
            &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "txt", "csv", "md",
            ],
        )
    }

    /// Cover and inline images.
    pub fn images() -> Self {
        Self::new(5 * MIB, &["png", "jpg", "jpeg", "gif", "webp", "svg"])
    }

    /// Checks name and size, and infers the content type.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<ValidatedUpload> {
        if size == 0 {
            return Err(FolioError::validation(format!("{} is empty", file_name)));
        }
        if size > self.max_bytes {
            return Err(FolioError::validation(format!(
                "{} is {} bytes, limit is {} bytes",
                file_name, size, self.max_bytes
            )));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .ok_or_else(|| {
                FolioError::validation(format!("{} has no file extension", file_name))
            })?;

        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(FolioError::validation(format!(
                ".{} files are not allowed (allowed: {})",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        let content_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(ValidatedUpload {
            file_name: file_name.to_string(),
            extension,
            content_type,
            size,
        })
    }
}
