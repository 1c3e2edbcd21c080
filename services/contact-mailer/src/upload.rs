//! Upload Gate
//!
//! Validates the optional `cv` attachment before it is handed to the
//! dispatcher. The gate is the only place the file size ceiling is enforced.

use contact_relay_utils::{
    file_extension, validate_file_size, validate_file_type, RelayResult, UploadConfig,
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_SIZE,
};

/// Multipart field carrying the attachment.
pub const CV_FIELD: &str = "cv";

/// A file that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// MIME type inferred from the filename extension.
    pub fn content_type(&self) -> &'static str {
        match file_extension(&self.filename) {
            Some(".pdf") => "application/pdf",
            Some(".doc") => "application/msword",
            Some(".docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            _ => "application/octet-stream",
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UploadGate {
    allowed_extensions: Vec<String>,
    max_file_size: usize,
}

impl UploadGate {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.clone(),
            max_file_size: config.max_file_size,
        }
    }

    /// Runs before any of the file body is read.
    pub fn check_extension(&self, filename: &str) -> RelayResult<()> {
        validate_file_type(filename, &self.allowed_extensions)
    }

    /// Called with the running total while the body streams in.
    pub fn check_size(&self, size: usize) -> RelayResult<()> {
        validate_file_size(size as u64, self.max_file_size as u64)
    }

    pub fn accept(&self, filename: impl Into<String>, content: Vec<u8>) -> RelayResult<Attachment> {
        let filename = filename.into();
        self.check_extension(&filename)?;
        self.check_size(content.len())?;

        Ok(Attachment { filename, content })
    }
}

impl Default for UploadGate {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_file_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}
