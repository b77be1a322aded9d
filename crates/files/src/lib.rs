//! Case File Storage
//!
//! This crate provides the remote blob collaborator the case store persists through. The store
//! only ever needs four operations, captured by [`BlobBackend`]:
//!
//! - find a document by name or identifier,
//! - read its full text,
//! - create a new, empty document under an optional parent folder,
//! - overwrite its full text.
//!
//! There are no partial writes, no versions and no locks: every write replaces the whole
//! document and the last writer wins.
//!
//! ## Backends
//!
//! - [`LocalDirBackend`] keeps documents under a root directory using sharded identifiers:
//!
//! ```text
//! <root>/
//! └── ab/
//!     └── 3f/
//!         └── ab3f9e…/
//!             ├── document.json   # name, parent, created_at
//!             └── content         # the document text
//! ```
//!
//! - [`MemoryBackend`] keeps documents in process and can be switched offline to exercise
//!   failure paths.
//!
//! ## Example Usage
//!
//! ```no_run
//! use case_files::{BlobBackend, LocalDirBackend};
//! use case_types::NonEmptyText;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = LocalDirBackend::new(Path::new("case_data"))?;
//! let name = NonEmptyText::new("cases.json")?;
//!
//! let handle = match backend.find_document_by_name_or_id(name.as_str())? {
//!     Some(handle) => handle,
//!     None => backend.create_document(&name, None)?,
//! };
//! backend.write_text(&handle, "[]")?;
//! # Ok(())
//! # }
//! ```

mod document_id;
mod local;
mod memory;

pub use document_id::DocumentId;
pub use local::LocalDirBackend;
pub use memory::MemoryBackend;

use case_types::NonEmptyText;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Errors that can occur during document storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Identifier is not a canonical document id
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    /// The referenced document does not exist (or has no content yet)
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The backend could not be reached
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// Document metadata could not be encoded or decoded
    #[error("Document metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = Result<T, FilesError>;

/// A resolved reference to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentHandle {
    pub id: DocumentId,
    pub name: NonEmptyText,
    pub parent: Option<NonEmptyText>,
}

/// What a backend reports back after a full-document write.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub name: NonEmptyText,
    /// Hexadecimal SHA-256 digest of the written text
    pub sha256: String,
    pub size_bytes: u64,
    pub written_at: DateTime<Utc>,
}

impl DocumentMetadata {
    pub(crate) fn for_write(handle: &DocumentHandle, text: &str) -> Self {
        Self {
            id: handle.id.clone(),
            name: handle.name.clone(),
            sha256: sha256_hex(text),
            size_bytes: text.len() as u64,
            written_at: Utc::now(),
        }
    }
}

/// Storage operations the case store needs from a remote blob service.
///
/// Authentication and connection setup happen when the backend value is constructed; the
/// caller owns the value and passes it to whoever needs it.
pub trait BlobBackend: Send + Sync + std::fmt::Debug {
    /// Looks a document up by canonical id first, then by exact name.
    ///
    /// Returns `Ok(None)` when nothing matches.
    fn find_document_by_name_or_id(&self, identifier: &str) -> FilesResult<Option<DocumentHandle>>;

    /// Reads the full document text.
    fn read_text(&self, handle: &DocumentHandle) -> FilesResult<String>;

    /// Creates a new, empty document.
    fn create_document(
        &self,
        name: &NonEmptyText,
        parent: Option<&NonEmptyText>,
    ) -> FilesResult<DocumentHandle>;

    /// Replaces the full document text.
    fn write_text(&self, handle: &DocumentHandle, text: &str) -> FilesResult<DocumentMetadata>;
}

pub(crate) fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(sha256_hex("[]").len(), 64);
    }

    #[test]
    fn test_metadata_for_write_counts_bytes_not_chars() {
        let handle = DocumentHandle {
            id: DocumentId::new(),
            name: NonEmptyText::new("cases.json").unwrap(),
            parent: None,
        };
        let metadata = DocumentMetadata::for_write(&handle, "案號");

        assert_eq!(metadata.size_bytes, 6);
        assert_eq!(metadata.id, handle.id);
        assert_eq!(metadata.sha256, sha256_hex("案號"));
    }
}
