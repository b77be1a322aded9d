//! The case store.
//!
//! The whole collection is one JSON array document. A [`CaseStore`] resolves that document once
//! and then reads or overwrites it in full; there are no partial updates and no concurrency
//! check, so the last writer wins.
//!
//! The collection edits ([`upsert`], [`delete_at`], [`delete_by_key`]) are free functions over
//! the in-memory working copy so they can be exercised without any backend.

use crate::constants::EMPTY_DOCUMENT;
use crate::{CaseError, CaseResult, CoreConfig};
use case_files::{BlobBackend, DocumentHandle, DocumentMetadata, FilesError};
use case_types::CaseRecord;
use std::sync::Arc;

/// A session over the configured case document.
#[derive(Debug, Clone)]
pub struct CaseStore {
    backend: Arc<dyn BlobBackend>,
    handle: DocumentHandle,
}

impl CaseStore {
    /// Resolves the configured document, creating it (holding an empty array) if it does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::BackendUnavailable` if the backend cannot be queried or the document
    /// cannot be created.
    pub fn open(backend: Arc<dyn BlobBackend>, cfg: &CoreConfig) -> CaseResult<Self> {
        let existing = backend
            .find_document_by_name_or_id(cfg.document().as_str())
            .map_err(CaseError::BackendUnavailable)?;

        let handle = match existing {
            Some(handle) => handle,
            None => {
                let handle = backend
                    .create_document(cfg.document(), cfg.parent())
                    .map_err(CaseError::BackendUnavailable)?;
                backend
                    .write_text(&handle, EMPTY_DOCUMENT)
                    .map_err(CaseError::BackendUnavailable)?;
                handle
            }
        };

        tracing::debug!("case document resolved: {} ({})", handle.name, handle.id);
        Ok(Self { backend, handle })
    }

    pub fn handle(&self) -> &DocumentHandle {
        &self.handle
    }

    /// Loads the full collection, strictly.
    ///
    /// A missing or blank document is an empty collection. Content that is not a JSON array of
    /// string-valued objects is `MalformedDocument`.
    pub fn try_load(&self) -> CaseResult<Vec<CaseRecord>> {
        let text = match self.backend.read_text(&self.handle) {
            Ok(text) => text,
            Err(FilesError::DocumentNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(CaseError::BackendUnavailable(e)),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text).map_err(CaseError::MalformedDocument)
    }

    /// Loads the full collection, replacing malformed content with an empty collection.
    ///
    /// Only `BackendUnavailable` reaches the caller.
    pub fn load(&self) -> CaseResult<Vec<CaseRecord>> {
        match self.try_load() {
            Err(CaseError::MalformedDocument(e)) => {
                tracing::warn!(
                    "case document {} is malformed, continuing with an empty collection: {}",
                    self.handle.id,
                    e
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Overwrites the document with the given collection.
    pub fn save(&self, cases: &[CaseRecord]) -> CaseResult<DocumentMetadata> {
        let text = to_document_text(cases)?;
        let metadata = self
            .backend
            .write_text(&self.handle, &text)
            .map_err(CaseError::BackendUnavailable)?;
        tracing::debug!(
            "saved {} cases to {} ({} bytes)",
            cases.len(),
            self.handle.id,
            metadata.size_bytes
        );
        Ok(metadata)
    }
}

/// Encodes the collection as the persisted document text.
///
/// Pretty-printed UTF-8; non-ASCII text is written as-is.
pub fn to_document_text(cases: &[CaseRecord]) -> CaseResult<String> {
    serde_json::to_string_pretty(cases).map_err(CaseError::Serialization)
}

fn key_of<'a>(record: &'a CaseRecord, key_field: &str) -> Option<&'a str> {
    record
        .text(key_field)
        .filter(|key| !key.trim().is_empty())
}

/// Inserts `record`, or replaces the record carrying the same key.
///
/// A record whose key field is missing or blank is always appended. A replaced record keeps
/// its position.
pub fn upsert(
    mut collection: Vec<CaseRecord>,
    record: CaseRecord,
    key_field: &str,
) -> Vec<CaseRecord> {
    let position = key_of(&record, key_field).and_then(|key| {
        collection
            .iter()
            .position(|existing| existing.text(key_field) == Some(key))
    });

    match position {
        Some(index) => collection[index] = record,
        None => collection.push(record),
    }
    collection
}

/// Removes and returns the record at `index`.
///
/// # Errors
///
/// `CaseError::OutOfRange` if `index` is past the end; the collection is left untouched.
pub fn delete_at(collection: &mut Vec<CaseRecord>, index: usize) -> CaseResult<CaseRecord> {
    if index >= collection.len() {
        return Err(CaseError::OutOfRange {
            index,
            len: collection.len(),
        });
    }
    Ok(collection.remove(index))
}

/// Removes and returns the record whose `key_field` equals `key`.
///
/// # Errors
///
/// `CaseError::NotFound` if no record carries that key.
pub fn delete_by_key(
    collection: &mut Vec<CaseRecord>,
    key_field: &str,
    key: &str,
) -> CaseResult<CaseRecord> {
    let index = collection
        .iter()
        .position(|existing| existing.text(key_field) == Some(key))
        .ok_or_else(|| CaseError::NotFound {
            field: key_field.to_string(),
            key: key.to_string(),
        })?;
    Ok(collection.remove(index))
}
