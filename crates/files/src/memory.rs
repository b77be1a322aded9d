//! In-process document storage.

use crate::{
    BlobBackend, DocumentHandle, DocumentId, DocumentMetadata, FilesError, FilesResult,
};
use case_types::NonEmptyText;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct MemoryDocument {
    handle: DocumentHandle,
    text: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    // Creation order doubles as the tie-break for duplicate names.
    documents: Vec<MemoryDocument>,
    offline: bool,
}

/// Documents held in memory for the lifetime of the value.
///
/// `set_offline(true)` makes every call fail with [`FilesError::Unavailable`], standing in for
/// a remote service that cannot be reached.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    fn online(&self) -> FilesResult<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| FilesError::Unavailable("memory backend lock poisoned".into()))?;
        if state.offline {
            return Err(FilesError::Unavailable("memory backend is offline".into()));
        }
        Ok(state)
    }
}

impl BlobBackend for MemoryBackend {
    fn find_document_by_name_or_id(&self, identifier: &str) -> FilesResult<Option<DocumentHandle>> {
        let state = self.online()?;
        let by_id = state
            .documents
            .iter()
            .find(|doc| doc.handle.id.to_string() == identifier);
        let found = by_id.or_else(|| {
            state
                .documents
                .iter()
                .find(|doc| doc.handle.name.as_str() == identifier)
        });
        Ok(found.map(|doc| doc.handle.clone()))
    }

    fn read_text(&self, handle: &DocumentHandle) -> FilesResult<String> {
        let state = self.online()?;
        state
            .documents
            .iter()
            .find(|doc| doc.handle.id == handle.id)
            .map(|doc| doc.text.clone())
            .ok_or_else(|| FilesError::DocumentNotFound(handle.id.to_string()))
    }

    fn create_document(
        &self,
        name: &NonEmptyText,
        parent: Option<&NonEmptyText>,
    ) -> FilesResult<DocumentHandle> {
        let mut state = self.online()?;
        let handle = DocumentHandle {
            id: DocumentId::new(),
            name: name.clone(),
            parent: parent.cloned(),
        };
        state.documents.push(MemoryDocument {
            handle: handle.clone(),
            text: String::new(),
        });
        Ok(handle)
    }

    fn write_text(&self, handle: &DocumentHandle, text: &str) -> FilesResult<DocumentMetadata> {
        let mut state = self.online()?;
        let doc = state
            .documents
            .iter_mut()
            .find(|doc| doc.handle.id == handle.id)
            .ok_or_else(|| FilesError::DocumentNotFound(handle.id.to_string()))?;
        doc.text = text.to_owned();
        Ok(DocumentMetadata::for_write(handle, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> NonEmptyText {
        NonEmptyText::new(value).unwrap()
    }

    #[test]
    fn test_round_trip_text() {
        let backend = MemoryBackend::new();
        let handle = backend.create_document(&name("cases.json"), None).unwrap();

        backend.write_text(&handle, "[\"x\"]").unwrap();

        assert_eq!(backend.read_text(&handle).unwrap(), "[\"x\"]");
    }

    #[test]
    fn test_find_prefers_earliest_by_name() {
        let backend = MemoryBackend::new();
        let first = backend.create_document(&name("cases.json"), None).unwrap();
        let _second = backend.create_document(&name("cases.json"), None).unwrap();

        let found = backend
            .find_document_by_name_or_id("cases.json")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn test_offline_fails_every_call() {
        let backend = MemoryBackend::new();
        let handle = backend.create_document(&name("cases.json"), None).unwrap();
        backend.set_offline(true);

        assert!(matches!(
            backend.read_text(&handle),
            Err(FilesError::Unavailable(_))
        ));
        assert!(matches!(
            backend.write_text(&handle, "[]"),
            Err(FilesError::Unavailable(_))
        ));
        assert!(matches!(
            backend.find_document_by_name_or_id("cases.json"),
            Err(FilesError::Unavailable(_))
        ));

        backend.set_offline(false);
        assert!(backend.read_text(&handle).is_ok());
    }

    #[test]
    fn test_unknown_handle_is_not_found() {
        let backend = MemoryBackend::new();
        let handle = DocumentHandle {
            id: DocumentId::new(),
            name: name("cases.json"),
            parent: None,
        };
        assert!(matches!(
            backend.read_text(&handle),
            Err(FilesError::DocumentNotFound(_))
        ));
    }
}
