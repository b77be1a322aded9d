//! Directory-backed document storage.
//!
//! Each document lives in its own sharded directory under the backend root. The directory
//! holds a small metadata file and the document text. Name lookups walk the shard tree, which
//! is fine for the handful of documents a deployment keeps.

use crate::{
    BlobBackend, DocumentHandle, DocumentId, DocumentMetadata, FilesError, FilesResult,
};
use case_types::NonEmptyText;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const METADATA_FILE_NAME: &str = "document.json";
const CONTENT_FILE_NAME: &str = "content";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StoredDocument {
    name: NonEmptyText,
    #[serde(default)]
    parent: Option<NonEmptyText>,
    created_at: DateTime<Utc>,
}

/// Document storage rooted at a local directory.
#[derive(Debug)]
pub struct LocalDirBackend {
    root: PathBuf,
}

impl LocalDirBackend {
    /// Creates a backend over an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the path does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root: &Path) -> FilesResult<Self> {
        if !root.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }

        if !root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_dir(&self, id: &DocumentId) -> PathBuf {
        id.sharded_dir(&self.root)
    }

    fn read_stored(dir: &Path) -> FilesResult<StoredDocument> {
        let raw = fs::read_to_string(dir.join(METADATA_FILE_NAME))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn handle_for(id: DocumentId, stored: StoredDocument) -> DocumentHandle {
        DocumentHandle {
            id,
            name: stored.name,
            parent: stored.parent,
        }
    }

    /// Lists every document under the root, in no particular order.
    ///
    /// Directories that do not look like documents are skipped.
    fn scan(&self) -> FilesResult<Vec<(DocumentHandle, DateTime<Utc>)>> {
        let mut found = Vec::new();

        for s1 in fs::read_dir(&self.root)?.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    let id = match id_path
                        .file_name()
                        .and_then(|os| os.to_str())
                        .map(DocumentId::parse)
                    {
                        Some(Ok(id)) => id,
                        _ => continue,
                    };

                    match Self::read_stored(&id_path) {
                        Ok(stored) => {
                            let created_at = stored.created_at;
                            found.push((Self::handle_for(id, stored), created_at));
                        }
                        Err(e) => {
                            tracing::warn!(
                                "skipping unreadable document metadata {}: {}",
                                id_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        Ok(found)
    }

    fn allocate_dir(&self) -> FilesResult<(DocumentId, PathBuf)> {
        for _attempt in 0..5 {
            let id = DocumentId::new();
            let candidate = self.document_dir(&id);

            if candidate.exists() {
                continue;
            }

            if let Some(parent) = candidate.parent() {
                fs::create_dir_all(parent)?;
            }

            match fs::create_dir(&candidate) {
                Ok(()) => return Ok((id, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(FilesError::Io(e)),
            }
        }

        Err(FilesError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to allocate a unique document directory after 5 attempts",
        )))
    }
}

impl BlobBackend for LocalDirBackend {
    fn find_document_by_name_or_id(&self, identifier: &str) -> FilesResult<Option<DocumentHandle>> {
        if let Ok(id) = DocumentId::parse(identifier) {
            let dir = self.document_dir(&id);
            if dir.is_dir() {
                let stored = Self::read_stored(&dir)?;
                return Ok(Some(Self::handle_for(id, stored)));
            }
        }

        let mut matches: Vec<_> = self
            .scan()?
            .into_iter()
            .filter(|(handle, _)| handle.name.as_str() == identifier)
            .collect();
        matches.sort_by(|(a, a_created), (b, b_created)| {
            a_created.cmp(b_created).then_with(|| a.id.cmp(&b.id))
        });

        Ok(matches.into_iter().next().map(|(handle, _)| handle))
    }

    fn read_text(&self, handle: &DocumentHandle) -> FilesResult<String> {
        let path = self.document_dir(&handle.id).join(CONTENT_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::DocumentNotFound(handle.id.to_string()))
            }
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read document from {}: {}", path.display(), e),
            ))),
        }
    }

    fn create_document(
        &self,
        name: &NonEmptyText,
        parent: Option<&NonEmptyText>,
    ) -> FilesResult<DocumentHandle> {
        if name.as_str().contains(['/', '\\']) || name.as_str() == ".." {
            return Err(FilesError::InvalidPath(format!(
                "document name must not contain path separators: {name}"
            )));
        }

        let (id, dir) = self.allocate_dir()?;
        let stored = StoredDocument {
            name: name.clone(),
            parent: parent.cloned(),
            created_at: Utc::now(),
        };
        fs::write(
            dir.join(METADATA_FILE_NAME),
            serde_json::to_string_pretty(&stored)?,
        )?;
        fs::write(dir.join(CONTENT_FILE_NAME), "")?;

        tracing::info!("created document {} ({})", name, id);
        Ok(Self::handle_for(id, stored))
    }

    fn write_text(&self, handle: &DocumentHandle, text: &str) -> FilesResult<DocumentMetadata> {
        let dir = self.document_dir(&handle.id);
        if !dir.is_dir() {
            return Err(FilesError::DocumentNotFound(handle.id.to_string()));
        }

        // Each writer gets its own temp file; the rename makes the last one to finish win.
        let write_err = |e: std::io::Error| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write document in {}: {}", dir.display(), e),
            ))
        };
        let mut temp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        temp.write_all(text.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(dir.join(CONTENT_FILE_NAME))
            .map_err(|e| write_err(e.error))?;

        Ok(DocumentMetadata::for_write(handle, text))
    }
}
