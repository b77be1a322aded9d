use case_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(#[source] FilesError),
    #[error("stored case document is malformed: {0}")]
    MalformedDocument(#[source] serde_json::Error),
    #[error("failed to serialize cases: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("no case with {field} = {key:?}")]
    NotFound { field: String, key: String },
    #[error("case index {index} is out of range (collection has {len} cases)")]
    OutOfRange { index: usize, len: usize },
}

pub type CaseResult<T> = std::result::Result<T, CaseError>;
