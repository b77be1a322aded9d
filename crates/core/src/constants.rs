//! Defaults shared by the binaries and the core.

/// Default directory for the local document backend.
pub const DEFAULT_CASE_DATA_DIR: &str = "case_data";

/// Default name of the case document.
pub const DEFAULT_DOCUMENT_NAME: &str = "cases.json";

/// Default identifier field used for upserts.
pub const DEFAULT_KEY_FIELD: &str = "case_id";

/// Default primary date field (`YYYY-MM-DD`).
pub const DEFAULT_DATE_FIELD: &str = "date";

/// Default display name field.
pub const DEFAULT_NAME_FIELD: &str = "name";

/// Default test-dates field (list of `YYYY-MM-DD`).
pub const DEFAULT_TEST_DATES_FIELD: &str = "test_dates";

/// Text written into a freshly created case document.
pub const EMPTY_DOCUMENT: &str = "[]";

/// Date format used for every date field.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
