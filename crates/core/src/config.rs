//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Nothing in the core reads environment variables while handling a request;
//! binaries hand [`CoreConfig::from_lookup`] a closure over their environment instead.

use crate::constants::{
    DEFAULT_CASE_DATA_DIR, DEFAULT_DATE_FIELD, DEFAULT_DOCUMENT_NAME, DEFAULT_KEY_FIELD,
    DEFAULT_NAME_FIELD, DEFAULT_TEST_DATES_FIELD,
};
use crate::{CaseError, CaseResult};
use case_types::NonEmptyText;
use chrono::Weekday;
use std::path::{Path, PathBuf};

/// Environment keys understood by [`CoreConfig::from_lookup`].
pub const ENV_DATA_DIR: &str = "CASES_DATA_DIR";
pub const ENV_DOCUMENT: &str = "CASES_DOCUMENT";
pub const ENV_PARENT: &str = "CASES_PARENT";
pub const ENV_KEY_FIELD: &str = "CASES_KEY_FIELD";
pub const ENV_DATE_FIELD: &str = "CASES_DATE_FIELD";
pub const ENV_NAME_FIELD: &str = "CASES_NAME_FIELD";
pub const ENV_TEST_DATES_FIELD: &str = "CASES_TEST_DATES_FIELD";
pub const ENV_FIRST_WEEKDAY: &str = "CASES_FIRST_WEEKDAY";

/// Names of the conventional fields in a case record.
///
/// Deployments name these fields differently, so none of them is hardcoded in the store or the
/// projector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseSchema {
    key_field: String,
    date_field: String,
    name_field: String,
    test_dates_field: String,
}

impl CaseSchema {
    /// Creates a schema, rejecting empty or repeated field names.
    pub fn new(
        key_field: &str,
        date_field: &str,
        name_field: &str,
        test_dates_field: &str,
    ) -> CaseResult<Self> {
        let field = |label: &str, value: &str| {
            NonEmptyText::new(value)
                .map(NonEmptyText::into_string)
                .map_err(|_| CaseError::InvalidInput(format!("{label} cannot be empty")))
        };
        let schema = Self {
            key_field: field("key field", key_field)?,
            date_field: field("date field", date_field)?,
            name_field: field("name field", name_field)?,
            test_dates_field: field("test dates field", test_dates_field)?,
        };

        let names = schema.field_names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(CaseError::InvalidInput(format!(
                    "field name {name:?} is used for more than one purpose"
                )));
            }
        }

        Ok(schema)
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    pub fn name_field(&self) -> &str {
        &self.name_field
    }

    pub fn test_dates_field(&self) -> &str {
        &self.test_dates_field
    }

    /// Reserved names in form order: key, date, name, test dates.
    pub fn field_names(&self) -> [&str; 4] {
        [
            self.key_field(),
            self.date_field(),
            self.name_field(),
            self.test_dates_field(),
        ]
    }
}

impl Default for CaseSchema {
    fn default() -> Self {
        Self {
            key_field: DEFAULT_KEY_FIELD.to_string(),
            date_field: DEFAULT_DATE_FIELD.to_string(),
            name_field: DEFAULT_NAME_FIELD.to_string(),
            test_dates_field: DEFAULT_TEST_DATES_FIELD.to_string(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    document: NonEmptyText,
    parent: Option<NonEmptyText>,
    schema: CaseSchema,
    first_weekday: Weekday,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `document` is the name or canonical id of the case document. `parent` is only used when
    /// the document has to be created.
    pub fn new(
        data_dir: PathBuf,
        document: &str,
        parent: Option<&str>,
        schema: CaseSchema,
        first_weekday: Weekday,
    ) -> CaseResult<Self> {
        let document = NonEmptyText::new(document)
            .map_err(|_| CaseError::InvalidInput("document name cannot be empty".into()))?;
        let parent = parent.and_then(|p| NonEmptyText::new(p).ok());

        Ok(Self {
            data_dir,
            document,
            parent,
            schema,
            first_weekday,
        })
    }

    /// Resolves configuration from a key lookup, falling back to defaults for absent or blank
    /// values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CaseResult<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = value(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_CASE_DATA_DIR.into());
        let document = value(ENV_DOCUMENT).unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.into());
        let parent = value(ENV_PARENT);
        let schema = CaseSchema::new(
            &value(ENV_KEY_FIELD).unwrap_or_else(|| DEFAULT_KEY_FIELD.into()),
            &value(ENV_DATE_FIELD).unwrap_or_else(|| DEFAULT_DATE_FIELD.into()),
            &value(ENV_NAME_FIELD).unwrap_or_else(|| DEFAULT_NAME_FIELD.into()),
            &value(ENV_TEST_DATES_FIELD).unwrap_or_else(|| DEFAULT_TEST_DATES_FIELD.into()),
        )?;
        let first_weekday = first_weekday_from_env_value(value(ENV_FIRST_WEEKDAY))?;

        Self::new(
            PathBuf::from(data_dir),
            &document,
            parent.as_deref(),
            schema,
            first_weekday,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document(&self) -> &NonEmptyText {
        &self.document
    }

    pub fn parent(&self) -> Option<&NonEmptyText> {
        self.parent.as_ref()
    }

    pub fn schema(&self) -> &CaseSchema {
        &self.schema
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }
}

/// Parse the first calendar weekday from an optional string value.
///
/// Accepts chrono's weekday names (`mon`, `Monday`, `sun`, ...). If `value` is `None` or blank,
/// returns Monday.
pub fn first_weekday_from_env_value(value: Option<String>) -> CaseResult<Weekday> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Weekday::Mon),
        Some(v) => v
            .parse::<Weekday>()
            .map_err(|_| CaseError::InvalidInput(format!("unknown weekday: {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_uses_defaults() {
        let cfg = CoreConfig::from_lookup(|_| None).unwrap();

        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_CASE_DATA_DIR));
        assert_eq!(cfg.document().as_str(), DEFAULT_DOCUMENT_NAME);
        assert!(cfg.parent().is_none());
        assert_eq!(cfg.schema(), &CaseSchema::default());
        assert_eq!(cfg.first_weekday(), Weekday::Mon);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATA_DIR, "/srv/cases"),
            (ENV_DOCUMENT, "lab.json"),
            (ENV_PARENT, "lab-folder"),
            (ENV_KEY_FIELD, "案號"),
            (ENV_DATE_FIELD, "日期 (YYYY-MM-DD)"),
            (ENV_NAME_FIELD, "案件名稱"),
            (ENV_TEST_DATES_FIELD, "測試日期"),
            (ENV_FIRST_WEEKDAY, "sunday"),
            ("UNRELATED", "x"),
        ]);
        let cfg = CoreConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.data_dir(), Path::new("/srv/cases"));
        assert_eq!(cfg.document().as_str(), "lab.json");
        assert_eq!(cfg.parent().map(NonEmptyText::as_str), Some("lab-folder"));
        assert_eq!(cfg.schema().key_field(), "案號");
        assert_eq!(cfg.schema().test_dates_field(), "測試日期");
        assert_eq!(cfg.first_weekday(), Weekday::Sun);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = CoreConfig::from_lookup(|_| Some("   ".into())).unwrap();
        assert_eq!(cfg.document().as_str(), DEFAULT_DOCUMENT_NAME);
        assert_eq!(cfg.first_weekday(), Weekday::Mon);
    }

    #[test]
    fn test_schema_rejects_duplicate_names() {
        let err = CaseSchema::new("id", "date", "id", "tests").unwrap_err();
        assert!(matches!(err, CaseError::InvalidInput(_)));
    }

    #[test]
    fn test_default_schema_passes_validation() {
        let validated = CaseSchema::new(
            DEFAULT_KEY_FIELD,
            DEFAULT_DATE_FIELD,
            DEFAULT_NAME_FIELD,
            DEFAULT_TEST_DATES_FIELD,
        )
        .unwrap();
        assert_eq!(CaseSchema::default(), validated);
        assert_eq!(
            CaseSchema::default().field_names(),
            ["case_id", "date", "name", "test_dates"]
        );
    }

    #[test]
    fn test_schema_rejects_empty_names() {
        let err = CaseSchema::new("id", " ", "name", "tests").unwrap_err();
        assert!(matches!(err, CaseError::InvalidInput(_)));
    }

    #[test]
    fn test_first_weekday_rejects_unknown() {
        let err = first_weekday_from_env_value(Some("funday".into())).unwrap_err();
        assert!(matches!(err, CaseError::InvalidInput(_)));
        assert_eq!(
            first_weekday_from_env_value(Some("Sat".into())).unwrap(),
            Weekday::Sat
        );
    }
}
