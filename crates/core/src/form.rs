//! Case entry form.
//!
//! The form collects the fixed fields plus two free-text areas: extra fields as `key=value`
//! lines and test dates as a comma-separated list. [`CaseForm::into_record`] turns a submission
//! into a record laid out in the configured schema.

use crate::constants::ISO_DATE_FORMAT;
use crate::CaseSchema;
use case_types::CaseRecord;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseForm {
    pub key: String,
    pub date: NaiveDate,
    pub name: String,
    /// One `key=value` pair per line.
    pub extra_fields: String,
    /// Comma-separated dates.
    pub test_dates: String,
}

impl CaseForm {
    /// Builds the record: key, date, name, then extra fields, then test dates.
    ///
    /// An extra field that reuses a reserved name overwrites that field in place. The
    /// test-dates field is always present, empty when nothing was entered.
    pub fn into_record(self, schema: &CaseSchema) -> CaseRecord {
        let mut record = CaseRecord::new()
            .with(schema.key_field(), self.key.trim())
            .with(
                schema.date_field(),
                self.date.format(ISO_DATE_FORMAT).to_string(),
            )
            .with(schema.name_field(), self.name.trim());

        for (name, value) in parse_extra_fields(&self.extra_fields) {
            if name == schema.test_dates_field() {
                continue;
            }
            record.insert(name, value);
        }

        record.insert(schema.test_dates_field(), parse_test_dates(&self.test_dates));
        record
    }
}

/// Parses `key=value` lines.
///
/// Splits at the first `=` and trims both sides. Lines without `=` or with an empty key are
/// skipped. Later duplicates win when inserted into a record.
pub fn parse_extra_fields(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
///
/// Entries are kept as typed; date validation happens where dates are read.
pub fn parse_test_dates(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_types::FieldValue;

    fn form() -> CaseForm {
        CaseForm {
            key: " A1 ".into(),
            date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
            name: "Calibration".into(),
            extra_fields: String::new(),
            test_dates: String::new(),
        }
    }

    #[test]
    fn test_into_record_orders_fixed_fields() {
        let record = form().into_record(&CaseSchema::default());

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["case_id", "date", "name", "test_dates"]);
        assert_eq!(record.text("case_id"), Some("A1"));
        assert_eq!(record.text("date"), Some("2025-09-03"));
        assert_eq!(record.get("test_dates"), Some(&FieldValue::List(vec![])));
    }

    #[test]
    fn test_into_record_with_extra_fields_and_test_dates() {
        let mut input = form();
        input.extra_fields = "owner = Lin\nno separator here\n = orphan\nurl=https://x?a=b\n".into();
        input.test_dates = "2025-09-10, 2025-10-01,,".into();

        let record = input.into_record(&CaseSchema::default());

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["case_id", "date", "name", "owner", "url", "test_dates"]
        );
        assert_eq!(record.text("owner"), Some("Lin"));
        assert_eq!(record.text("url"), Some("https://x?a=b"));
        assert_eq!(
            record.items("test_dates").collect::<Vec<_>>(),
            vec!["2025-09-10", "2025-10-01"]
        );
    }

    #[test]
    fn test_extra_field_overrides_reserved_name_in_place() {
        let mut input = form();
        input.extra_fields = "name=Renamed\ntest_dates=ignored".into();
        input.test_dates = "2025-09-10".into();

        let record = input.into_record(&CaseSchema::default());

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["case_id", "date", "name", "test_dates"]);
        assert_eq!(record.text("name"), Some("Renamed"));
        assert_eq!(record.items("test_dates").collect::<Vec<_>>(), vec!["2025-09-10"]);
    }

    #[test]
    fn test_into_record_uses_schema_names() {
        let schema = CaseSchema::new("案號", "日期 (YYYY-MM-DD)", "案件名稱", "測試日期").unwrap();
        let record = form().into_record(&schema);

        assert_eq!(record.text("案號"), Some("A1"));
        assert_eq!(record.text("日期 (YYYY-MM-DD)"), Some("2025-09-03"));
        assert_eq!(record.text("案件名稱"), Some("Calibration"));
        assert!(record.get("測試日期").is_some());
    }

    #[test]
    fn test_parse_extra_fields_later_wins_on_insert() {
        let pairs = parse_extra_fields("a=1\na=2");
        let record: CaseRecord = pairs.into_iter().collect();
        assert_eq!(record.text("a"), Some("2"));
    }

    #[test]
    fn test_parse_test_dates_blank() {
        assert!(parse_test_dates("").is_empty());
        assert!(parse_test_dates(" , ").is_empty());
    }
}
