//! The case record model.
//!
//! A case record is an ordered mapping from field name to value. Values are either free text or
//! an ordered list of strings (the test-dates field). Field order is significant: it is the
//! order the user entered the fields in and the order they are displayed and persisted in, so
//! the record keeps its own ordered storage and hand-writes its serde impls instead of relying
//! on a hash map.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field value.
///
/// Persisted as either a JSON string or a JSON array of strings. Any other JSON shape is
/// rejected during deserialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text content if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::List(_) => None,
        }
    }

    /// Iterates the value as a sequence of strings.
    ///
    /// A text value yields itself once, so a single date typed into a list field is still seen.
    pub fn items(&self) -> impl Iterator<Item = &str> + '_ {
        let slice: &[String] = match self {
            FieldValue::Text(text) => std::slice::from_ref(text),
            FieldValue::List(items) => items,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// One user-entered case: an ordered field map.
///
/// Field names are unique within a record. Inserting an existing name replaces the value in
/// place and keeps the field's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseRecord {
    fields: Vec<(String, FieldValue)>,
}

impl CaseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a field, returning the previous value if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|(existing, _)| existing == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Returns the field as text, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Returns the field as a sequence of strings; empty when the field is absent.
    pub fn items<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.get(name).into_iter().flat_map(FieldValue::items)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CaseRecord
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = CaseRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for CaseRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CaseRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = CaseRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to strings or string arrays")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut record = CaseRecord::new();
                while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
                    record.insert(name, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = CaseRecord::new()
            .with("case_id", "A1")
            .with("date", "2025-09-03")
            .with("name", "first");

        let previous = record.insert("date", "2025-09-20");

        assert_eq!(previous, Some(FieldValue::from("2025-09-03")));
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["case_id", "date", "name"]);
        assert_eq!(record.text("date"), Some("2025-09-20"));
    }

    #[test]
    fn test_items_reads_text_and_lists() {
        let record = CaseRecord::new()
            .with("single", "2025-09-10")
            .with("many", vec!["2025-09-10".to_string(), "2025-10-01".to_string()]);

        assert_eq!(record.items("single").collect::<Vec<_>>(), vec!["2025-09-10"]);
        assert_eq!(record.items("many").count(), 2);
        assert_eq!(record.items("missing").count(), 0);
        assert_eq!(record.text("many"), None);
    }

    #[test]
    fn test_serialize_preserves_field_order() {
        let record = CaseRecord::new()
            .with("zeta", "1")
            .with("alpha", "2")
            .with("test_dates", Vec::<String>::new());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":"1","alpha":"2","test_dates":[]}"#);
    }

    #[test]
    fn test_deserialize_keeps_document_order_and_non_ascii() {
        let json = r#"{"案號":"A1","日期":"2025-09-03","測試日期":["2025-09-10"]}"#;
        let record: CaseRecord = serde_json::from_str(json).unwrap();

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["案號", "日期", "測試日期"]);
        assert_eq!(record.text("案號"), Some("A1"));
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }

    #[test]
    fn test_deserialize_rejects_non_string_values() {
        assert!(serde_json::from_str::<CaseRecord>(r#"{"count":3}"#).is_err());
        assert!(serde_json::from_str::<CaseRecord>(r#"{"dates":[1,2]}"#).is_err());
        assert!(serde_json::from_str::<CaseRecord>(r#"["not","a","map"]"#).is_err());
    }

    #[test]
    fn test_remove_field() {
        let mut record: CaseRecord = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(record.remove("a"), Some(FieldValue::from("1")));
        assert_eq!(record.remove("a"), None);
        assert_eq!(record.len(), 1);
    }
}
