//! Record types persisted by the store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `year` attribute. Clients send either a string or an integer and the
/// value is stored back in whichever form it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl From<i64> for Year {
    fn from(v: i64) -> Self {
        Year::Number(v)
    }
}

impl From<&str> for Year {
    fn from(v: &str) -> Self {
        Year::Text(v.to_string())
    }
}

impl From<String> for Year {
    fn from(v: String) -> Self {
        Year::Text(v)
    }
}

/// One stored user.
///
/// `name` is meant as a natural key but nothing enforces uniqueness. Fields
/// this version does not know about are kept in `extra` and written back, so
/// a read-modify-write never drops data another writer put there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub url: String,
    /// Free-form, comma-delimited
    pub languages: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        languages: impl Into<String>,
        year: Option<Year>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            languages: languages.into(),
            year,
            extra: Map::new(),
        }
    }
}

/// The full ordered collection of records held in the backing document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<UserRecord>);

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the end; insertion order is preserved on disk
    pub fn push(&mut self, record: UserRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UserRecord> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<UserRecord> {
        self.0
    }
}

impl From<Vec<UserRecord>> for RecordSet {
    fn from(records: Vec<UserRecord>) -> Self {
        RecordSet(records)
    }
}

impl FromIterator<UserRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = UserRecord>>(iter: I) -> Self {
        RecordSet(iter.into_iter().collect())
    }
}

impl IntoIterator for RecordSet {
    type Item = UserRecord;
    type IntoIter = std::vec::IntoIter<UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a UserRecord;
    type IntoIter = std::slice::Iter<'a, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_year_accepts_string_or_integer() {
        let text: UserRecord = serde_json::from_value(json!({
            "name": "Alice", "url": "u1", "languages": "C,Python", "year": "2020"
        }))
        .unwrap();
        let number: UserRecord = serde_json::from_value(json!({
            "name": "Bob", "url": "u2", "languages": "Rust", "year": 2021
        }))
        .unwrap();

        assert_eq!(text.year, Some(Year::Text("2020".into())));
        assert_eq!(number.year, Some(Year::Number(2021)));
    }

    #[test]
    fn test_year_omitted_when_absent() {
        let record = UserRecord::new("Carol", "u3", "Go", None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"name": "Carol", "url": "u3", "languages": "Go"}));

        // Earlier-revision records have no year at all
        let parsed: UserRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let stored = json!({
            "name": "Dana", "url": "u4", "languages": "OCaml", "year": 1999,
            "homepage": "https://dana.example", "tags": ["ml", "types"]
        });
        let record: UserRecord = serde_json::from_value(stored.clone()).unwrap();

        assert_eq!(record.extra["homepage"], "https://dana.example");
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);
    }

    #[test]
    fn test_record_set_is_a_json_array() {
        let set: RecordSet = vec![
            UserRecord::new("Alice", "u1", "C,Python", Some("2020".into())),
            UserRecord::new("Alice", "u1b", "Zig", None),
        ]
        .into();

        let value = serde_json::to_value(&set).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}
