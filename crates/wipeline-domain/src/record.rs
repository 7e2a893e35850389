//! Flattened report records.

use indexmap::IndexMap;

/// One flattened report row: dotted field paths mapped to optional values.
///
/// A record preserves the order fields were first seen in the export, which
/// keeps staged rows and exported files stable across runs. A `None` value
/// means the field was present in the report but carried no text; an absent
/// key means the report never produced the field at all. The two are distinct
/// until staging, where both collapse to the empty string.
///
/// # Examples
///
/// ```
/// use wipeline_domain::FlatRecord;
///
/// let mut record = FlatRecord::new();
/// record.insert("description.document_id", Some("abc-123".to_string()));
/// record.insert("erasure.state", None);
///
/// assert_eq!(record.value("description.document_id"), Some("abc-123"));
/// assert_eq!(record.value("erasure.state"), None);
/// assert!(record.contains_key("erasure.state"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    fields: IndexMap<String, Option<String>>,
}

impl FlatRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any existing value
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.fields.insert(key.into(), value);
    }

    /// Set a field only if it has not been seen yet.
    ///
    /// Returns `true` if the field was inserted. Flattening relies on this to
    /// keep the first occurrence when a report repeats a path.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: Option<String>) -> bool {
        let key = key.into();
        if self.fields.contains_key(&key) {
            false
        } else {
            self.fields.insert(key, value);
            true
        }
    }

    /// Look up a field, distinguishing absent keys from null values
    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.fields.get(key)
    }

    /// Look up a field's text, treating absent and null alike
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|value| value.as_deref())
    }

    /// Mutable access to a field's value
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        self.fields.get_mut(key)
    }

    /// True when the field has been seen, null or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Number of fields in the record
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Option<String>)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FlatRecord {
    type Item = (&'a String, &'a Option<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Option<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first_value() {
        let mut record = FlatRecord::new();
        assert!(record.insert_if_absent("a", Some("first".to_string())));
        assert!(!record.insert_if_absent("a", Some("second".to_string())));
        assert_eq!(record.value("a"), Some("first"));
    }

    #[test]
    fn test_absent_and_null_are_distinct() {
        let mut record = FlatRecord::new();
        record.insert("present_null", None);
        assert!(record.contains_key("present_null"));
        assert!(!record.contains_key("missing"));
        assert_eq!(record.value("present_null"), None);
        assert_eq!(record.value("missing"), None);
    }

    #[test]
    fn test_keys_preserve_first_seen_order() {
        let mut record = FlatRecord::new();
        record.insert("z", Some("1".to_string()));
        record.insert("a", Some("2".to_string()));
        record.insert("m", Some("3".to_string()));
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_equality_ignores_field_order() {
        let left: FlatRecord = [
            ("a".to_string(), Some("1".to_string())),
            ("b".to_string(), None),
        ]
        .into_iter()
        .collect();
        let right: FlatRecord = [
            ("b".to_string(), None),
            ("a".to_string(), Some("1".to_string())),
        ]
        .into_iter()
        .collect();
        assert_eq!(left, right);
    }
}
