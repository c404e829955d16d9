//! Owned result rows copied out of a driver result set.
//!
//! # Invariants
//! - Column order matches the SQL result order.
//! - Rows hold no reference to the connection or cursor they came from.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One column value as reported by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Non UTF-8 binary data.
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Builds a value from raw text-protocol bytes, preferring `Text`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Bytes(err.into_bytes()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Interprets the value as a non-negative integer.
    ///
    /// Drivers report `COUNT(*)` either as a number or as its decimal text.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(value) => u64::try_from(*value).ok(),
            Self::UInt(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            Self::Null | Self::Float(_) => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Ordered `column name -> value` mapping for one result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, SqlValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column. Duplicate names are kept; lookups return the first.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Builder-style variant of [`ResultRow::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Value at a zero-based column position.
    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.columns.get(index).map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<N: Into<String>, V: Into<SqlValue>> FromIterator<(N, V)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{ResultRow, SqlValue};

    #[test]
    fn count_values_parse_from_numbers_and_text() {
        assert_eq!(SqlValue::Int(10).as_u64(), Some(10));
        assert_eq!(SqlValue::UInt(7).as_u64(), Some(7));
        assert_eq!(SqlValue::from("42").as_u64(), Some(42));
        assert_eq!(SqlValue::Bytes(b"12".to_vec()).as_u64(), Some(12));
        assert_eq!(SqlValue::Int(-1).as_u64(), None);
        assert_eq!(SqlValue::from("ten").as_u64(), None);
        assert_eq!(SqlValue::Null.as_u64(), None);
    }

    #[test]
    fn from_bytes_prefers_text() {
        assert_eq!(SqlValue::from_bytes(b"abc".to_vec()), SqlValue::from("abc"));
        assert_eq!(
            SqlValue::from_bytes(vec![0xff, 0xfe]),
            SqlValue::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn row_lookup_returns_first_matching_column() {
        let row = ResultRow::new()
            .with("id", 1_i64)
            .with("title", "first")
            .with("title", "shadowed");

        assert_eq!(row.get("title"), Some(&SqlValue::from("first")));
        assert_eq!(row.value_at(2), Some(&SqlValue::from("shadowed")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.column_names().collect::<Vec<_>>(), ["id", "title", "title"]);
    }
}
