use std::fmt;

use indexmap::IndexMap;

use super::row::Row;
use crate::types::Value;

/// Key of a keyed or grouped fetch.
///
/// Column values are coerced the way associative keys usually are: integers
/// and booleans become `Int`, text that spells a canonical integer becomes
/// `Int`, anything else becomes `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Int(i64),
    Text(String),
}

impl MapKey {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(i) => MapKey::Int(*i),
            Value::Bool(b) => MapKey::Int(i64::from(*b)),
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) => MapKey::Int(f.trunc() as i64),
            Value::Text(s) => Self::from_text(s),
            Value::Null => MapKey::Text(String::new()),
            other => MapKey::Text(other.to_bind_text()),
        }
    }

    fn from_text(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => MapKey::Int(i),
            _ => MapKey::Text(s.to_owned()),
        }
    }
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Int(value)
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::from_text(value)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Text(s) => f.write_str(s),
        }
    }
}

/// One unit returned by `Statement::fetch` under the active fetch mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Row(Row),
    Value(Value),
    Pair(MapKey, Value),
    KeyRow(MapKey, Row),
}

impl Fetched {
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Fetched::Row(row) => Some(row),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Fetched::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything drained by `Statement::fetch_all` under the active fetch mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedAll {
    Rows(Vec<Row>),
    Values(Vec<Value>),
    Pairs(IndexMap<MapKey, Value>),
    KeyRows(IndexMap<MapKey, Row>),
    Groups(IndexMap<MapKey, Vec<Row>>),
    GroupValues(IndexMap<MapKey, Vec<Value>>),
}

impl FetchedAll {
    /// Number of top-level entries (rows, values, keys or groups).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            FetchedAll::Rows(rows) => rows.len(),
            FetchedAll::Values(values) => values.len(),
            FetchedAll::Pairs(map) => map.len(),
            FetchedAll::KeyRows(map) => map.len(),
            FetchedAll::Groups(map) => map.len(),
            FetchedAll::GroupValues(map) => map.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            FetchedAll::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            FetchedAll::Values(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_pairs(self) -> Option<IndexMap<MapKey, Value>> {
        match self {
            FetchedAll::Pairs(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_key_rows(self) -> Option<IndexMap<MapKey, Row>> {
        match self {
            FetchedAll::KeyRows(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_groups(self) -> Option<IndexMap<MapKey, Vec<Row>>> {
        match self {
            FetchedAll::Groups(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_group_values(self) -> Option<IndexMap<MapKey, Vec<Value>>> {
        match self {
            FetchedAll::GroupValues(map) => Some(map),
            _ => None,
        }
    }
}

/// Entry produced by `fetch_pairs`: a single column value or the whole row.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Value(Value),
    Row(Row),
}

impl Projection {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Projection::Value(value) => Some(value),
            Projection::Row(_) => None,
        }
    }

    #[must_use]
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Projection::Row(row) => Some(row),
            Projection::Value(_) => None,
        }
    }
}

/// Result of `fetch_pairs`: keyed by a column, or a plain list when no key was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Pairs {
    Keyed(IndexMap<MapKey, Projection>),
    List(Vec<Projection>),
}

impl Pairs {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Pairs::Keyed(map) => map.len(),
            Pairs::List(list) => list.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
