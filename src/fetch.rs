use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::DbError;
use crate::results::{Fetched, FetchedAll, MapKey, Pairs, Projection, Row};
use crate::types::Value;

/// How rows are shaped when fetched from a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchMode {
    /// Ordered column → value mapping per row
    #[default]
    Row,
    /// A single value from the given 0-based column
    Column(usize),
    /// First column as key, second column as value
    KeyValuePair,
    /// First column as key, the remaining columns as the value
    KeyRowPair,
    /// Rows bucketed by their first column
    GroupRow,
    /// Second-column values bucketed by the first column
    GroupColumn,
}

impl FetchMode {
    /// Fewest columns a result needs for this mode.
    #[must_use]
    pub fn min_columns(self) -> usize {
        match self {
            FetchMode::Row => 0,
            FetchMode::Column(idx) => idx + 1,
            FetchMode::KeyRowPair | FetchMode::GroupRow => 1,
            FetchMode::KeyValuePair | FetchMode::GroupColumn => 2,
        }
    }
}

/// Applies one fetch mode to rows sharing the same columns.
#[derive(Debug)]
pub(crate) struct Shaper {
    mode: FetchMode,
    rest_columns: Arc<Vec<String>>,
}

impl Shaper {
    /// # Errors
    /// Returns `DbError::FetchModeError` if the result has too few columns for `mode`
    /// (or not exactly two for `KeyValuePair`).
    pub(crate) fn new(mode: FetchMode, columns: &[String]) -> Result<Self, DbError> {
        let count = columns.len();
        if mode == FetchMode::KeyValuePair && count != 2 {
            return Err(DbError::FetchModeError(format!(
                "KeyValuePair requires exactly 2 columns, result has {count}"
            )));
        }
        if count < mode.min_columns() {
            return Err(DbError::FetchModeError(format!(
                "{mode:?} requires at least {} columns, result has {count}",
                mode.min_columns()
            )));
        }
        let rest_columns = match mode {
            FetchMode::KeyRowPair | FetchMode::GroupRow => {
                Arc::new(columns.iter().skip(1).cloned().collect())
            }
            _ => Arc::new(Vec::new()),
        };
        Ok(Self { mode, rest_columns })
    }

    /// Empty result in the shape `mode` drains into.
    pub(crate) fn empty(mode: FetchMode) -> FetchedAll {
        match mode {
            FetchMode::Row => FetchedAll::Rows(Vec::new()),
            FetchMode::Column(_) => FetchedAll::Values(Vec::new()),
            FetchMode::KeyValuePair => FetchedAll::Pairs(IndexMap::new()),
            FetchMode::KeyRowPair => FetchedAll::KeyRows(IndexMap::new()),
            FetchMode::GroupRow => FetchedAll::Groups(IndexMap::new()),
            FetchMode::GroupColumn => FetchedAll::GroupValues(IndexMap::new()),
        }
    }

    pub(crate) fn shape(&self, row: Row) -> Fetched {
        match self.mode {
            FetchMode::Row => Fetched::Row(row),
            FetchMode::Column(idx) => Fetched::Value(take_value(row, idx)),
            FetchMode::KeyValuePair | FetchMode::GroupColumn => {
                let mut values = row.into_values().into_iter();
                let key = values.next().unwrap_or(Value::Null);
                let value = values.next().unwrap_or(Value::Null);
                Fetched::Pair(MapKey::from_value(&key), value)
            }
            FetchMode::KeyRowPair | FetchMode::GroupRow => {
                let (key, rest) = row.split_off_column(0, &self.rest_columns);
                Fetched::KeyRow(MapKey::from_value(&key), rest)
            }
        }
    }

    /// Shape a drained result. Later rows overwrite earlier ones on duplicate
    /// keys, keeping the position of the first occurrence.
    pub(crate) fn shape_all(&self, rows: Vec<Row>) -> FetchedAll {
        match self.mode {
            FetchMode::Row => FetchedAll::Rows(rows),
            FetchMode::Column(idx) => {
                FetchedAll::Values(rows.into_iter().map(|row| take_value(row, idx)).collect())
            }
            FetchMode::KeyValuePair => {
                let mut map = IndexMap::with_capacity(rows.len());
                for row in rows {
                    if let Fetched::Pair(key, value) = self.shape(row) {
                        map.insert(key, value);
                    }
                }
                FetchedAll::Pairs(map)
            }
            FetchMode::KeyRowPair => {
                let mut map = IndexMap::with_capacity(rows.len());
                for row in rows {
                    if let Fetched::KeyRow(key, rest) = self.shape(row) {
                        map.insert(key, rest);
                    }
                }
                FetchedAll::KeyRows(map)
            }
            FetchMode::GroupRow => {
                let mut map: IndexMap<MapKey, Vec<Row>> = IndexMap::new();
                for row in rows {
                    if let Fetched::KeyRow(key, rest) = self.shape(row) {
                        map.entry(key).or_default().push(rest);
                    }
                }
                FetchedAll::Groups(map)
            }
            FetchMode::GroupColumn => {
                let mut map: IndexMap<MapKey, Vec<Value>> = IndexMap::new();
                for row in rows {
                    if let Fetched::Pair(key, value) = self.shape(row) {
                        map.entry(key).or_default().push(value);
                    }
                }
                FetchedAll::GroupValues(map)
            }
        }
    }
}

fn take_value(row: Row, idx: usize) -> Value {
    row.into_values()
        .into_iter()
        .nth(idx)
        .unwrap_or(Value::Null)
}

fn column_position(columns: &[String], name: &str) -> Result<usize, DbError> {
    columns
        .iter()
        .position(|col| col == name)
        .ok_or_else(|| DbError::FetchModeError(format!("unknown column {name:?}")))
}

/// Project drained rows into a mapping keyed by `key` (or a list without one),
/// holding the `value` column or the full row.
///
/// # Errors
/// Returns `DbError::FetchModeError` if `key` or `value` is not a result column.
pub(crate) fn project_pairs(
    rows: Vec<Row>,
    columns: &[String],
    key: Option<&str>,
    value: Option<&str>,
) -> Result<Pairs, DbError> {
    let key_idx = key.map(|name| column_position(columns, name)).transpose()?;
    let value_idx = value.map(|name| column_position(columns, name)).transpose()?;

    let project = |row: Row| match value_idx {
        Some(idx) => Projection::Value(row.get_by_index(idx).cloned().unwrap_or(Value::Null)),
        None => Projection::Row(row),
    };

    match key_idx {
        None => Ok(Pairs::List(rows.into_iter().map(project).collect())),
        Some(idx) => {
            let mut map = IndexMap::with_capacity(rows.len());
            for row in rows {
                let key = row
                    .get_by_index(idx)
                    .map_or(MapKey::Text(String::new()), MapKey::from_value);
                map.insert(key, project(row));
            }
            Ok(Pairs::Keyed(map))
        }
    }
}
