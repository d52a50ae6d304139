use crate::types::Value;

/// Type hint handed to the driver alongside every bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Bool,
    Int,
    /// Large object / raw binary
    Lob,
    Null,
    Str,
}

/// Pick the bind type for a parameter from the kind of value supplied.
///
/// The table is fixed: booleans, integers, binary data and NULL get their own
/// hint, everything else is bound as text.
#[must_use]
pub fn infer_bind_type(value: &Value) -> BindType {
    match value {
        Value::Bool(_) => BindType::Bool,
        Value::Int(_) => BindType::Int,
        Value::Blob(_) => BindType::Lob,
        Value::Null => BindType::Null,
        Value::Float(_) | Value::Text(_) | Value::Timestamp(_) | Value::JSON(_) => BindType::Str,
    }
}

/// Placeholder a value is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// 1-based position
    Position(usize),
    /// Named placeholder, with or without its leading marker
    Name(String),
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKey::Position(idx) => write!(f, "#{idx}"),
            ParamKey::Name(name) => f.write_str(name),
        }
    }
}

/// A parameter after inference, as recorded by a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub key: ParamKey,
    pub value: Value,
    pub bind_type: BindType,
}

/// Parameters supplied to `prepare`/`execute`.
///
/// Build positional params with [`params!`](crate::params!) or from a `Vec<Value>`;
/// named params from `(name, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    /// No parameters
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(values) => values.is_empty(),
            Params::Named(pairs) => pairs.is_empty(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(pairs) => pairs.len(),
        }
    }

    /// Resolve placeholders and bind types for every value.
    #[must_use]
    pub fn bind_list(&self) -> Vec<BoundParam> {
        match self {
            Params::Positional(values) => values
                .iter()
                .enumerate()
                .map(|(idx, value)| BoundParam {
                    key: ParamKey::Position(idx + 1),
                    value: value.clone(),
                    bind_type: infer_bind_type(value),
                })
                .collect(),
            Params::Named(pairs) => pairs
                .iter()
                .map(|(name, value)| BoundParam {
                    key: ParamKey::Name(name.clone()),
                    value: value.clone(),
                    bind_type: infer_bind_type(value),
                })
                .collect(),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[Value]> for Params {
    fn from(values: &[Value]) -> Self {
        Params::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[Value; N]> for Params {
    fn from(values: [Value; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::none()
    }
}

impl<K: Into<String>> From<Vec<(K, Value)>> for Params {
    fn from(pairs: Vec<(K, Value)>) -> Self {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Build positional [`Params`] from anything convertible into a [`Value`].
///
/// ```rust
/// use simple_db_layer::params;
///
/// let p = params![1, "title", None::<i64>];
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::params::Params::none()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::params::Params::Positional(vec![$($crate::types::Value::from($value)),+])
    };
}
