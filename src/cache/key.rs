//! Cache Key Module
//!
//! Logical cache keys and their conversion to storage text.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Cache Key ==
/// Logical key supplied by callers.
///
/// Every variant except [`CacheKey::Custom`] has a built-in text form.
/// Custom keys need a converter registered for their type name.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    List(Vec<CacheKey>),
    Map(Vec<(CacheKey, CacheKey)>),
    Custom { type_name: String, value: Value },
}

impl CacheKey {
    /// Builds a custom key from any serializable value.
    pub fn custom(type_name: impl Into<String>, value: &impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::KeyConversion(format!("Cannot capture custom key: {}", e)))?;
        Ok(CacheKey::Custom {
            type_name: type_name.into(),
            value,
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Text(s) => f.write_str(s),
            CacheKey::Integer(n) => write!(f, "{}", n),
            CacheKey::Unsigned(n) => write!(f, "{}", n),
            CacheKey::Float(n) => write!(f, "{}", n),
            CacheKey::Boolean(b) => write!(f, "{}", b),
            CacheKey::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            CacheKey::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            CacheKey::Custom { type_name, value } => write!(f, "{}({})", type_name, value),
        }
    }
}

// == Conversions ==
impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::Text(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::Text(value)
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        CacheKey::Text(value.clone())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for CacheKey {
            fn from(value: $t) -> Self {
                CacheKey::Integer(value as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for CacheKey {
            fn from(value: $t) -> Self {
                CacheKey::Unsigned(value as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f64> for CacheKey {
    fn from(value: f64) -> Self {
        CacheKey::Float(value)
    }
}

impl From<bool> for CacheKey {
    fn from(value: bool) -> Self {
        CacheKey::Boolean(value)
    }
}

impl<T: Into<CacheKey>> From<Vec<T>> for CacheKey {
    fn from(items: Vec<T>) -> Self {
        CacheKey::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<CacheKey>, V: Into<CacheKey>> From<BTreeMap<K, V>> for CacheKey {
    fn from(map: BTreeMap<K, V>) -> Self {
        CacheKey::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<CacheKey>, V: Into<CacheKey>, S> From<HashMap<K, V, S>> for CacheKey {
    fn from(map: HashMap<K, V, S>) -> Self {
        CacheKey::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl TryFrom<&Value> for CacheKey {
    type Error = CacheError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Err(CacheError::KeyConversion(
                "Null is not a valid cache key".to_string(),
            )),
            Value::Bool(b) => Ok(CacheKey::Boolean(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(CacheKey::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(CacheKey::Unsigned(u))
                } else {
                    n.as_f64().map(CacheKey::Float).ok_or_else(|| {
                        CacheError::KeyConversion(format!("Unrepresentable number {}", n))
                    })
                }
            }
            Value::String(s) => Ok(CacheKey::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(CacheKey::try_from)
                .collect::<Result<Vec<_>>>()
                .map(CacheKey::List),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    Ok::<_, CacheError>((CacheKey::Text(k.clone()), CacheKey::try_from(v)?))
                })
                .collect::<Result<Vec<_>>>()
                .map(CacheKey::Map),
        }
    }
}

// == Key Converter ==
/// Renders a logical key into the text that gets prefixed and serialized.
///
/// The same converter must serve reads, writes and evictions, or entries
/// become unreachable.
pub trait KeyConverter: Send + Sync + fmt::Debug {
    fn convert(&self, key: &CacheKey) -> Result<String>;
}

type CustomConversion = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Default converter with opt-in support for custom key types.
#[derive(Clone, Default)]
pub struct StandardKeyConverter {
    custom: HashMap<String, CustomConversion>,
}

impl StandardKeyConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the text form for custom keys named `type_name`.
    ///
    /// Returning `None` from `convert` rejects that particular key.
    pub fn with_converter<F>(mut self, type_name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.custom.insert(type_name.into(), Arc::new(convert));
        self
    }
}

impl fmt::Debug for StandardKeyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<&String> = self.custom.keys().collect();
        registered.sort();
        f.debug_struct("StandardKeyConverter")
            .field("custom", &registered)
            .finish()
    }
}

impl KeyConverter for StandardKeyConverter {
    fn convert(&self, key: &CacheKey) -> Result<String> {
        match key {
            CacheKey::Text(s) => Ok(s.clone()),
            CacheKey::Integer(_)
            | CacheKey::Unsigned(_)
            | CacheKey::Float(_)
            | CacheKey::Boolean(_) => Ok(key.to_string()),
            CacheKey::List(items) => {
                let rendered = items
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", rendered.join(",")))
            }
            CacheKey::Map(entries) => {
                // Sorted so that map iteration order never changes the key.
                let mut rendered = entries
                    .iter()
                    .map(|(k, v)| {
                        Ok::<_, CacheError>(format!("{}={}", self.convert(k)?, self.convert(v)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                rendered.sort();
                Ok(format!("{{{}}}", rendered.join(", ")))
            }
            CacheKey::Custom { type_name, value } => {
                let convert = self.custom.get(type_name).ok_or_else(|| {
                    CacheError::KeyConversion(format!(
                        "Cannot convert cache key of type '{}' to String; register a converter \
                         for it on the cache configuration",
                        type_name
                    ))
                })?;
                convert(value).ok_or_else(|| {
                    CacheError::KeyConversion(format!(
                        "Converter for '{}' rejected key {}",
                        type_name, value
                    ))
                })
            }
        }
    }
}
