use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{
  QueryError,
  Result,
};

/// Key to raw (still percent-encoded) value, in query-string order.
///
/// Always materialized from the address bar on demand; never kept as a
/// source of truth between calls.
pub type ParamMap = IndexMap<String, String>;

/// A value that can be assigned to a query parameter.
///
/// `Null` deletes the key.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
  Str(String),
  Int(i64),
  UInt(u64),
  Float(f64),
  Bool(bool),
  List(Vec<String>),
  Null,
}

impl QueryValue {
  #[inline]
  pub fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }
}

impl fmt::Display for QueryValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Str(s) => f.write_str(s),
      Self::Int(n) => write!(f, "{n}"),
      Self::UInt(n) => write!(f, "{n}"),
      Self::Float(n) if n.is_nan() => f.write_str("NaN"),
      Self::Float(n) if n.is_infinite() => {
        f.write_str(if n.is_sign_negative() { "-Infinity" } else { "Infinity" })
      },
      Self::Float(n) => write_number(f, *n),
      Self::Bool(b) => write!(f, "{b}"),
      Self::List(items) => f.write_str(&items.join(",")),
      Self::Null => Ok(()),
    }
  }
}

/// Finite float in the shape of ECMAScript `Number::toString`: exponent form
/// with an explicit sign outside `1e-6..1e21`, and no negative zero.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
  if n == 0.0 {
    return f.write_str("0");
  }
  let magnitude = n.abs();
  if !(1e-6..1e21).contains(&magnitude) {
    let formatted = format!("{n:e}");
    return match formatted.split_once('e') {
      Some((mantissa, exponent)) if !exponent.starts_with('-') => {
        write!(f, "{mantissa}e+{exponent}")
      },
      _ => f.write_str(&formatted),
    };
  }
  write!(f, "{n}")
}

impl From<&str> for QueryValue {
  fn from(value: &str) -> Self {
    Self::Str(value.to_owned())
  }
}

impl From<String> for QueryValue {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

impl From<&String> for QueryValue {
  fn from(value: &String) -> Self {
    Self::Str(value.clone())
  }
}

impl From<bool> for QueryValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<f64> for QueryValue {
  fn from(value: f64) -> Self {
    Self::Float(value)
  }
}

impl From<f32> for QueryValue {
  fn from(value: f32) -> Self {
    Self::Float(value.into())
  }
}

macro_rules! signed_into_value {
  ($($ty:ty),*) => {
    $(impl From<$ty> for QueryValue {
      fn from(value: $ty) -> Self {
        Self::Int(value.into())
      }
    })*
  };
}

macro_rules! unsigned_into_value {
  ($($ty:ty),*) => {
    $(impl From<$ty> for QueryValue {
      fn from(value: $ty) -> Self {
        Self::UInt(value as u64)
      }
    })*
  };
}

signed_into_value!(i8, i16, i32, i64);
unsigned_into_value!(u8, u16, u32, u64, usize);

impl From<Vec<String>> for QueryValue {
  fn from(value: Vec<String>) -> Self {
    Self::List(value)
  }
}

impl From<Vec<&str>> for QueryValue {
  fn from(value: Vec<&str>) -> Self {
    Self::List(value.into_iter().map(str::to_owned).collect())
  }
}

impl From<&[&str]> for QueryValue {
  fn from(value: &[&str]) -> Self {
    Self::List(value.iter().map(|s| (*s).to_owned()).collect())
  }
}

impl<const N: usize> From<[&str; N]> for QueryValue {
  fn from(value: [&str; N]) -> Self {
    Self::List(value.iter().map(|s| (*s).to_owned()).collect())
  }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Null, Into::into)
  }
}

impl TryFrom<&Value> for QueryValue {
  type Error = QueryError;

  fn try_from(value: &Value) -> Result<Self> {
    match value {
      Value::Null => Ok(Self::Null),
      Value::Bool(b) => Ok(Self::Bool(*b)),
      Value::String(s) => Ok(Self::Str(s.clone())),
      Value::Number(n) => {
        if let Some(n) = n.as_i64() {
          Ok(Self::Int(n))
        } else if let Some(n) = n.as_u64() {
          Ok(Self::UInt(n))
        } else {
          Ok(Self::Float(n.as_f64().unwrap_or(f64::NAN)))
        }
      },
      Value::Array(items) => {
        items
          .iter()
          .map(|item| {
            item.as_str().map(str::to_owned).ok_or_else(|| {
              QueryError::InvalidArgument(format!("array values must be strings, got {item}"))
            })
          })
          .collect::<Result<Vec<_>>>()
          .map(Self::List)
      },
      Value::Object(_) => {
        Err(QueryError::InvalidArgument(
          "objects cannot be stored as a parameter value".to_string(),
        ))
      },
    }
  }
}

/// A single key/value edit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryUpdate {
  pub key:   String,
  pub value: QueryValue,
}

impl QueryUpdate {
  pub fn new(key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
    Self {
      key:   key.into(),
      value: value.into(),
    }
  }

  /// An update that removes `key`.
  pub fn delete(key: impl Into<String>) -> Self {
    Self {
      key:   key.into(),
      value: QueryValue::Null,
    }
  }
}

impl<K: Into<String>, V: Into<QueryValue>> From<(K, V)> for QueryUpdate {
  fn from((key, value): (K, V)) -> Self {
    Self::new(key, value)
  }
}

/// Coercion from a raw parameter string, driven by the type of the default
/// passed to [`ParamStore::get_typed`](crate::ParamStore::get_typed).
pub trait TypedParam: Sized {
  /// `None` means the raw text could not be coerced.
  fn from_param(raw: &str) -> Option<Self>;
}

impl TypedParam for String {
  fn from_param(raw: &str) -> Option<Self> {
    Some(raw.to_owned())
  }
}

impl TypedParam for bool {
  fn from_param(raw: &str) -> Option<Self> {
    Some(raw == "true")
  }
}

macro_rules! numeric_param {
  ($($ty:ty),*) => {
    $(impl TypedParam for $ty {
      fn from_param(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
      }
    })*
  };
}

numeric_param!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl TypedParam for f64 {
  fn from_param(raw: &str) -> Option<Self> {
    raw.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
  }
}

impl TypedParam for f32 {
  fn from_param(raw: &str) -> Option<Self> {
    raw.trim().parse::<f32>().ok().filter(|n| !n.is_nan())
  }
}
