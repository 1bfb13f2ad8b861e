//! Conversion between typed values and the flat text stored in the query
//! string.
//!
//! Sequences are joined with [`ARRAY_DELIMITER`] and percent-encoded as one
//! unit. Decoding splits on the delimiter, so a lone value that contains a
//! comma comes back as a sequence. That ambiguity is inherent to the format.

use percent_encoding::{
  AsciiSet,
  NON_ALPHANUMERIC,
  percent_decode_str,
  utf8_percent_encode,
};
use url::form_urlencoded;

use crate::value::{
  ParamMap,
  QueryValue,
};

pub const ARRAY_DELIMITER: char = ',';

/// Everything except the unreserved marks kept by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
  Scalar(String),
  List(Vec<String>),
}

impl Decoded {
  /// Normalize to a sequence, wrapping a scalar.
  pub fn into_vec(self) -> Vec<String> {
    match self {
      Self::Scalar(s) => vec![s],
      Self::List(items) => items,
    }
  }

  pub fn as_scalar(&self) -> Option<&str> {
    match self {
      Self::Scalar(s) => Some(s),
      Self::List(_) => None,
    }
  }
}

/// Encode a value into its stored form. `Null` encodes to the empty string.
pub fn encode(value: &QueryValue) -> String {
  match value {
    QueryValue::List(items) => encode_component(&items.join(ARRAY_DELIMITER.to_string().as_str())),
    other => encode_component(&other.to_string()),
  }
}

pub fn decode(raw: &str) -> Decoded {
  let decoded = decode_component(raw);
  if decoded.contains(ARRAY_DELIMITER) {
    Decoded::List(
      decoded
        .split(ARRAY_DELIMITER)
        .map(str::to_owned)
        .collect(),
    )
  } else {
    Decoded::Scalar(decoded)
  }
}

pub fn encode_component(text: &str) -> String {
  utf8_percent_encode(text, COMPONENT).to_string()
}

/// Lossy: invalid UTF-8 after unescaping becomes U+FFFD.
pub fn decode_component(text: &str) -> String {
  percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Parse `key=value&...` (an optional leading `?` is ignored).
///
/// A repeated key keeps its first position and its last value.
pub fn parse_query(query: &str) -> ParamMap {
  let query = query.strip_prefix('?').unwrap_or(query);
  let mut params = ParamMap::new();
  for (key, value) in form_urlencoded::parse(query.as_bytes()) {
    params.insert(key.into_owned(), value.into_owned());
  }
  params
}

/// Serialize without a leading `?`.
pub fn to_query_string(params: &ParamMap) -> String {
  form_urlencoded::Serializer::new(String::new())
    .extend_pairs(params.iter())
    .finish()
}
