//! Pack structured state into a single parameter value.
//!
//! Tokens are JSON encoded as URL-safe base64 without padding, so they can be
//! stored in one query value untouched. Standard padded base64 is accepted
//! on decode as well.

use base64::{
  Engine as _,
  engine::general_purpose::{
    STANDARD,
    URL_SAFE_NO_PAD,
  },
};
use serde::{
  Serialize,
  de::DeserializeOwned,
};

use crate::{
  codec,
  error::{
    QueryError,
    Result,
  },
  store::ParamStore,
};

pub fn serialize_object<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  let json = serde_json::to_vec(value).map_err(|err| QueryError::Serialization(err.to_string()))?;
  Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn deserialize_object<T: DeserializeOwned>(token: &str) -> Result<T> {
  let bytes = URL_SAFE_NO_PAD
    .decode(token)
    .or_else(|_| STANDARD.decode(token))
    .map_err(|err| QueryError::Deserialization(err.to_string()))?;
  serde_json::from_slice(&bytes).map_err(|err| QueryError::Deserialization(err.to_string()))
}

impl ParamStore {
  /// Store `value` under `key` as an opaque token.
  pub fn update_object<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T) -> Result<()> {
    self.update(key, serialize_object(value)?)
  }

  /// Read back a value stored with [`ParamStore::update_object`].
  pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    self
      .get(key)
      .map(|raw| deserialize_object(&codec::decode_component(&raw)))
      .transpose()
  }
}
