//! The parameter store: reads and writes the address bar's query string and
//! drives middleware and subscribers after every write.
//!
//! # Write cycle
//!
//! Every mutating call funnels into [`ParamStore::write`], which
//!
//! 1. serializes the map and replaces the current navigation entry (no new
//!    history entry is created),
//! 2. runs the middleware chain with the written map,
//! 3. notifies subscribers with a fresh read of the address bar.
//!
//! Callbacks receive the store and may write again. Such a nested write runs
//! its own full cycle, restarting the middleware chain from the first entry,
//! before the outer write continues. Nesting is capped by
//! [`Config::max_write_depth`]; past the cap a write fails with
//! [`QueryError::MiddlewareRecursionExceeded`] and leaves the address bar
//! untouched.
//!
//! Batch operations validate every element before anything is applied, so a
//! rejected batch never becomes visible.

use std::{
  cell::Cell,
  rc::Rc,
};

use serde_json::{
  Value,
  json,
};

use crate::{
  codec,
  config::Config,
  error::{
    QueryError,
    Result,
  },
  location::Location,
  middleware::MiddlewareChain,
  presets::PresetTable,
  subscriber::SubscriberRegistry,
  validator,
  value::{
    ParamMap,
    QueryUpdate,
    QueryValue,
    TypedParam,
  },
};

/// Shared handle to one query-string context. Clones refer to the same
/// location, registries and preset table.
#[derive(Clone)]
pub struct ParamStore {
  inner: Rc<StoreInner>,
}

struct StoreInner {
  location:    Rc<dyn Location>,
  config:      Config,
  middleware:  MiddlewareChain,
  subscribers: SubscriberRegistry,
  presets:     PresetTable,
  depth:       Cell<usize>,
}

impl std::fmt::Debug for ParamStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ParamStore")
      .field("search", &self.inner.location.search())
      .field("middleware", &self.inner.middleware.len())
      .field("subscribers", &self.inner.subscribers.len())
      .field("depth", &self.inner.depth.get())
      .finish()
  }
}

/// Restores the write depth when a write cycle ends, even on unwind.
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
  fn drop(&mut self) {
    self.0.set(self.0.get().saturating_sub(1));
  }
}

impl ParamStore {
  pub fn new(location: impl Location + 'static) -> Self {
    Self::with_config(location, Config::default())
  }

  pub fn with_config(location: impl Location + 'static, config: Config) -> Self {
    Self {
      inner: Rc::new(StoreInner {
        location: Rc::new(location),
        config,
        middleware: MiddlewareChain::default(),
        subscribers: SubscriberRegistry::default(),
        presets: PresetTable::default(),
        depth: Cell::new(0),
      }),
    }
  }

  pub fn config(&self) -> &Config {
    &self.inner.config
  }

  pub fn location(&self) -> &dyn Location {
    &*self.inner.location
  }

  pub(crate) fn middleware(&self) -> &MiddlewareChain {
    &self.inner.middleware
  }

  pub(crate) fn subscribers(&self) -> &SubscriberRegistry {
    &self.inner.subscribers
  }

  pub(crate) fn presets(&self) -> &PresetTable {
    &self.inner.presets
  }

  /// Current nesting level of write cycles; zero outside any write.
  pub fn write_depth(&self) -> usize {
    self.inner.depth.get()
  }

  /// Parse the address bar into a fresh map.
  pub fn params(&self) -> ParamMap {
    codec::parse_query(&self.inner.location.search())
  }

  /// Raw stored value of `key`.
  pub fn get(&self, key: &str) -> Option<String> {
    self.params().shift_remove(key)
  }

  /// Serialized query without the leading `?`.
  pub fn param_string(&self) -> String {
    codec::to_query_string(&self.params())
  }

  /// Replace the address bar with `params`, then run middleware and notify
  /// subscribers.
  pub fn write(&self, params: &ParamMap) -> Result<()> {
    let depth = self.inner.depth.get();
    let limit = self.inner.config.max_write_depth.max(1);
    if depth >= limit {
      tracing::warn!(depth, limit, "refusing nested parameter write");
      return Err(QueryError::MiddlewareRecursionExceeded { limit });
    }

    let url = self.url_for(params);
    self
      .inner
      .location
      .replace_entry(&json!({ "params": params }), "", &url);
    tracing::trace!(%url, depth, "replaced query string");

    self.inner.depth.set(depth + 1);
    let _guard = DepthGuard(&self.inner.depth);
    self.inner.middleware.execute(self, params);
    self.inner.subscribers.notify(self);
    Ok(())
  }

  /// Set or delete one key.
  pub fn update(&self, key: impl Into<String>, value: impl Into<QueryValue>) -> Result<()> {
    self.update_one(QueryUpdate::new(key, value))
  }

  pub fn update_one(&self, update: QueryUpdate) -> Result<()> {
    validator::validate_input(&update)?;
    let mut params = self.params();
    apply_update(&mut params, &update);
    self.write(&params)
  }

  /// Apply every update against one read and write once.
  pub fn update_many<I>(&self, updates: I) -> Result<()>
  where
    I: IntoIterator<Item = QueryUpdate>,
  {
    let updates: Vec<QueryUpdate> = updates.into_iter().collect();
    updates.iter().try_for_each(validator::validate_input)?;

    let mut params = self.params();
    for update in &updates {
      apply_update(&mut params, update);
    }
    self.write(&params)
  }

  /// [`ParamStore::update_many`] for updates arriving as untyped JSON, e.g.
  /// `[{"key": "a", "value": 1}, {"key": "b", "value": null}]`.
  pub fn update_many_json(&self, updates: &Value) -> Result<()> {
    let Value::Array(items) = updates else {
      return Err(QueryError::InvalidArgument(format!(
        "expected an array of updates, got {updates}"
      )));
    };

    let updates = items
      .iter()
      .map(|item| -> Result<QueryUpdate> {
        let key = match item.get("key") {
          Some(Value::String(key)) => key.clone(),
          _ => {
            return Err(QueryError::InvalidArgument(format!(
              "update {item} has no string key"
            )));
          },
        };
        let value = item
          .get("value")
          .map_or(Ok(QueryValue::Null), QueryValue::try_from)?;
        Ok(QueryUpdate { key, value })
      })
      .collect::<Result<Vec<_>>>()?;

    self.update_many(updates)
  }

  /// Store `values` as one delimited parameter.
  pub fn update_array<I, S>(&self, key: impl Into<String>, values: I) -> Result<()>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    self.update(key, values)
  }

  /// Merge the pairs of `raw` (`a=1&b=2`, optional `?`) into the current
  /// parameters as-is and write once.
  pub fn update_from_query_string(&self, raw: &str) -> Result<()> {
    let mut params = self.params();
    params.extend(codec::parse_query(raw));
    self.write(&params)
  }

  /// Delete `keys` and write once.
  pub fn clear<I, K>(&self, keys: I) -> Result<()>
  where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
  {
    let mut params = self.params();
    for key in keys {
      params.shift_remove(key.as_ref());
    }
    self.write(&params)
  }

  /// [`ParamStore::clear`] for a key or list of keys arriving as JSON.
  pub fn clear_json(&self, keys: &Value) -> Result<()> {
    match keys {
      Value::String(key) => self.clear([key]),
      Value::Array(items) => {
        let keys = items
          .iter()
          .map(|item| {
            item
              .as_str()
              .ok_or_else(|| QueryError::InvalidKeyType(item.to_string()))
          })
          .collect::<Result<Vec<_>>>()?;
        self.clear(keys)
      },
      other => Err(QueryError::InvalidKeyType(other.to_string())),
    }
  }

  pub fn clear_all(&self) -> Result<()> {
    self.write(&ParamMap::new())
  }

  /// Read `key` coerced to the type of `default`. Absent or malformed
  /// values yield `default`.
  pub fn get_typed<T: TypedParam>(&self, key: &str, default: T) -> T {
    self
      .get(key)
      .and_then(|raw| T::from_param(&raw))
      .unwrap_or(default)
  }

  /// Decode `key` as a sequence. Absent or empty values yield an empty
  /// sequence.
  pub fn get_array(&self, key: &str) -> Vec<String> {
    match self.get(key) {
      Some(raw) if !raw.is_empty() => codec::decode(&raw).into_vec(),
      _ => Vec::new(),
    }
  }

  /// Check the current, percent-decoded parameters against the configured
  /// rules.
  pub fn validate(&self) -> Result<()> {
    let decoded: ParamMap = self
      .params()
      .into_iter()
      .map(|(key, value)| {
        let value = codec::decode_component(&value);
        (key, value)
      })
      .collect();
    validator::validate_params(&decoded, &self.inner.config.rules)
  }

  /// Current path joined with the serialized `params`.
  pub(crate) fn url_for(&self, params: &ParamMap) -> String {
    let pathname = self.inner.location.pathname();
    let query = codec::to_query_string(params);
    if query.is_empty() {
      pathname
    } else {
      format!("{pathname}?{query}")
    }
  }
}

/// Set or delete `update.key` in `params`. Callers validate first.
pub(crate) fn apply_update(params: &mut ParamMap, update: &QueryUpdate) {
  if update.value.is_null() {
    params.shift_remove(&update.key);
  } else {
    params.insert(update.key.clone(), codec::encode(&update.value));
  }
}
