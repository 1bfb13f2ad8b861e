//! Named parameter snapshots that can be re-applied later.
//!
//! Snapshot values may be plain text or the stored form returned by
//! [`ParamStore::params`]. Applying a preset unescapes each value once and
//! routes it through [`ParamStore::update_many`], which encodes it again, so
//! both forms restore the same stored value. Applying merges into the
//! current parameters rather than replacing them.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::{
  codec,
  error::Result,
  store::ParamStore,
  value::{
    ParamMap,
    QueryUpdate,
  },
};

#[derive(Debug, Default)]
pub(crate) struct PresetTable {
  presets: RefCell<IndexMap<String, ParamMap>>,
}

impl ParamStore {
  /// Store a copy of `snapshot` under `name`, replacing any existing preset.
  pub fn save_preset<I, K, V>(&self, name: impl Into<String>, snapshot: I)
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let name = name.into();
    let snapshot: ParamMap = snapshot
      .into_iter()
      .map(|(key, value)| (key.into(), value.into()))
      .collect();
    tracing::debug!(%name, keys = snapshot.len(), "saving preset");
    self.presets().presets.borrow_mut().insert(name, snapshot);
  }

  /// Merge the preset into the current parameters with one write. Returns
  /// `false` without writing if no preset has that name.
  pub fn apply_preset(&self, name: &str) -> Result<bool> {
    let Some(snapshot) = self.preset(name) else {
      tracing::debug!(%name, "no preset to apply");
      return Ok(false);
    };
    self.update_many(
      snapshot
        .into_iter()
        .map(|(key, value)| QueryUpdate::new(key, codec::decode_component(&value))),
    )?;
    Ok(true)
  }

  /// Returns `true` if a preset was removed.
  pub fn remove_preset(&self, name: &str) -> bool {
    self.presets().presets.borrow_mut().shift_remove(name).is_some()
  }

  pub fn preset(&self, name: &str) -> Option<ParamMap> {
    self.presets().presets.borrow().get(name).cloned()
  }

  pub fn preset_names(&self) -> Vec<String> {
    self.presets().presets.borrow().keys().cloned().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::location::{
    Location,
    MemoryLocation,
  };

  #[test]
  fn apply_merges_with_current_params() {
    let location = MemoryLocation::default();
    let store = ParamStore::new(location.clone());
    store.save_preset("p", [("x", "1")]);

    store.update("x", "9").unwrap();
    store.update("y", "2").unwrap();
    assert!(store.apply_preset("p").unwrap());
    assert_eq!(location.search(), "?x=1&y=2");
  }

  #[test]
  fn save_copies_the_snapshot() {
    let store = ParamStore::new(MemoryLocation::default());
    let mut snapshot = ParamMap::new();
    snapshot.insert("a".into(), "1".into());
    store.save_preset("p", &snapshot);
    snapshot.insert("b".into(), "2".into());

    assert_eq!(store.preset("p").map(|p| p.len()), Some(1));
  }

  #[test]
  fn save_overwrites_and_remove_deletes() {
    let location = MemoryLocation::default();
    let store = ParamStore::new(location.clone());
    store.save_preset("p", [("a", "1")]);
    store.save_preset("p", [("b", "2")]);
    assert_eq!(store.preset_names(), vec!["p"]);

    store.apply_preset("p").unwrap();
    assert_eq!(location.search(), "?b=2");

    assert!(store.remove_preset("p"));
    assert!(!store.remove_preset("p"));
  }

  #[test]
  fn unknown_preset_is_a_no_op() {
    let location = MemoryLocation::new("/?a=1");
    let store = ParamStore::new(location.clone());
    assert!(!store.apply_preset("missing").unwrap());
    assert_eq!(location.replace_count(), 0);
  }

  #[test]
  fn apply_is_a_single_write() {
    let location = MemoryLocation::default();
    let store = ParamStore::new(location.clone());
    store.save_preset("filters", [("sort", "asc"), ("page", "2"), ("q", "red shoes")]);
    store.apply_preset("filters").unwrap();
    assert_eq!(location.replace_count(), 1);
    assert_eq!(store.get("q").as_deref(), Some("red%20shoes"));
  }

  #[test]
  fn snapshot_of_live_params_restores_stored_values() {
    let location = MemoryLocation::default();
    let store = ParamStore::new(location.clone());
    store.update("q", "red shoes").unwrap();
    store.update("tags", ["a", "b"]).unwrap();
    store.save_preset("p", store.params());

    store.update("q", "other").unwrap();
    store.clear(["tags"]).unwrap();
    store.apply_preset("p").unwrap();
    assert_eq!(store.get("q").as_deref(), Some("red%20shoes"));
    assert_eq!(store.get_array("tags"), vec!["a", "b"]);

    store.apply_preset("p").unwrap();
    assert_eq!(location.search(), "?q=red%2520shoes&tags=a%252Cb");
  }
}
