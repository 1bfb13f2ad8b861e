//! Batched edits applied with a single write.
//!
//! A [`Transaction`] snapshots the parameters when it is created and edits
//! that private copy. Nothing is visible in the address bar until
//! [`Transaction::commit`], which performs exactly one write. A committed
//! transaction may keep being edited and committed again; it continues from
//! the committed snapshot rather than re-reading the address bar.
//!
//! ```
//! use the_query::{Location, MemoryLocation, ParamStore};
//!
//! let location = MemoryLocation::new("/");
//! let store = ParamStore::new(location.clone());
//!
//! let mut tx = store.transaction();
//! tx.update("a", "1")?.update("b", "2")?.delete("c");
//! tx.commit()?;
//!
//! assert_eq!(location.search(), "?a=1&b=2");
//! assert_eq!(location.replace_count(), 1);
//! # Ok::<(), the_query::QueryError>(())
//! ```

use crate::{
  error::Result,
  store::{
    ParamStore,
    apply_update,
  },
  validator,
  value::{
    ParamMap,
    QueryUpdate,
    QueryValue,
  },
};

#[derive(Debug)]
pub struct Transaction {
  store:  ParamStore,
  params: ParamMap,
}

impl Transaction {
  fn new(store: ParamStore) -> Self {
    let params = store.params();
    Self { store, params }
  }

  /// The pending parameters.
  pub fn params(&self) -> &ParamMap {
    &self.params
  }

  pub fn update(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Result<&mut Self> {
    self.update_one(QueryUpdate::new(key, value))
  }

  pub fn update_one(&mut self, update: QueryUpdate) -> Result<&mut Self> {
    validator::validate_input(&update)?;
    apply_update(&mut self.params, &update);
    Ok(self)
  }

  /// Apply a batch. If any update is invalid the pending parameters are left
  /// untouched.
  pub fn updates<I>(&mut self, updates: I) -> Result<&mut Self>
  where
    I: IntoIterator<Item = QueryUpdate>,
  {
    let updates: Vec<QueryUpdate> = updates.into_iter().collect();
    updates.iter().try_for_each(validator::validate_input)?;
    for update in &updates {
      apply_update(&mut self.params, update);
    }
    Ok(self)
  }

  pub fn delete(&mut self, key: &str) -> &mut Self {
    self.params.shift_remove(key);
    self
  }

  pub fn clear<I, K>(&mut self, keys: I) -> &mut Self
  where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
  {
    for key in keys {
      self.params.shift_remove(key.as_ref());
    }
    self
  }

  pub fn clear_all(&mut self) -> &mut Self {
    self.params.clear();
    self
  }

  /// Write the pending parameters in one step.
  pub fn commit(&mut self) -> Result<()> {
    tracing::trace!(params = self.params.len(), "committing transaction");
    self.store.write(&self.params)
  }
}

impl ParamStore {
  /// Start a transaction over a snapshot of the current parameters.
  pub fn transaction(&self) -> Transaction {
    Transaction::new(self.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::Cell,
    rc::Rc,
  };

  use super::*;
  use crate::{
    error::QueryError,
    location::{
      Location,
      MemoryLocation,
    },
  };

  #[test]
  fn nothing_is_visible_before_commit() {
    let location = MemoryLocation::new("/?keep=1");
    let store = ParamStore::new(location.clone());
    let mut tx = store.transaction();
    tx.update("a", "1").unwrap().delete("keep");
    assert_eq!(location.search(), "?keep=1");
    assert_eq!(tx.params().get("a").map(String::as_str), Some("1"));

    tx.commit().unwrap();
    assert_eq!(location.search(), "?a=1");
  }

  #[test]
  fn commit_notifies_once() {
    let store = ParamStore::new(MemoryLocation::default());
    let calls = Rc::new(Cell::new(0));
    {
      let calls = calls.clone();
      store.subscribe(move |_, _| {
        calls.set(calls.get() + 1);
        Ok(())
      });
    }

    store
      .transaction()
      .updates([QueryUpdate::new("a", 1), QueryUpdate::new("b", 2)])
      .unwrap()
      .clear(["a"])
      .commit()
      .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(store.param_string(), "b=2");
  }

  #[test]
  fn invalid_update_keeps_pending_state() {
    let store = ParamStore::new(MemoryLocation::default());
    let mut tx = store.transaction();
    let result = tx.updates([QueryUpdate::new("a", "1"), QueryUpdate::new("", "x")]);
    assert!(matches!(result, Err(QueryError::InvalidKey)));
    assert!(tx.params().is_empty());
  }

  #[test]
  fn reuse_after_commit_continues_from_snapshot() {
    let location = MemoryLocation::default();
    let store = ParamStore::new(location.clone());
    let mut tx = store.transaction();
    tx.update("a", "1").unwrap();
    tx.commit().unwrap();

    store.update("outside", "x").unwrap();
    tx.update("b", "2").unwrap();
    tx.commit().unwrap();
    assert_eq!(location.search(), "?a=1&b=2");
  }

  #[test]
  fn clear_all_then_commit_empties_the_query() {
    let location = MemoryLocation::new("/list?a=1&b=2");
    let store = ParamStore::new(location.clone());
    store.transaction().clear_all().commit().unwrap();
    assert_eq!(location.href(), "/list");
  }
}
