//! Change listeners notified after middleware completes.

use std::{
  cell::{
    Cell,
    RefCell,
  },
  rc::{
    Rc,
    Weak,
  },
};

use crate::{
  error::Result,
  store::ParamStore,
  value::ParamMap,
};

pub type SubscriberFn = Rc<dyn Fn(&ParamStore, &ParamMap) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

type Entries = RefCell<Vec<(SubscriberId, SubscriberFn)>>;

pub(crate) struct SubscriberRegistry {
  entries: Rc<Entries>,
  next_id: Cell<u64>,
}

impl Default for SubscriberRegistry {
  fn default() -> Self {
    Self {
      entries: Rc::new(RefCell::new(Vec::new())),
      next_id: Cell::new(1),
    }
  }
}

impl SubscriberRegistry {
  fn subscribe(&self, callback: SubscriberFn) -> Subscription {
    let id = SubscriberId(self.next_id.get());
    self.next_id.set(id.0 + 1);
    self.entries.borrow_mut().push((id, callback));
    Subscription {
      id,
      entries: Rc::downgrade(&self.entries),
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.borrow().len()
  }

  /// Deliver a fresh read of the parameters to every subscriber registered
  /// when the pass starts.
  pub(crate) fn notify(&self, store: &ParamStore) {
    let params = store.params();
    let entries = self.entries.borrow().clone();
    tracing::trace!(subscribers = entries.len(), "notifying subscribers");
    for (id, callback) in &entries {
      if let Err(err) = callback(store, &params) {
        tracing::warn!(%err, ?id, "subscriber failed");
      }
    }
  }
}

/// Handle returned by [`ParamStore::subscribe`]. Dropping it keeps the
/// subscriber registered; call [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
  id:      SubscriberId,
  entries: Weak<Entries>,
}

impl Subscription {
  pub fn id(&self) -> SubscriberId {
    self.id
  }

  /// Remove the subscriber. Returns `false` if it was already gone or the
  /// store no longer exists.
  pub fn unsubscribe(self) -> bool {
    let Some(entries) = self.entries.upgrade() else {
      return false;
    };
    let mut entries = entries.borrow_mut();
    let before = entries.len();
    entries.retain(|(id, _)| *id != self.id);
    entries.len() != before
  }
}

impl ParamStore {
  /// Register `callback` to run after every write, after middleware.
  pub fn subscribe<F>(&self, callback: F) -> Subscription
  where
    F: Fn(&ParamStore, &ParamMap) -> Result<()> + 'static,
  {
    self.subscribers().subscribe(Rc::new(callback))
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers().len()
  }

  /// Notify subscribers without running middleware. Used for changes that
  /// did not come from a validated write, such as history navigation.
  pub fn notify_subscribers(&self) {
    self.subscribers().notify(self);
  }
}
