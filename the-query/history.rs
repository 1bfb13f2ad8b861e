//! Programmatic back/forward over a navigation stack of our own.
//!
//! The stack is independent of the host's native session history. Pushing
//! after going back discards the forward entries. Unlike store writes, a
//! push creates a new native entry.
//!
//! Native navigation (the user pressing back or forward) reaches the core
//! through [`HistoryManager::handle_navigation`], which the host calls from
//! its own listener. That path notifies subscribers but skips middleware,
//! since the change did not come from a validated write.

use serde_json::{
  Map,
  Value,
  json,
};

use crate::{
  location::EntryState,
  store::ParamStore,
  value::ParamMap,
};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
  pub data:  EntryState,
  pub title: String,
  pub url:   String,
}

/// Arguments to [`HistoryManager::push`]. Missing fields fall back to the
/// current document.
#[derive(Debug, Clone, Default)]
pub struct HistoryPush {
  /// Extra fields merged into the entry data next to `params`.
  pub data:  Map<String, Value>,
  pub title: Option<String>,
  pub url:   Option<String>,
}

impl HistoryPush {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.data.insert(key.into(), value.into());
    self
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = Some(url.into());
    self
  }
}

#[derive(Debug)]
pub struct HistoryManager {
  store:   ParamStore,
  entries: Vec<HistoryEntry>,
  current: Option<usize>,
}

impl HistoryManager {
  pub fn new(store: &ParamStore) -> Self {
    Self {
      store:   store.clone(),
      entries: Vec::new(),
      current: None,
    }
  }

  pub fn entries(&self) -> &[HistoryEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn index(&self) -> Option<usize> {
    self.current
  }

  pub fn current(&self) -> Option<&HistoryEntry> {
    self.current.and_then(|index| self.entries.get(index))
  }

  pub fn can_go_back(&self) -> bool {
    self.current.is_some_and(|index| index > 0)
  }

  pub fn can_go_forward(&self) -> bool {
    self
      .current
      .is_some_and(|index| index + 1 < self.entries.len())
  }

  /// Record the current parameters as a new entry and push it to the host.
  pub fn push(&mut self, push: HistoryPush) {
    let location = self.store.location();

    let mut data = Map::new();
    data.insert("params".into(), params_value(&self.store.params()));
    data.extend(push.data);
    let data = Value::Object(data);

    let title = push.title.unwrap_or_else(|| {
      let title = location.title();
      if title.is_empty() {
        self.store.config().default_title.clone()
      } else {
        title
      }
    });
    let url = push
      .url
      .unwrap_or_else(|| format!("{}{}", location.pathname(), location.search()));

    let next = self.current.map_or(0, |index| index + 1);
    self.entries.truncate(next);
    self.entries.push(HistoryEntry {
      data: data.clone(),
      title: title.clone(),
      url: url.clone(),
    });
    self.current = Some(next);

    location.push_entry(&data, &title, &url);
    tracing::debug!(index = next, %url, "pushed history entry");
  }

  /// Step back one entry. Returns `false` at the start of the stack.
  pub fn back(&mut self) -> bool {
    match self.current {
      Some(index) if index > 0 => {
        self.go_to(index - 1);
        true
      },
      _ => false,
    }
  }

  /// Step forward one entry. Returns `false` at the end of the stack.
  pub fn forward(&mut self) -> bool {
    match self.current {
      Some(index) if index + 1 < self.entries.len() => {
        self.go_to(index + 1);
        true
      },
      _ => false,
    }
  }

  fn go_to(&mut self, index: usize) {
    self.current = Some(index);
    let entry = &self.entries[index];
    self
      .store
      .location()
      .replace_entry(&entry.data, &entry.title, &entry.url);
    tracing::debug!(index, url = %entry.url, "replayed history entry");
    self.store.notify_subscribers();
  }

  /// Reconcile the address bar with the state delivered by a native
  /// navigation event, then notify subscribers.
  pub fn handle_navigation(&mut self, state: Option<&EntryState>) {
    let params: ParamMap = state
      .and_then(|state| state.get("params"))
      .and_then(Value::as_object)
      .map(|params| {
        params
          .iter()
          .map(|(key, value)| {
            let value = match value {
              Value::String(s) => s.clone(),
              other => other.to_string(),
            };
            (key.clone(), value)
          })
          .collect()
      })
      .unwrap_or_default();

    let url = self.store.url_for(&params);
    self
      .store
      .location()
      .replace_entry(&json!({ "params": params_value(&params) }), "", &url);
    tracing::debug!(%url, "reconciled native navigation");
    self.store.notify_subscribers();
  }
}

fn params_value(params: &ParamMap) -> Value {
  Value::Object(
    params
      .iter()
      .map(|(key, value)| (key.clone(), Value::String(value.clone())))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use std::{
    cell::Cell,
    rc::Rc,
  };

  use super::*;
  use crate::{
    location::{
      Location,
      MemoryLocation,
    },
    middleware::MiddlewareFlow,
  };

  fn setup(url: &str) -> (ParamStore, MemoryLocation, HistoryManager) {
    let location = MemoryLocation::new(url);
    let store = ParamStore::new(location.clone());
    let history = HistoryManager::new(&store);
    (store, location, history)
  }

  #[test]
  fn push_records_params_and_creates_native_entry() {
    let (_store, location, mut history) = setup("/page?a=1");
    location.set_title("Page");
    history.push(HistoryPush::new().with_data("scroll", 40));

    let entry = history.current().unwrap();
    assert_eq!(entry.data, json!({ "params": { "a": "1" }, "scroll": 40 }));
    assert_eq!(entry.title, "Page");
    assert_eq!(entry.url, "/page?a=1");
    assert_eq!(location.push_count(), 1);
    assert_eq!(location.len(), 2);
  }

  #[test]
  fn back_and_forward_replay_entries() {
    let (store, location, mut history) = setup("/");
    let notified = Rc::new(Cell::new(0));
    {
      let notified = notified.clone();
      store.subscribe(move |_, _| {
        notified.set(notified.get() + 1);
        Ok(())
      });
    }

    history.push(HistoryPush::new().with_url("/?step=1"));
    history.push(HistoryPush::new().with_url("/?step=2"));
    assert!(!history.forward());

    assert!(history.back());
    assert_eq!(location.search(), "?step=1");
    assert_eq!(store.get("step").as_deref(), Some("1"));
    assert!(!history.back());

    assert!(history.forward());
    assert_eq!(location.search(), "?step=2");
    assert_eq!(notified.get(), 2);
  }

  #[test]
  fn push_after_back_discards_forward_entries() {
    let (_store, _location, mut history) = setup("/");
    for step in 1..=3 {
      history.push(HistoryPush::new().with_url(format!("/?step={step}")));
    }
    history.back();
    history.back();
    history.push(HistoryPush::new().with_url("/?step=new"));

    assert_eq!(history.len(), 2);
    assert_eq!(history.index(), Some(1));
    assert!(!history.can_go_forward());
    assert_eq!(history.current().unwrap().url, "/?step=new");
  }

  #[test]
  fn empty_stack_navigation_is_a_no_op() {
    let (_store, location, mut history) = setup("/?a=1");
    assert!(!history.back());
    assert!(!history.forward());
    assert!(history.is_empty());
    assert_eq!(location.replace_count(), 0);
  }

  #[test]
  fn native_navigation_notifies_without_middleware() {
    let (store, location, mut history) = setup("/app");
    let middleware_runs = Rc::new(Cell::new(0));
    let notified = Rc::new(Cell::new(0));
    {
      let middleware_runs = middleware_runs.clone();
      store.use_middleware(move |_, _| {
        middleware_runs.set(middleware_runs.get() + 1);
        Ok(MiddlewareFlow::Continue)
      });
    }
    {
      let notified = notified.clone();
      store.subscribe(move |_, _| {
        notified.set(notified.get() + 1);
        Ok(())
      });
    }

    store.update("q", "a").unwrap();
    location.push_entry(&json!({ "params": { "q": "b" } }), "", "/app?q=b");

    let state = location.go_back();
    history.handle_navigation(state.as_ref());
    assert_eq!(location.href(), "/app?q=a");
    assert_eq!(middleware_runs.get(), 1);
    assert_eq!(notified.get(), 2);

    let state = location.go_forward();
    history.handle_navigation(state.as_ref());
    assert_eq!(store.get("q").as_deref(), Some("b"));
  }

  #[test]
  fn native_navigation_without_state_clears_params() {
    let (store, location, mut history) = setup("/app?a=1");
    history.handle_navigation(None);
    assert_eq!(location.href(), "/app");
    assert!(store.params().is_empty());
  }

  #[test]
  fn default_title_is_used_when_document_has_none() {
    let location = MemoryLocation::new("/");
    let config = crate::config::Config {
      default_title: "Untitled".into(),
      ..Default::default()
    };
    let store = ParamStore::with_config(location, config);
    let mut history = HistoryManager::new(&store);
    history.push(HistoryPush::new());
    assert_eq!(history.current().unwrap().title, "Untitled");
  }
}
