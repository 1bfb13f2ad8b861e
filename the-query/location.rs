//! Address-bar abstraction.
//!
//! The crate only defines the interface. Hosts provide the real
//! implementation (a browser binding, a webview bridge). [`MemoryLocation`]
//! covers tests and headless use.

use std::{
  cell::RefCell,
  rc::Rc,
};

use serde_json::Value;

/// State object attached to a navigation entry.
pub type EntryState = Value;

/// Capability surface over the host's location and session history.
pub trait Location {
  /// Path component, e.g. `/search`.
  fn pathname(&self) -> String;
  /// Query component including the leading `?`, or empty.
  fn search(&self) -> String;
  /// Current document title.
  fn title(&self) -> String {
    String::new()
  }
  /// Overwrite the current navigation entry.
  fn replace_entry(&self, state: &EntryState, title: &str, url: &str);
  /// Append a navigation entry, discarding any forward entries.
  fn push_entry(&self, state: &EntryState, title: &str, url: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
  pub state: EntryState,
  pub title: String,
  pub url:   String,
}

#[derive(Debug)]
struct MemoryInner {
  pathname: String,
  search:   String,
  title:    String,
  entries:  Vec<MemoryEntry>,
  index:    usize,
  replaced: usize,
  pushed:   usize,
}

/// In-memory session history. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryLocation {
  inner: Rc<RefCell<MemoryInner>>,
}

impl Default for MemoryLocation {
  fn default() -> Self {
    Self::new("/")
  }
}

impl MemoryLocation {
  /// Start with a single entry at `url` (path plus optional query).
  pub fn new(url: &str) -> Self {
    let (pathname, search) = split_url(url);
    let entry = MemoryEntry {
      state: Value::Null,
      title: String::new(),
      url:   format!("{pathname}{search}"),
    };
    Self {
      inner: Rc::new(RefCell::new(MemoryInner {
        pathname,
        search,
        title: String::new(),
        entries: vec![entry],
        index: 0,
        replaced: 0,
        pushed: 0,
      })),
    }
  }

  pub fn href(&self) -> String {
    let inner = self.inner.borrow();
    format!("{}{}", inner.pathname, inner.search)
  }

  pub fn set_title(&self, title: impl Into<String>) {
    self.inner.borrow_mut().title = title.into();
  }

  /// Number of native entries.
  pub fn len(&self) -> usize {
    self.inner.borrow().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.borrow().entries.is_empty()
  }

  pub fn index(&self) -> usize {
    self.inner.borrow().index
  }

  pub fn current_entry(&self) -> MemoryEntry {
    let inner = self.inner.borrow();
    inner.entries[inner.index].clone()
  }

  /// How many times `replace_entry` ran.
  pub fn replace_count(&self) -> usize {
    self.inner.borrow().replaced
  }

  /// How many times `push_entry` ran.
  pub fn push_count(&self) -> usize {
    self.inner.borrow().pushed
  }

  /// Native back navigation. Returns the state a host would deliver with
  /// the navigation event, or `None` at the first entry.
  pub fn go_back(&self) -> Option<EntryState> {
    self.go(-1)
  }

  /// Native forward navigation. See [`MemoryLocation::go_back`].
  pub fn go_forward(&self) -> Option<EntryState> {
    self.go(1)
  }

  fn go(&self, delta: isize) -> Option<EntryState> {
    let mut inner = self.inner.borrow_mut();
    let target = inner.index.checked_add_signed(delta)?;
    let entry = inner.entries.get(target)?.clone();
    inner.index = target;
    let (pathname, search) = split_url(&entry.url);
    inner.pathname = pathname;
    inner.search = search;
    Some(entry.state)
  }
}

impl Location for MemoryLocation {
  fn pathname(&self) -> String {
    self.inner.borrow().pathname.clone()
  }

  fn search(&self) -> String {
    self.inner.borrow().search.clone()
  }

  fn title(&self) -> String {
    self.inner.borrow().title.clone()
  }

  fn replace_entry(&self, state: &EntryState, title: &str, url: &str) {
    let mut inner = self.inner.borrow_mut();
    let (pathname, search) = split_url(url);
    let index = inner.index;
    inner.entries[index] = MemoryEntry {
      state: state.clone(),
      title: title.to_owned(),
      url:   format!("{pathname}{search}"),
    };
    inner.pathname = pathname;
    inner.search = search;
    inner.replaced += 1;
  }

  fn push_entry(&self, state: &EntryState, title: &str, url: &str) {
    let mut inner = self.inner.borrow_mut();
    let (pathname, search) = split_url(url);
    let next = inner.index + 1;
    inner.entries.truncate(next);
    inner.entries.push(MemoryEntry {
      state: state.clone(),
      title: title.to_owned(),
      url:   format!("{pathname}{search}"),
    });
    inner.index = next;
    inner.pathname = pathname;
    inner.search = search;
    inner.pushed += 1;
  }
}

/// Split a relative or absolute URL into `(pathname, search)`. The fragment
/// is dropped.
fn split_url(url: &str) -> (String, String) {
  if let Ok(parsed) = url::Url::parse(url) {
    let search = parsed
      .query()
      .filter(|q| !q.is_empty())
      .map(|q| format!("?{q}"))
      .unwrap_or_default();
    return (parsed.path().to_owned(), search);
  }

  let url = url.split('#').next().unwrap_or_default();
  let (pathname, query) = url.split_once('?').unwrap_or((url, ""));
  let pathname = if pathname.is_empty() { "/" } else { pathname };
  let search = if query.is_empty() {
    String::new()
  } else {
    format!("?{query}")
  };
  (pathname.to_owned(), search)
}
