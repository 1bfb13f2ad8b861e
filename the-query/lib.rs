//! # the-query
//!
//! Read, mutate and observe a page's query-string state.
//!
//! A [`ParamStore`] wraps the host's address bar (anything implementing
//! [`Location`]) and owns the registries that react to it:
//!
//! - **Validation** runs before any change is applied.
//! - **Middleware** runs synchronously after every write, in registration
//!   order, and may stop the rest of the chain.
//! - **Subscribers** are notified after middleware with a fresh read of the
//!   parameters.
//! - **Transactions** batch edits into one write.
//! - **Presets** are named snapshots merged back in on demand.
//!
//! [`HistoryManager`] adds programmatic back/forward on top, and
//! [`serialize_object`] packs structured values into a single parameter.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use the_query::{MemoryLocation, ParamStore};
//!
//! let location = MemoryLocation::new("/search");
//! let store = ParamStore::new(location.clone());
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let subscription = store.subscribe(move |_, params| {
//!   log.borrow_mut().push(params.clone());
//!   Ok(())
//! });
//!
//! store.update("name", "john")?;
//! store.update("tags", ["one", "two"])?;
//! assert_eq!(location.href(), "/search?name=john&tags=one%252Ctwo");
//! assert_eq!(store.get_array("tags"), vec!["one", "two"]);
//! assert_eq!(seen.borrow().len(), 2);
//!
//! subscription.unsubscribe();
//! store.clear_all()?;
//! assert_eq!(location.href(), "/search");
//! # Ok::<(), the_query::QueryError>(())
//! ```
//!
//! Everything is single-threaded and synchronous. Callbacks may write back
//! into the store; see [`store`] for how nested writes are ordered.

pub mod codec;
pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod middleware;
mod presets;
pub mod serialize;
pub mod store;
pub mod subscriber;
pub mod transaction;
pub mod validator;
pub mod value;

pub use config::{
  Config,
  ConfigError,
};
pub use error::{
  QueryError,
  Result,
};
pub use history::{
  HistoryEntry,
  HistoryManager,
  HistoryPush,
};
pub use location::{
  EntryState,
  Location,
  MemoryLocation,
};
pub use middleware::{
  MiddlewareFlow,
  MiddlewareFn,
};
pub use serialize::{
  deserialize_object,
  serialize_object,
};
pub use store::ParamStore;
pub use subscriber::{
  SubscriberFn,
  SubscriberId,
  Subscription,
};
pub use transaction::Transaction;
pub use validator::{
  ValidationRule,
  ValidationRules,
  validate_input,
  validate_params,
};
pub use value::{
  ParamMap,
  QueryUpdate,
  QueryValue,
  TypedParam,
};
