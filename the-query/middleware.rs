//! Interceptors run after every committed write, in registration order.
//!
//! Each middleware decides whether the rest of the chain runs by returning
//! [`MiddlewareFlow::Continue`] or [`MiddlewareFlow::Stop`]. Middleware
//! affects state only through side effects, typically by writing through the
//! store it is handed. A middleware that writes unconditionally will recurse
//! until the store's depth limit rejects the write, so guard on the current
//! value first:
//!
//! ```
//! use the_query::{MemoryLocation, MiddlewareFlow, ParamStore};
//!
//! let store = ParamStore::new(MemoryLocation::new("/?minPrice=50&maxPrice=10"));
//! store.use_middleware(|store, params| {
//!   let min = params.get("minPrice").and_then(|v| v.parse::<f64>().ok());
//!   let max = params.get("maxPrice").and_then(|v| v.parse::<f64>().ok());
//!   if let (Some(min), Some(max)) = (min, max)
//!     && min > max
//!   {
//!     store.update("minPrice", max)?;
//!   }
//!   Ok(MiddlewareFlow::Continue)
//! });
//!
//! store.update("page", 1).unwrap();
//! assert_eq!(store.get("minPrice").as_deref(), Some("10"));
//! ```

use std::{
  cell::RefCell,
  rc::Rc,
};

use crate::{
  error::Result,
  store::ParamStore,
  value::ParamMap,
};

/// Whether the remaining middleware should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MiddlewareFlow {
  /// Run the next middleware.
  #[default]
  Continue,
  /// Skip every later middleware for this write.
  Stop,
}

pub type MiddlewareFn = Rc<dyn Fn(&ParamStore, &ParamMap) -> Result<MiddlewareFlow>>;

#[derive(Default)]
pub(crate) struct MiddlewareChain {
  entries: RefCell<Vec<MiddlewareFn>>,
}

impl MiddlewareChain {
  pub(crate) fn push(&self, middleware: MiddlewareFn) {
    self.entries.borrow_mut().push(middleware);
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.borrow().len()
  }

  /// Run the chain for one write. Entries registered while the chain runs
  /// take effect from the next write.
  pub(crate) fn execute(&self, store: &ParamStore, params: &ParamMap) {
    let entries = self.entries.borrow().clone();
    for (index, middleware) in entries.iter().enumerate() {
      match middleware(store, params) {
        Ok(MiddlewareFlow::Continue) => {},
        Ok(MiddlewareFlow::Stop) => {
          tracing::debug!(index, "middleware stopped the chain");
          break;
        },
        Err(err) => {
          tracing::warn!(%err, index, "middleware failed");
        },
      }
    }
  }
}

impl ParamStore {
  /// Append `middleware` to the chain. It stays registered for the lifetime
  /// of the store.
  pub fn use_middleware<F>(&self, middleware: F)
  where
    F: Fn(&ParamStore, &ParamMap) -> Result<MiddlewareFlow> + 'static,
  {
    self.middleware().push(Rc::new(middleware));
  }

  pub fn middleware_count(&self) -> usize {
    self.middleware().len()
  }
}
