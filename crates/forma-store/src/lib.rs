//! Path-addressed value store with fine-grained subscriptions.
//!
//! A [`PathStore`] owns a JSON-shaped value tree addressable by dot-notation
//! paths (`user.profile.name`, `todos.0.completed`). Subscribers register on
//! a path and are notified synchronously when the value observable at that
//! path changes:
//!
//! - an exact-path subscriber fires when its own value changes,
//! - an ancestor subscriber fires whenever any descendant changes,
//! - a synthetic `length` subscriber (`todos.length`) fires only when the
//!   array's element count changes, never on element content edits.
//!
//! Multi-path writes go through [`PathStore::set_batch`], which applies all
//! writes first and then runs a single notification round in which each
//! affected subscription fires at most once.
//!
//! # Example
//!
//! ```
//! use forma_store::PathStore;
//! use serde_json::json;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let store = PathStore::new(json!({"todos": [{"done": false}]}));
//!
//! let count_changes = Rc::new(Cell::new(0));
//! let hits = count_changes.clone();
//! store
//!     .subscribe("todos.length", move |_ev| {
//!         hits.set(hits.get() + 1);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! // Content edit: the length subscriber stays quiet.
//! store.set("todos.0.done", json!(true)).unwrap();
//! assert_eq!(count_changes.get(), 0);
//!
//! // Growing the array fires it exactly once.
//! store.set("todos.1", json!({"done": false})).unwrap();
//! assert_eq!(count_changes.get(), 1);
//! ```

pub mod error;
pub mod events;
mod mutate;
mod registry;
mod resolve;
mod store;
mod subs;

pub use error::{StoreError, SubscriberError};
pub use events::{ChangeEvent, ChangeOrigin};
pub use forma_path::{parse_path, Path, PathError, Seg};
pub use registry::StoreRegistry;
pub use store::{PathStore, StoreOptions, SubscriptionId};
pub use subs::BoxError;

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
