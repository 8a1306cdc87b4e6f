//! Subscription registry: identity-keyed, insertion-ordered.
//!
//! The notification contract requires that subscribers on the same path fire
//! in registration order, so the registry is an `IndexMap` and removal uses
//! `shift_remove` to preserve the order of the survivors.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use forma_path::Path;
use indexmap::IndexMap;

use crate::events::ChangeEvent;

/// Error type subscriber callbacks may return.
pub type BoxError = Box<dyn std::error::Error>;

pub(crate) type CallbackFn = dyn FnMut(&ChangeEvent) -> Result<(), BoxError>;

/// Shared handle to one callback. Dispatch clones the handle and invokes the
/// callback after releasing the registry borrow, so callbacks may call back
/// into the store.
pub(crate) type CallbackHandle = Rc<RefCell<Box<CallbackFn>>>;

/// Identity of one registration. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[cfg(test)]
    pub(crate) fn for_tests(raw: u64) -> Self {
        SubscriptionId(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct Subscriber {
    pub(crate) path: Path,
    pub(crate) callback: CallbackHandle,
}

pub(crate) struct SubscriptionRegistry {
    next_id: u64,
    entries: IndexMap<SubscriptionId, Subscriber>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, path: Path, callback: Box<CallbackFn>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.insert(
            id,
            Subscriber {
                path,
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        id
    }

    /// Remove a registration. Idempotent: a second call returns `false`.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        self.entries.shift_remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&SubscriptionId, &Subscriber)> {
        self.entries.iter()
    }
}
