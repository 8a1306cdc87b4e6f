//! The PathStore: tree ownership, mutation commits, notification dispatch.
//!
//! A committed mutation snapshots the tree, applies the write, then runs one
//! synchronous notification round over the subscription registry. Batches
//! apply every write first and flush a single round. Dispatch never holds
//! the store borrow while a callback runs, so callbacks may call back into
//! the store (including unsubscribing themselves).

use std::cell::RefCell;
use std::rc::Rc;

use forma_path::{parse_path, Path, Seg};
use serde_json::Value;

use crate::error::{ReentrantCallback, StoreError, SubscriberError};
use crate::events::{ChangeEvent, ChangeOrigin};
use crate::mutate::{remove_at, set_at};
use crate::resolve::{is_present, value_at};
use crate::subs::{BoxError, CallbackHandle, SubscriptionRegistry};

pub use crate::subs::SubscriptionId;

type TreeHook = Rc<RefCell<Box<dyn FnMut(&Value)>>>;
type ErrorSink = Rc<RefCell<Box<dyn FnMut(SubscriberError)>>>;

// ── Options ───────────────────────────────────────────────────────────────

/// Construction-time options for [`PathStore`].
#[derive(Default)]
pub struct StoreOptions {
    /// Use full structural equality for exact-path change detection.
    ///
    /// The default (shallow) mode compares scalars by value and treats any
    /// container written over a container as changed, reproducing
    /// reference-identity semantics: a freshly supplied object or array is
    /// assumed new. Deep mode trades CPU for fewer false-positive
    /// notifications.
    pub deep_equals: bool,
    /// Invoked once per committed mutation with the full current tree.
    pub on_change: Option<Box<dyn FnMut(&Value)>>,
    /// Receives subscriber callback failures. When absent, failures are
    /// buffered and readable via [`PathStore::take_subscriber_errors`].
    pub on_subscriber_error: Option<Box<dyn FnMut(SubscriberError)>>,
}

struct StoreInner {
    tree: Value,
    baseline: Value,
    registry: SubscriptionRegistry,
    deep_equals: bool,
    on_change: Option<TreeHook>,
    on_subscriber_error: Option<ErrorSink>,
    pending_errors: Vec<SubscriberError>,
}

/// One pending callback invocation, snapshotted at flush time.
struct Planned {
    id: SubscriptionId,
    path: Path,
    callback: CallbackHandle,
    event: ChangeEvent,
}

/// Path-addressed value store with fine-grained subscriptions.
///
/// Cheap to clone: clones are handles onto the same tree and registry, so a
/// subscriber callback may retain one to read or mutate the store from
/// inside a notification. Single-threaded by design (`Rc`-based); callers
/// that share a store across logical owners serialize access through the
/// same call discipline.
///
/// # Example
///
/// ```
/// use forma_store::PathStore;
/// use serde_json::json;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let store = PathStore::new(json!({"user": {"name": "Ada"}}));
/// let hits = Rc::new(Cell::new(0));
/// let seen = hits.clone();
/// store
///     .subscribe("user.name", move |_ev| {
///         seen.set(seen.get() + 1);
///         Ok(())
///     })
///     .unwrap();
///
/// store.set("user.name", json!("Grace")).unwrap();
/// assert_eq!(store.get("user.name").unwrap(), Some(json!("Grace")));
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Clone)]
pub struct PathStore {
    inner: Rc<RefCell<StoreInner>>,
}

// ── Equality ──────────────────────────────────────────────────────────────

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Exact-path change detection for a write.
fn exact_change(old: Option<&Value>, new: &Value, deep: bool) -> bool {
    match old {
        None => true,
        Some(old) => {
            if deep {
                old != new
            } else if is_container(old) || is_container(new) {
                true
            } else {
                old != new
            }
        }
    }
}

impl PathStore {
    /// Create a store owning `initial` as its tree and baseline.
    pub fn new(initial: Value) -> Self {
        Self::with_options(initial, StoreOptions::default())
    }

    pub fn with_options(initial: Value, options: StoreOptions) -> Self {
        let inner = StoreInner {
            baseline: initial.clone(),
            tree: initial,
            registry: SubscriptionRegistry::new(),
            deep_equals: options.deep_equals,
            on_change: options.on_change.map(|f| Rc::new(RefCell::new(f))),
            on_subscriber_error: options.on_subscriber_error.map(|f| Rc::new(RefCell::new(f))),
            pending_errors: Vec::new(),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    // ── Read operations ───────────────────────────────────────────────────

    /// Read the value at `path`. Absence is `Ok(None)`, never an error.
    pub fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let path = parse_path(path)?;
        Ok(value_at(&self.inner.borrow().tree, &path))
    }

    /// Whether `path` resolves to a present node (explicit `null` counts).
    pub fn has(&self, path: &str) -> Result<bool, StoreError> {
        let path = parse_path(path)?;
        Ok(is_present(&self.inner.borrow().tree, &path))
    }

    /// Clone of the full current tree.
    pub fn tree(&self) -> Value {
        self.inner.borrow().tree.clone()
    }

    /// Number of live registrations, for tests and leak diagnostics.
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    // ── Write operations ──────────────────────────────────────────────────

    /// Replace the value at `path`, auto-vivifying missing intermediates.
    ///
    /// A write whose new value equals the old one under the configured
    /// exact-path equality is a no-op: nothing is written and nobody is
    /// notified. A committed write dispatches one notification round before
    /// returning. Failed writes leave the tree untouched.
    pub fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = parse_path(path)?;
        if let Some(before) = self.apply_set(&path, value)? {
            self.flush(&before, std::slice::from_ref(&path), ChangeOrigin::Set);
        }
        Ok(())
    }

    /// Delete the node at `path`: object keys are removed, array indices
    /// are spliced (shifting later elements left). Removing an absent node
    /// is a no-op.
    pub fn remove(&self, path: &str) -> Result<(), StoreError> {
        let path = parse_path(path)?;
        let committed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.tree.clone();
            match remove_at(&mut inner.tree, &path)? {
                Some(removal) => Some((before, removal.spliced)),
                None => None,
            }
        };
        if let Some((before, spliced)) = committed {
            // A splice reshuffles sibling indices, so the effective write
            // covers the whole array.
            let write = if spliced {
                path.parent().unwrap_or_else(Path::root)
            } else {
                path
            };
            self.flush(&before, std::slice::from_ref(&write), ChangeOrigin::Remove);
        }
        Ok(())
    }

    /// Apply every entry in iteration order as if by [`PathStore::set`],
    /// then run a single notification round in which each affected
    /// subscription fires at most once.
    ///
    /// The first failing entry aborts the batch before that entry is
    /// applied; earlier entries stay applied and are still flushed.
    pub fn set_batch<I, P>(&self, updates: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (P, Value)>,
        P: AsRef<str>,
    {
        let mut before: Option<Value> = None;
        let mut writes: Vec<Path> = Vec::new();
        let mut failure: Option<StoreError> = None;

        for (raw, value) in updates {
            let parsed = match parse_path(raw.as_ref()) {
                Ok(p) => p,
                Err(e) => {
                    failure = Some(e.into());
                    break;
                }
            };
            match self.apply_set(&parsed, value) {
                Ok(Some(snapshot)) => {
                    if before.is_none() {
                        before = Some(snapshot);
                    }
                    writes.push(parsed);
                }
                Ok(None) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let (Some(before), false) = (&before, writes.is_empty()) {
            self.flush(before, &writes, ChangeOrigin::Batch);
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Capture the current tree as the new baseline for [`PathStore::reset`].
    pub fn rebaseline(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.baseline = inner.tree.clone();
    }

    /// Restore the subtree at `path` from the baseline, then notify exactly
    /// the subscriptions whose observed value differs from before the reset.
    pub fn reset(&self, path: &str) -> Result<(), StoreError> {
        let path = parse_path(path)?;
        self.reset_inner(Some(path))
    }

    /// Restore the whole tree from the baseline.
    pub fn reset_all(&self) {
        // Whole-tree restore cannot hit a path error.
        let _ = self.reset_inner(None);
    }

    /// Force notification of every subscription at or under `path` without
    /// changing any value.
    ///
    /// Escape hatch for out-of-band mutation: the store cannot observe
    /// edits made to containers cloned out of [`PathStore::get`], so callers
    /// that re-store such a value with external changes call `refresh`.
    pub fn refresh(&self, path: &str) -> Result<(), StoreError> {
        let path = parse_path(path)?;
        self.refresh_prefix(Some(&path));
        Ok(())
    }

    /// Force notification of every subscription in the store.
    pub fn refresh_all(&self) {
        self.refresh_prefix(None);
    }

    // ── Subscriptions ─────────────────────────────────────────────────────

    /// Register a callback for changes observable at `path`.
    ///
    /// Fires when the value at `path` changes, when any descendant of
    /// `path` changes (ancestor subscriptions are coarser by construction),
    /// or, for a synthetic `length` path, when the array's element count
    /// changes. Registrations on the same path are independent and fire in
    /// registration order.
    ///
    /// The caller owns the registration: it stays live (callback retained)
    /// until [`PathStore::unsubscribe`] is called with the returned id.
    pub fn subscribe<F>(&self, path: &str, callback: F) -> Result<SubscriptionId, StoreError>
    where
        F: FnMut(&ChangeEvent) -> Result<(), BoxError> + 'static,
    {
        let path = parse_path(path)?;
        let mut inner = self.inner.borrow_mut();
        Ok(inner.registry.insert(path, Box::new(callback)))
    }

    /// Remove a registration. Idempotent: repeated calls return `false` and
    /// remove nothing. Unsubscribing during a notification round takes
    /// effect starting with the next round.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().registry.remove(id)
    }

    /// Drain subscriber failures buffered since the last call (only
    /// populated when no `on_subscriber_error` sink is configured).
    pub fn take_subscriber_errors(&self) -> Vec<SubscriberError> {
        std::mem::take(&mut self.inner.borrow_mut().pending_errors)
    }

    // ── Commit pipeline ───────────────────────────────────────────────────

    /// Validate and apply one write. Returns the pre-write tree snapshot
    /// when the write committed, `None` for a no-op.
    fn apply_set(&self, path: &Path, value: Value) -> Result<Option<Value>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        let old = value_at(&inner.tree, path);
        if !exact_change(old.as_ref(), &value, inner.deep_equals) {
            return Ok(None);
        }
        let before = inner.tree.clone();
        if let Err(e) = set_at(&mut inner.tree, path, value) {
            inner.tree = before;
            return Err(e);
        }
        Ok(Some(before))
    }

    fn reset_inner(&self, path: Option<Path>) -> Result<(), StoreError> {
        let before = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.tree.clone();
            match &path {
                None => {
                    inner.tree = inner.baseline.clone();
                }
                Some(p) => {
                    if matches!(p.last(), Some(Seg::Length)) {
                        return Err(StoreError::InvalidTarget { path: p.clone() });
                    }
                    match value_at(&inner.baseline, p) {
                        Some(baseline_value) => {
                            if let Err(e) = set_at(&mut inner.tree, p, baseline_value) {
                                inner.tree = before;
                                return Err(e);
                            }
                        }
                        None => {
                            if let Err(e) = remove_at(&mut inner.tree, p) {
                                inner.tree = before;
                                return Err(e);
                            }
                        }
                    }
                }
            }
            if inner.tree == before {
                None
            } else {
                Some(before)
            }
        };
        if let Some(before) = before {
            self.flush_compare_all(&before, ChangeOrigin::Reset);
        }
        Ok(())
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// One notification round for the given committed writes.
    fn flush(&self, before: &Value, writes: &[Path], origin: ChangeOrigin) {
        // Length writes target the array they resize.
        let writes: Vec<Path> = writes.iter().map(|w| w.data_prefix()).collect();
        let planned = {
            let inner = self.inner.borrow();
            let after = &inner.tree;
            let mut planned = Vec::new();
            for (id, sub) in inner.registry.iter() {
                if let Some(event) = plan_event(before, after, &sub.path, &writes, origin) {
                    planned.push(Planned {
                        id: *id,
                        path: sub.path.clone(),
                        callback: sub.callback.clone(),
                        event,
                    });
                }
            }
            planned
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "forma_store",
            origin = ?origin,
            writes = writes.len(),
            notified = planned.len(),
            "flush"
        );
        self.deliver(planned);
        self.emit_tree_changed();
    }

    /// Notification round that fires every subscription whose observed
    /// value differs structurally between `before` and the current tree.
    fn flush_compare_all(&self, before: &Value, origin: ChangeOrigin) {
        let planned = {
            let inner = self.inner.borrow();
            let after = &inner.tree;
            let mut planned = Vec::new();
            for (id, sub) in inner.registry.iter() {
                let old = value_at(before, &sub.path);
                let new = value_at(after, &sub.path);
                if old != new {
                    planned.push(Planned {
                        id: *id,
                        path: sub.path.clone(),
                        callback: sub.callback.clone(),
                        event: ChangeEvent {
                            path: sub.path.clone(),
                            before: old,
                            after: new,
                            origin,
                        },
                    });
                }
            }
            planned
        };
        self.deliver(planned);
        self.emit_tree_changed();
    }

    fn refresh_prefix(&self, prefix: Option<&Path>) {
        let planned = {
            let inner = self.inner.borrow();
            let after = &inner.tree;
            let mut planned = Vec::new();
            for (id, sub) in inner.registry.iter() {
                let covered = match prefix {
                    None => true,
                    Some(p) => p.is_prefix_of(&sub.path),
                };
                if covered {
                    let current = value_at(after, &sub.path);
                    planned.push(Planned {
                        id: *id,
                        path: sub.path.clone(),
                        callback: sub.callback.clone(),
                        event: ChangeEvent {
                            path: sub.path.clone(),
                            before: current.clone(),
                            after: current,
                            origin: ChangeOrigin::Refresh,
                        },
                    });
                }
            }
            planned
        };
        self.deliver(planned);
    }

    /// Invoke the planned callbacks with no store borrow held.
    fn deliver(&self, planned: Vec<Planned>) {
        for entry in planned {
            match entry.callback.try_borrow_mut() {
                Ok(mut callback) => {
                    if let Err(source) = callback(&entry.event) {
                        self.report_subscriber_error(SubscriberError {
                            id: entry.id,
                            path: entry.path,
                            source,
                        });
                    }
                }
                // The callback is already executing further up the stack.
                Err(_) => {
                    self.report_subscriber_error(SubscriberError {
                        id: entry.id,
                        path: entry.path,
                        source: Box::new(ReentrantCallback),
                    });
                }
            }
        }
    }

    fn report_subscriber_error(&self, err: SubscriberError) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "forma_store",
            id = %err.id,
            path = %err.path,
            error = %err.source,
            "subscriber callback failed"
        );
        let sink = self.inner.borrow().on_subscriber_error.clone();
        match sink {
            Some(sink) => match sink.try_borrow_mut() {
                Ok(mut f) => f(err),
                Err(_) => self.inner.borrow_mut().pending_errors.push(err),
            },
            None => self.inner.borrow_mut().pending_errors.push(err),
        }
    }

    fn emit_tree_changed(&self) {
        let hook_and_tree = {
            let inner = self.inner.borrow();
            inner
                .on_change
                .as_ref()
                .map(|hook| (hook.clone(), inner.tree.clone()))
        };
        if let Some((hook, tree)) = hook_and_tree {
            if let Ok(mut f) = hook.try_borrow_mut() {
                f(&tree);
            }
        }
    }
}

/// Decide whether the subscription on `q` is affected by this round, and
/// build its event if so.
///
/// - `q` equal to a write, or an ancestor of one: affected (a committed
///   write always changed its exact value, and ancestors are coarser by
///   construction).
/// - `q` a strict descendant of a write: affected iff the value at `q`
///   differs structurally between the snapshots (path identity, not value
///   identity: replacing an array re-evaluates `items.0` against the new
///   array).
/// - `q` a synthetic length path: affected iff the observed count differs.
fn plan_event(
    before: &Value,
    after: &Value,
    q: &Path,
    writes: &[Path],
    origin: ChangeOrigin,
) -> Option<ChangeEvent> {
    if q.is_length() {
        let old = value_at(before, q);
        let new = value_at(after, q);
        if old != new {
            return Some(ChangeEvent {
                path: q.clone(),
                before: old,
                after: new,
                origin,
            });
        }
        return None;
    }
    for write in writes {
        let affected = if write.is_prefix_of(q) {
            write.len() == q.len() || value_at(before, q) != value_at(after, q)
        } else {
            q.is_prefix_of(write)
        };
        if affected {
            return Some(ChangeEvent {
                path: q.clone(),
                before: value_at(before, q),
                after: value_at(after, q),
                origin,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_change_shallow() {
        // Scalars compare by value.
        assert!(!exact_change(Some(&json!(1)), &json!(1), false));
        assert!(exact_change(Some(&json!(1)), &json!(2), false));
        // Containers are always treated as changed.
        assert!(exact_change(Some(&json!({"a": 1})), &json!({"a": 1}), false));
        assert!(exact_change(Some(&json!([1])), &json!([1]), false));
        // Absence is always a change.
        assert!(exact_change(None, &json!(null), false));
    }

    #[test]
    fn test_exact_change_deep() {
        assert!(!exact_change(
            Some(&json!({"a": 1})),
            &json!({"a": 1}),
            true
        ));
        assert!(exact_change(Some(&json!({"a": 1})), &json!({"a": 2}), true));
    }

    #[test]
    fn test_plan_event_unrelated_path_not_affected() {
        let before = json!({"a": {"b": {"c": 1, "d": 2}}});
        let after = json!({"a": {"b": {"c": 9, "d": 2}}});
        let write = forma_path::parse_path("a.b.c").unwrap();
        let writes = vec![write];

        let q = forma_path::parse_path("a.b.d").unwrap();
        assert!(plan_event(&before, &after, &q, &writes, ChangeOrigin::Set).is_none());

        let q = forma_path::parse_path("a.b").unwrap();
        assert!(plan_event(&before, &after, &q, &writes, ChangeOrigin::Set).is_some());
    }

    #[test]
    fn test_plan_event_descendant_compares_values() {
        let before = json!({"items": ["A", "B"]});
        let after = json!({"items": ["B", "B"]});
        let writes = vec![forma_path::parse_path("items").unwrap()];

        let changed = forma_path::parse_path("items.0").unwrap();
        let ev = plan_event(&before, &after, &changed, &writes, ChangeOrigin::Set).unwrap();
        assert_eq!(ev.before, Some(json!("A")));
        assert_eq!(ev.after, Some(json!("B")));

        let unchanged = forma_path::parse_path("items.1").unwrap();
        assert!(plan_event(&before, &after, &unchanged, &writes, ChangeOrigin::Set).is_none());
    }
}
