//! Change events delivered to subscribers.

use forma_path::Path;
use serde_json::Value;

/// Which store operation committed the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Set,
    Remove,
    Batch,
    Refresh,
    Reset,
}

/// One notification delivered to one subscriber.
///
/// `path` is the subscriber's own path, not the written path. For synthetic
/// length subscriptions, `before` and `after` carry the old and new element
/// counts as JSON numbers. `None` means the path did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub path: Path,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub origin: ChangeOrigin,
}
