//! Refcounted discovery handles and the singly-linked list entry type (spec §3
//! "Discovery handles", §9 "Refcounted handles with optional caches").
//!
//! The logical reference count is tracked explicitly (an [`AtomicUsize`] alongside the
//! payload) rather than relying purely on `Arc`'s implicit strong count, because the
//! spec's contract (§4.C "ref / unref... on unref, if the count reaches 0, free;
//! return a null handle. Otherwise return the same handle") is itself an observable,
//! testable API rather than an incidental detail of Rust ownership. `Arc` still owns
//! the actual deallocation; the counter models the C-visible refcount consumers poll.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::node::NodeVariant;

/// Wraps a payload with an explicit, atomically-updated logical refcount.
pub struct RefCounted<T> {
    count: AtomicUsize,
    pub value: T,
}

impl<T> RefCounted<T> {
    pub fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(1),
            value,
        })
    }

    /// Current logical refcount (for tests/diagnostics only).
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// spec §4.C "ref": atomic increment, returns a new handle to the same object.
    pub fn bump_ref(self: &Arc<Self>) -> Arc<Self> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Arc::clone(self)
    }

    /// spec §4.C "unref": atomic decrement; `None` once the count reaches zero
    /// (freeing the handle), `Some` with the same handle otherwise.
    pub fn bump_unref(self: Arc<Self>) -> Option<Arc<Self>> {
        let prev = self.count.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev >= 1, "refcount must never go negative");
        if prev == 1 {
            None
        } else {
            Some(self)
        }
    }
}

/// spec §3 "Context handle: reference-counted; owns no memory-bound resources beyond
/// itself." Triggers the table build (via [`crate::discovery::table::table`]) the
/// first time it's constructed, but holds nothing else.
pub struct ContextState;

pub type ContextHandle = Arc<RefCounted<ContextState>>;

pub fn new_context() -> ContextHandle {
    // Ensures the table is built before any query can run against this context
    // (spec §5: "happen-before any query call that observes it").
    let _ = crate::discovery::table::table();
    RefCounted::new(ContextState)
}

/// One node of the singly-linked, insertion-ordered `(name, optional value)` list
/// returned by property/sysattr/devlinks/enumeration queries (spec §3 "List entry").
pub struct ListEntry {
    pub name: String,
    pub value: Option<String>,
    pub next: Option<Arc<ListEntry>>,
}

/// Builds a list from `items` in order; `items[0]` becomes the head.
pub fn build_list(items: &[(String, Option<String>)]) -> Option<Arc<ListEntry>> {
    let mut next = None;
    for (name, value) in items.iter().rev() {
        next = Some(Arc::new(ListEntry {
            name: name.clone(),
            value: value.clone(),
            next,
        }));
    }
    next
}

/// spec §3 "Device handle: exclusively owns an optional cached property list; shares
/// (via reference count) the context handle."
pub struct DeviceState {
    pub node_idx: usize,
    pub variant: NodeVariant,
    pub slot: usize,
    pub context: ContextHandle,
    pub cached_properties: RefCell<Option<Arc<ListEntry>>>,
}

pub type DeviceHandle = Arc<RefCounted<DeviceState>>;

pub fn new_device(context: &ContextHandle, node_idx: usize, variant: NodeVariant, slot: usize) -> DeviceHandle {
    RefCounted::new(DeviceState {
        node_idx,
        variant,
        slot,
        context: context.bump_ref(),
        cached_properties: RefCell::new(None),
    })
}

/// Mutable half of an enumeration handle: filters accumulate via `add_match_*` calls
/// and the result list is replaced wholesale by `scan_devices`/`scan_subsystems`.
#[derive(Default)]
pub struct EnumerateMutable {
    pub scan_input: bool,
    pub sysname_pattern: Option<String>,
    pub property_filters: Vec<(String, Option<String>)>,
    pub results: Option<Arc<ListEntry>>,
}

/// spec §3 "Enumeration handle: exclusively owns (a) the current result list ... and
/// (b) the list of active property filters."
pub struct EnumerateState {
    pub context: ContextHandle,
    pub mutable: RefCell<EnumerateMutable>,
}

pub type EnumerateHandle = Arc<RefCounted<EnumerateState>>;

pub fn new_enumerate(context: &ContextHandle) -> EnumerateHandle {
    RefCounted::new(EnumerateState {
        context: context.bump_ref(),
        mutable: RefCell::new(EnumerateMutable::default()),
    })
}

/// spec §3 "Monitor handle: opaque placeholder" / "Queue handle: opaque placeholder".
pub struct MonitorState;
pub type MonitorHandle = Arc<RefCounted<MonitorState>>;
pub fn new_monitor() -> MonitorHandle {
    RefCounted::new(MonitorState)
}

pub struct QueueState;
pub type QueueHandle = Arc<RefCounted<QueueState>>;
pub fn new_queue() -> QueueHandle {
    RefCounted::new(QueueState)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_then_unref_is_a_no_op_on_count() {
        let ctx = new_context();
        assert_eq!(ctx.count(), 1);
        let ctx2 = ctx.bump_ref();
        assert_eq!(ctx.count(), 2);
        let ctx2 = ctx2.bump_unref();
        assert!(ctx2.is_some());
        assert_eq!(ctx.count(), 1);
    }

    #[test]
    fn final_unref_frees_and_returns_none() {
        let ctx = new_context();
        assert!(ctx.bump_unref().is_none());
    }

    #[test]
    fn device_handle_holds_a_strong_ref_to_its_context() {
        let ctx = new_context();
        assert_eq!(ctx.count(), 1);
        let dev = new_device(&ctx, 0, NodeVariant::Js, 0);
        assert_eq!(ctx.count(), 2);
        drop(dev);
        // Dropping the Arc doesn't decrement the logical counter (that's `bump_unref`'s
        // job) -- only an explicit unref does, matching the C-visible contract.
        assert_eq!(ctx.count(), 2);
    }

    #[test]
    fn list_building_preserves_insertion_order() {
        let items = vec![
            ("a".to_string(), Some("1".to_string())),
            ("b".to_string(), None),
        ];
        let head = build_list(&items).unwrap();
        assert_eq!(head.name, "a");
        assert_eq!(head.value.as_deref(), Some("1"));
        let next = head.next.as_ref().unwrap();
        assert_eq!(next.name, "b");
        assert_eq!(next.value, None);
        assert!(next.next.is_none());
    }

    #[test]
    fn empty_list_has_no_head() {
        assert!(build_list(&[]).is_none());
    }
}
