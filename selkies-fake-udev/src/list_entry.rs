//! `udev_list_entry` as seen from C: a `name`/`value` pair plus a `get_next` walk.
//!
//! Built lazily, one node at a time, from the `Arc<ListEntry>` chain `virtpad_core`
//! hands back -- each node is boxed and leaked the moment a caller asks for it via
//! `udev_list_entry_get_next`, matching the same leak-for-process-lifetime tradeoff
//! as [`crate::strings::leak_cstring`].

use std::ffi::{c_char, CString};
use std::sync::Arc;

use virtpad_core::discovery::handle::ListEntry;

pub struct UdevListEntry {
    node: Arc<ListEntry>,
    name_c: CString,
    value_c: Option<CString>,
}

impl UdevListEntry {
    fn boxed(node: Arc<ListEntry>) -> Box<Self> {
        let name_c = CString::new(node.name.clone()).unwrap_or_default();
        let value_c = node.value.clone().and_then(|v| CString::new(v).ok());
        Box::new(UdevListEntry { node, name_c, value_c })
    }

    pub fn name_ptr(&self) -> *const c_char {
        self.name_c.as_ptr()
    }

    pub fn value_ptr(&self) -> *const c_char {
        self.value_c.as_ref().map(|c| c.as_ptr()).unwrap_or(std::ptr::null())
    }

    pub fn next_raw(&self) -> *mut UdevListEntry {
        match &self.node.next {
            Some(next) => Box::into_raw(Self::boxed(Arc::clone(next))),
            None => std::ptr::null_mut(),
        }
    }
}

pub fn list_chain_to_raw(head: Option<Arc<ListEntry>>) -> *mut UdevListEntry {
    match head {
        Some(node) => Box::into_raw(UdevListEntry::boxed(node)),
        None => std::ptr::null_mut(),
    }
}
