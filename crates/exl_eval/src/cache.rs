//! Per-call-site inline cache.
//!
//! The tree stays immutable; resolved handles live in this side table keyed
//! by the call node. Concurrent evaluations of one program may overwrite
//! each other's entries. Any stored handle is a valid resolution for its
//! node, so the last writer wins.

use dashmap::DashMap;
use exl_ir::NodeId;
use rustc_hash::FxBuildHasher;

use crate::introspect::CachedHandle;

#[derive(Debug, Default)]
pub struct CallSiteCache {
    slots: DashMap<NodeId, CachedHandle, FxBuildHasher>,
}

impl CallSiteCache {
    pub fn new() -> Self {
        CallSiteCache::default()
    }

    pub fn get(&self, node: NodeId) -> Option<CachedHandle> {
        self.slots.get(&node).map(|slot| slot.value().clone())
    }

    pub fn store(&self, node: NodeId, handle: CachedHandle) {
        self.slots.insert(node, handle);
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
