//! §4.5: the RIB — a thin, locked wrapper around one [`Trie`] that attaches
//! route metadata and the public API surface.

use log::{debug, trace};
use parking_lot::RwLock;

use crate::error::RibError;
use crate::key::Key;
use crate::mask::MaskStore;
use crate::route::{Flags, RouteEntry, RouteId, RouteInfo, RouteSpec};
use crate::stats::StatsSnapshot;
use crate::trie::{Trie, WalkDirective as TrieWalkDirective};

/// Directive a [`Rib::route_walk`] visitor returns to keep going or stop
/// early. Public counterpart of the trie-internal directive of the same
/// shape.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WalkDirective {
    Continue,
    Stop,
}

/// Parameters for [`Rib::create`] (§4.5's `route_table_create`). `family` and
/// `fibnum` are opaque scalars the core stores but never interprets (§3);
/// `initial_capacity` sizes the leaf/branching arenas' backing `Vec`s up
/// front instead of growing them one reallocation at a time.
#[derive(Copy, Clone, Debug)]
pub struct RibConfig {
    pub family: u16,
    pub fibnum: u32,
    pub initial_capacity: usize,
}

impl Default for RibConfig {
    fn default() -> Self {
        RibConfig { family: crate::sockaddr::AF_INET as u16, fibnum: 0, initial_capacity: 0 }
    }
}

struct Inner {
    trie: Trie,
    masks: MaskStore,
    routes: Vec<Option<RouteEntry>>,
    routes_free: Vec<u32>,
    stats: crate::stats::Stats,
}

impl Inner {
    fn alloc_route(&mut self, entry: RouteEntry) -> RouteId {
        if let Some(idx) = self.routes_free.pop() {
            self.routes[idx as usize] = Some(entry);
            RouteId(idx)
        } else {
            self.routes.push(Some(entry));
            RouteId(self.routes.len() as u32 - 1)
        }
    }

    fn free_route(&mut self, id: RouteId) -> RouteEntry {
        let entry = self.routes[id.0 as usize].take().expect("dangling route id");
        self.routes_free.push(id.0);
        entry
    }

    fn route(&self, id: RouteId) -> &RouteEntry {
        self.routes[id.0 as usize].as_ref().expect("dangling route id")
    }
}

/// Routing information base: one [`Trie`] plus its route storage, mask
/// store, and statistics, guarded by a single reader-preferred lock (§5).
pub struct Rib {
    inner: RwLock<Inner>,
    family: u16,
    fibnum: u32,
}

fn validate(dst: &[u8], mask: Option<&[u8]>) -> Result<(), RibError> {
    if dst.is_empty() {
        return Err(RibError::InvalidArgument);
    }
    if let Some(m) = mask {
        if m.len() != dst.len() {
            return Err(RibError::InvalidArgument);
        }
    }
    Ok(())
}

impl Rib {
    /// §4.5 `route_table_create`.
    pub fn create(config: RibConfig) -> Self {
        debug!("creating RIB: family={} fibnum={}", config.family, config.fibnum);
        Rib {
            inner: RwLock::new(Inner {
                trie: Trie::new(),
                masks: MaskStore::new(),
                routes: Vec::with_capacity(config.initial_capacity),
                routes_free: Vec::new(),
                stats: crate::stats::Stats::default(),
            }),
            family: config.family,
            fibnum: config.fibnum,
        }
    }

    /// §4.5 `route_table_destroy`: consumes the handle, walking the trie to
    /// free every [`RouteEntry`] as it goes. In safe Rust this is just
    /// ordinary drop glue, but the explicit method mirrors the spec's
    /// lifecycle call and is the place a caller would hook teardown logging.
    pub fn destroy(self) {
        let nodes = self.inner.read().trie.route_count();
        debug!("destroying RIB: family={} fibnum={} nodes={}", self.family, self.fibnum, nodes);
    }

    /// §4.5 `route_add`.
    pub fn route_add(&self, spec: RouteSpec) -> Result<(), RibError> {
        validate(&spec.dst, spec.mask.as_deref())?;
        let dst_key = Key::from_payload(&spec.dst);
        let mask_key = spec.mask.as_ref().map(|m| Key::from_payload(m));
        let network = match &mask_key {
            Some(m) => dst_key.view().apply_mask(&m.view()),
            None => dst_key.clone(),
        };

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let entry = RouteEntry {
            dst: network.clone(),
            mask: mask_key.clone().unwrap_or_else(|| Key::host_mask(spec.dst.len())),
            gateway: spec.gateway.clone().into_boxed_slice(),
            flags: spec.flags,
            ifindex: spec.ifindex,
            fibnum: spec.fibnum,
        };
        let route_id = inner.alloc_route(entry);

        let mask_view = mask_key.as_ref().map(|m| m.view());
        let result = inner.trie.add(&mut inner.masks, &network.view(), mask_view.as_ref(), route_id);
        match result {
            Ok(_) => {
                inner.stats.record_add();
                trace!("route_add ok: nodes={}", inner.trie.route_count());
                Ok(())
            }
            Err(e) => {
                inner.free_route(route_id);
                Err(e)
            }
        }
    }

    /// §4.5 `route_delete`.
    pub fn route_delete(&self, dst: &[u8], mask: Option<&[u8]>) -> Result<(), RibError> {
        validate(dst, mask)?;
        let dst_key = Key::from_payload(dst);
        let mask_key = mask.map(Key::from_payload);
        let network = match &mask_key {
            Some(m) => dst_key.view().apply_mask(&m.view()),
            None => dst_key,
        };

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let mask_view = mask_key.as_ref().map(|m| m.view());
        let route_id = inner.trie.delete(&mut inner.masks, &network.view(), mask_view.as_ref())?;
        inner.free_route(route_id);
        inner.stats.record_delete();
        trace!("route_delete ok: nodes={}", inner.trie.route_count());
        Ok(())
    }

    /// §4.5 `route_lookup`: longest-prefix match on `key`, returning an
    /// owned [`RouteInfo`] snapshot (the contract explicitly allows this
    /// instead of a borrow tied to the read-lock guard's lifetime).
    pub fn route_lookup(&self, key: &[u8]) -> Result<RouteInfo, RibError> {
        if key.is_empty() {
            return Err(RibError::InvalidArgument);
        }
        let key = Key::from_payload(key);
        let inner = self.inner.read();
        match inner.trie.match_longest(&inner.masks, &key.view()) {
            Some((_, route_id)) => {
                inner.stats.record_lookup(true);
                Ok(inner.route(route_id).info())
            }
            None => {
                inner.stats.record_lookup(false);
                Err(RibError::NotFound)
            }
        }
    }

    /// §4.5 `route_change` — observable delete-then-add under one exclusive
    /// lock region, so a concurrent reader sees either the old or the new
    /// route, never neither (§4.5 "Route change semantics").
    ///
    /// Open question (§9) resolved: this crate does **not** decrement
    /// `adds`/`deletes` to "cancel out" a `route_change`'s internal
    /// delete+add — that decrement-based bookkeeping only exists to work
    /// around a design where `changes` is tracked independently of the
    /// delete/add counters it's built from, and is fragile under concurrent
    /// readers exactly as §9 notes. Instead `route_change` only increments
    /// `changes`; `nodes` is resynced to the trie's own authoritative count
    /// once the operation settles, which is always correct regardless of
    /// whether the destination previously existed.
    pub fn route_change(&self, spec: RouteSpec) -> Result<(), RibError> {
        validate(&spec.dst, spec.mask.as_deref())?;
        let dst_key = Key::from_payload(&spec.dst);
        let mask_key = spec.mask.as_ref().map(|m| Key::from_payload(m));
        let network = match &mask_key {
            Some(m) => dst_key.view().apply_mask(&m.view()),
            None => dst_key.clone(),
        };

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let mask_view = mask_key.as_ref().map(|m| m.view());
        if let Ok(old) = inner.trie.delete(&mut inner.masks, &network.view(), mask_view.as_ref()) {
            inner.free_route(old);
        }

        let entry = RouteEntry {
            dst: network.clone(),
            mask: mask_key.clone().unwrap_or_else(|| Key::host_mask(spec.dst.len())),
            gateway: spec.gateway.clone().into_boxed_slice(),
            flags: spec.flags,
            ifindex: spec.ifindex,
            fibnum: spec.fibnum,
        };
        let route_id = inner.alloc_route(entry);
        let add_result = inner.trie.add(&mut inner.masks, &network.view(), mask_view.as_ref(), route_id);
        match add_result {
            Ok(_) => {
                inner.stats.record_change();
                let nodes = inner.trie.route_count() as u64;
                inner.stats.sync_nodes(nodes);
                Ok(())
            }
            Err(e) => {
                inner.free_route(route_id);
                let nodes = inner.trie.route_count() as u64;
                inner.stats.sync_nodes(nodes);
                Err(e)
            }
        }
    }

    /// §4.3/§4.6 `route_walk`: in-order traversal under the shared lock.
    /// The visitor must not call back into this `Rib`'s mutating methods —
    /// doing so would deadlock on the read lock this call already holds.
    pub fn route_walk<F: FnMut(&RouteInfo) -> WalkDirective>(&self, mut visitor: F) -> usize {
        let inner = self.inner.read();
        inner.trie.walk(|route_id| {
            let info = inner.route(route_id).info();
            match visitor(&info) {
                WalkDirective::Continue => TrieWalkDirective::Continue,
                WalkDirective::Stop => TrieWalkDirective::Stop,
            }
        })
    }

    /// §4.5 `route_get_stats`.
    pub fn route_get_stats(&self) -> StatsSnapshot {
        self.inner.read().stats.snapshot()
    }
}
