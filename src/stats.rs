//! §4.6: statistics block.
//!
//! `lookups`/`hits`/`misses` are touched from inside a shared (read) lock
//! where any number of readers may run concurrently, so they are relaxed
//! atomics. `adds`/`deletes`/`changes`/`nodes` are only ever touched from
//! inside the exclusive (write) lock, so plain `u64` suffices there.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(crate) struct Stats {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    adds: u64,
    deletes: u64,
    changes: u64,
    nodes: u64,
}

/// Point-in-time snapshot returned by `route_get_stats`. Reads across the
/// seven counters are not taken atomically as a group (§4.6 explicitly
/// allows this) — only that no update already committed is ever missed.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StatsSnapshot {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub adds: u64,
    pub deletes: u64,
    pub changes: u64,
    pub nodes: u64,
}

impl Stats {
    #[inline]
    pub(crate) fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_add(&mut self) {
        self.adds += 1;
        self.nodes += 1;
    }

    #[inline]
    pub(crate) fn record_delete(&mut self) {
        self.deletes += 1;
        self.nodes -= 1;
    }

    #[inline]
    pub(crate) fn record_change(&mut self) {
        self.changes += 1;
    }

    /// Resyncs `nodes` to the trie's own authoritative leaf count. Used by
    /// `route_change`, which is one logical operation (see `RIB::route_change`
    /// for the open-question writeup) rather than a delete bumping `deletes`
    /// and an add bumping `adds` independently.
    #[inline]
    pub(crate) fn sync_nodes(&mut self, nodes: u64) {
        self.nodes = nodes;
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            adds: self.adds,
            deletes: self.deletes,
            changes: self.changes,
            nodes: self.nodes,
        }
    }
}
