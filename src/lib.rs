//! A userland port of the BSD radix trie: a longest-prefix-match routing
//! information base.
//!
//! The public surface is [`Rib`] (create a table, add/delete/lookup/change
//! routes, walk them, read statistics) plus the value types it trades in —
//! [`RouteSpec`]/[`RouteInfo`]/[`Flags`] — and the error taxonomy in
//! [`RibError`]. The bit-indexed Patricia trie and mask interning that make
//! longest-prefix match fast are internal; nothing outside this crate
//! touches a `Trie` or a `MaskStore` directly.

mod error;
mod key;
mod mask;
mod route;
mod stats;
pub mod sockaddr;
mod trie;

pub mod rib;

pub use error::{RibError, Result, OK};
pub use key::Key;
pub use rib::{Rib, RibConfig, WalkDirective};
pub use route::{Flags, RouteInfo, RouteSpec};
pub use stats::StatsSnapshot;

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(addr: [u8; 4], prefix_len: u8, gw: [u8; 4]) -> RouteSpec {
        let mask = if prefix_len == 32 {
            None
        } else {
            let mut m = [0u8; 4];
            for (i, byte) in m.iter_mut().enumerate() {
                let bits = (prefix_len as i16 - (i as i16) * 8).clamp(0, 8) as u32;
                *byte = if bits == 0 { 0 } else { (0xffu8 << (8 - bits)) as u8 };
            }
            Some(m.to_vec())
        };
        RouteSpec {
            dst: addr.to_vec(),
            mask,
            gateway: gw.to_vec(),
            flags: Flags::UP | Flags::GATEWAY,
            ifindex: 1,
            fibnum: 0,
        }
    }

    /// §8 scenario 1: default route plus a more specific covering route.
    #[test]
    fn scenario_default_and_specific() {
        let rib = Rib::create(RibConfig::default());
        rib.route_add(spec([0, 0, 0, 0], 0, [192, 168, 1, 1])).unwrap();
        rib.route_add(spec([10, 0, 0, 0], 8, [10, 0, 0, 1])).unwrap();

        let specific = rib.route_lookup(&[10, 5, 6, 7]).unwrap();
        assert_eq!(specific.gateway, vec![10, 0, 0, 1]);

        let default = rib.route_lookup(&[8, 8, 8, 8]).unwrap();
        assert_eq!(default.gateway, vec![192, 168, 1, 1]);
    }

    /// §8 scenario 2: nested prefixes resolve to the most specific match.
    #[test]
    fn scenario_longest_match() {
        let rib = Rib::create(RibConfig::default());
        rib.route_add(spec([10, 0, 0, 0], 8, [1, 1, 1, 1])).unwrap();
        rib.route_add(spec([10, 1, 0, 0], 16, [2, 2, 2, 2])).unwrap();
        rib.route_add(spec([10, 1, 1, 0], 24, [3, 3, 3, 3])).unwrap();

        assert_eq!(rib.route_lookup(&[10, 1, 1, 100]).unwrap().gateway, vec![3, 3, 3, 3]);
        assert_eq!(rib.route_lookup(&[10, 1, 2, 100]).unwrap().gateway, vec![2, 2, 2, 2]);
        assert_eq!(rib.route_lookup(&[10, 2, 3, 100]).unwrap().gateway, vec![1, 1, 1, 1]);
    }

    /// §8 scenario 3: deleting the most specific route falls back cleanly.
    #[test]
    fn scenario_exact_delete_falls_back() {
        let rib = Rib::create(RibConfig::default());
        rib.route_add(spec([10, 0, 0, 0], 8, [1, 1, 1, 1])).unwrap();
        rib.route_add(spec([10, 1, 0, 0], 16, [2, 2, 2, 2])).unwrap();
        rib.route_add(spec([10, 1, 1, 0], 24, [3, 3, 3, 3])).unwrap();

        rib.route_delete(&[10, 1, 1, 0], Some(&[255, 255, 255, 0])).unwrap();
        assert_eq!(rib.route_lookup(&[10, 1, 1, 100]).unwrap().gateway, vec![2, 2, 2, 2]);
    }

    /// §8 scenario 4: an exact duplicate is rejected and `nodes` stays put.
    #[test]
    fn scenario_duplicate_add_rejected() {
        let rib = Rib::create(RibConfig::default());
        rib.route_add(spec([192, 168, 1, 0], 24, [1, 1, 1, 1])).unwrap();
        let err = rib.route_add(spec([192, 168, 1, 0], 24, [2, 2, 2, 2])).unwrap_err();
        assert_eq!(err, RibError::AlreadyExists);
        assert_eq!(rib.route_get_stats().nodes, 1);
    }

    /// §8 scenario 5: walk visits every inserted route exactly once.
    #[test]
    fn scenario_walk_enumeration() {
        let rib = Rib::create(RibConfig::default());
        for addr in [[192, 168, 1, 0], [192, 168, 2, 0], [10, 0, 0, 0], [172, 16, 0, 0]] {
            rib.route_add(spec(addr, 24, [9, 9, 9, 9])).unwrap();
        }
        let mut seen = 0;
        let visited = rib.route_walk(|_| {
            seen += 1;
            WalkDirective::Continue
        });
        assert_eq!(visited, 4);
        assert_eq!(seen, 4);
    }

    /// §8 scenario 6 (reduced N): reverse-order bulk deletion keeps `nodes`
    /// consistent and each just-deleted key stops resolving to itself.
    #[test]
    fn scenario_scale_delete_reverse_order() {
        let rib = Rib::create(RibConfig::default());
        const N: u16 = 2000;
        let mut addrs = Vec::new();
        for i in 0..N {
            let b = i.to_be_bytes();
            let addr = [10, b[0], b[1], 0];
            rib.route_add(spec(addr, 24, [1, 1, 1, 1])).unwrap();
            addrs.push(addr);
        }
        assert_eq!(rib.route_get_stats().nodes, N as u64);
        for (i, addr) in addrs.into_iter().enumerate().rev() {
            rib.route_delete(&addr, Some(&[255, 255, 255, 0])).unwrap();
            assert_eq!(rib.route_get_stats().nodes, i as u64);
            assert!(rib.route_lookup(&addr).is_err());
        }
    }

    /// Literal `N = 65_536` variant of scenario 6, run on demand.
    #[test]
    #[ignore]
    fn scenario_scale_delete_reverse_order_full() {
        let rib = Rib::create(RibConfig { initial_capacity: 1 << 17, ..RibConfig::default() });
        const N: u32 = 65_536;
        let mut addrs = Vec::new();
        for i in 0..N {
            let b = i.to_be_bytes();
            let addr = [10, b[2], b[3], 0];
            if rib.route_add(spec(addr, 24, [1, 1, 1, 1])).is_ok() {
                addrs.push(addr);
            }
        }
        let installed = addrs.len() as u64;
        assert_eq!(rib.route_get_stats().nodes, installed);
        for addr in addrs.into_iter().rev() {
            rib.route_delete(&addr, Some(&[255, 255, 255, 0])).unwrap();
        }
        assert_eq!(rib.route_get_stats().nodes, 0);
    }

    #[test]
    fn route_change_replaces_gateway_without_double_counting() {
        let rib = Rib::create(RibConfig::default());
        rib.route_add(spec([10, 0, 0, 0], 24, [1, 1, 1, 1])).unwrap();
        rib.route_change(spec([10, 0, 0, 0], 24, [2, 2, 2, 2])).unwrap();
        assert_eq!(rib.route_lookup(&[10, 0, 0, 5]).unwrap().gateway, vec![2, 2, 2, 2]);
        let snap = rib.route_get_stats();
        assert_eq!(snap.nodes, 1);
        assert_eq!(snap.changes, 1);
    }

    #[test]
    fn invalid_argument_on_mismatched_mask_length() {
        let rib = Rib::create(RibConfig::default());
        let mut bad = spec([10, 0, 0, 0], 24, [1, 1, 1, 1]);
        bad.mask = Some(vec![255, 255, 255]);
        assert_eq!(rib.route_add(bad).unwrap_err(), RibError::InvalidArgument);
    }

    /// P3: `route_lookup` must agree with a brute-force linear scan over a
    /// random, non-overlapping-by-construction set of inserted prefixes.
    #[test]
    fn random_lookups_match_brute_force_longest_prefix() {
        use rand::Rng;
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);
        let rib = Rib::create(RibConfig::default());
        let mut installed: Vec<([u8; 4], u8, [u8; 4])> = Vec::new();

        while installed.len() < 200 {
            let octet: u8 = rng.gen_range(1..=223);
            let prefix_len: u8 = rng.gen_range(8..=32);
            let addr = [octet, rng.gen(), rng.gen(), rng.gen()];
            let gw = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
            let masked_addr = mask_addr(addr, prefix_len);
            if rib.route_add(spec(masked_addr, prefix_len, gw)).is_ok() {
                installed.push((masked_addr, prefix_len, gw));
            }
        }

        for _ in 0..500 {
            let query = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
            let expect = installed
                .iter()
                .filter(|(addr, len, _)| mask_addr(query, *len) == *addr)
                .max_by_key(|(_, len, _)| *len);

            match (rib.route_lookup(&query), expect) {
                (Ok(info), Some((_, _, gw))) => assert_eq!(info.gateway, gw.to_vec()),
                (Err(_), None) => {}
                (got, want) => panic!("mismatch for {:?}: got {:?}, expected {:?}", query, got, want),
            }
        }
    }

    fn mask_addr(addr: [u8; 4], prefix_len: u8) -> [u8; 4] {
        let mut m = [0u8; 4];
        for (i, byte) in m.iter_mut().enumerate() {
            let bits = (prefix_len as i16 - (i as i16) * 8).clamp(0, 8) as u32;
            *byte = if bits == 0 { 0 } else { (0xffu8 << (8 - bits)) as u8 };
        }
        [addr[0] & m[0], addr[1] & m[1], addr[2] & m[2], addr[3] & m[3]]
    }
}
