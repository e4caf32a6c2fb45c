//! Loads a file of `prefix gateway` lines into a [`Rib`] and answers
//! longest-prefix-match queries read one per line from stdin.
//!
//! Input line format: `a.b.c.d/len gw_a.gw_b.gw_c.gw_d`. Lines starting with
//! `#`, and empty lines, are skipped.

use std::env;
use std::io::{self, BufRead};

use radix_rib::{Flags, Rib, RibConfig, RouteSpec};

fn parse_ipv4(s: &str) -> Option<[u8; 4]> {
    let mut out = [0u8; 4];
    let mut parts = s.split('.');
    for slot in out.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

fn parse_prefix(s: &str) -> Option<([u8; 4], u8)> {
    let (addr, len) = s.split_once('/')?;
    Some((parse_ipv4(addr)?, len.parse().ok()?))
}

fn mask_for(prefix_len: u8) -> [u8; 4] {
    let mut m = [0u8; 4];
    for (i, byte) in m.iter_mut().enumerate() {
        let bits = (prefix_len as i16 - (i as i16) * 8).clamp(0, 8) as u32;
        *byte = if bits == 0 { 0 } else { (0xffu8 << (8 - bits)) as u8 };
    }
    m
}

fn main() {
    env_logger::init();

    let path = env::args().nth(1).expect("usage: lpm <prefix-file>");
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("can't read {}: {}", path, e));

    let rib = Rib::create(RibConfig { initial_capacity: 4096, ..RibConfig::default() });
    let mut loaded = 0u64;
    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_ascii_whitespace();
        let (prefix, gateway) = match (fields.next(), fields.next()) {
            (Some(p), Some(g)) => (p, g),
            _ => {
                eprintln!("WARN: skip bad formatted line: {}", line);
                continue;
            }
        };
        let (addr, prefix_len) = match parse_prefix(prefix) {
            Some(v) => v,
            None => {
                eprintln!("WARN: skip bad formatted line: {}", line);
                continue;
            }
        };
        let gw = match parse_ipv4(gateway) {
            Some(v) => v,
            None => {
                eprintln!("WARN: skip bad formatted line: {}", line);
                continue;
            }
        };
        let mask = if prefix_len == 32 { None } else { Some(mask_for(prefix_len).to_vec()) };
        let spec = RouteSpec {
            dst: addr.to_vec(),
            mask,
            gateway: gw.to_vec(),
            flags: Flags::UP | Flags::GATEWAY,
            ifindex: 0,
            fibnum: 0,
        };
        match rib.route_add(spec) {
            Ok(()) => loaded += 1,
            Err(e) => eprintln!("WARN: rejected {}: {}", line, e),
        }
    }
    println!("loaded {} routes, ready", loaded);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.expect("stdin read error");
        match parse_ipv4(line.trim()) {
            Some(addr) => match rib.route_lookup(&addr) {
                Ok(info) => println!("{}", Vec::from_iter(info.gateway.iter().map(u8::to_string)).join(".")),
                Err(_) => println!("no route"),
            },
            None => println!("WARN: can't parse '{}' (not an IPv4 address)", line),
        }
    }
}
