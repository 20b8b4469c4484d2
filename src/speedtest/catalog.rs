use rand::Rng;
use std::net::Ipv4Addr;

pub const SERVERS: &[&str] = &[
    "New York, USA",
    "London, UK",
    "Tokyo, Japan",
    "Sydney, Australia",
    "Frankfurt, Germany",
    "Singapore",
];

pub const ISPS: &[&str] = &[
    "Comcast Business",
    "AT&T Enterprise",
    "Verizon Business",
    "Spectrum Enterprise",
    "Google Fiber Business",
];

pub const PROTOCOLS: &[&str] = &["HTTPS", "HTTP/2", "HTTP/3", "QUIC"];

/// Uniform pick from `list`. `None` only for an empty list.
pub fn pick_uniform<'a, T, R: Rng + ?Sized>(list: &'a [T], rng: &mut R) -> Option<&'a T> {
    if list.is_empty() {
        return None;
    }
    Some(&list[rng.gen_range(0..list.len())])
}

pub fn pick_server<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick_uniform(SERVERS, rng).copied().unwrap_or("Unknown")
}

/// Display-only details about the "connection", drawn once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub ip: Ipv4Addr,
    pub isp: &'static str,
    pub protocol: &'static str,
}

impl ConnectionInfo {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut octet = || rng.gen_range(0..255u8);
        let ip = Ipv4Addr::new(octet(), octet(), octet(), octet());

        Self {
            ip,
            isp: pick_uniform(ISPS, rng).copied().unwrap_or("Unknown"),
            protocol: pick_uniform(PROTOCOLS, rng).copied().unwrap_or("HTTPS"),
        }
    }
}
