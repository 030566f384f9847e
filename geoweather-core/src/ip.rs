//! Detection of client addresses that IP geocoding cannot place.

const LOOPBACK: &[&str] = &["127.0.0.1", "::1"];

/// `10.0.0.0/8`, `172.16.0.0/12` and `192.168.0.0/16` as textual prefixes.
const PRIVATE_PREFIXES: &[&str] = &[
    "10.", "172.16.", "172.17.", "172.18.", "172.19.", "172.20.", "172.21.", "172.22.", "172.23.",
    "172.24.", "172.25.", "172.26.", "172.27.", "172.28.", "172.29.", "172.30.", "172.31.",
    "192.168.",
];

/// Prefix that dual-stack listeners put in front of IPv4 clients.
const IPV4_MAPPED: &str = "::ffff:";

/// Returns `true` if `ip` is loopback, in a private range, or absent.
///
/// This is a coarse textual check, not CIDR arithmetic: anything that is not
/// recognised here is treated as routable and handed to the geocoders.
pub fn is_private(ip: Option<&str>) -> bool {
    let Some(ip) = ip.map(str::trim).filter(|ip| !ip.is_empty()) else {
        return true;
    };

    let ip = ip.strip_prefix(IPV4_MAPPED).unwrap_or(ip);

    LOOPBACK.contains(&ip) || PRIVATE_PREFIXES.iter().any(|prefix| ip.starts_with(prefix))
}
