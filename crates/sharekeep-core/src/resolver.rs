//! Host-reachability fallback: ordered candidate addresses for a target.

use std::time::Duration;

use crate::discovery::ShareDiscovery;
use crate::target::MountTarget;

/// Local-domain suffix used for LAN name fallback.
pub const LOCAL_DOMAIN_SUFFIX: &str = ".local";

/// One `(address, port)` candidate tried in sequence during a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAttempt {
    /// Address or hostname to try.
    pub host: String,
    /// Explicit port for this candidate; `None` defers to the target's
    /// configured port, then the protocol default.
    pub port: Option<u16>,
}

/// Produce the ordered, deduplicated candidate list for a target.
///
/// Ordering rationale: direct host first (cheapest, most likely in
/// steady state), `.local` add/strip variants second, the discovery
/// match last because the probe is the slowest and only needed when
/// naming assumptions fail. Duplicates are dropped case-insensitively
/// on `host:port`, keeping the first occurrence; a missing port is a
/// distinct key from any explicit one.
pub fn host_attempts(
    target: &MountTarget,
    discovery: &dyn ShareDiscovery,
    timeout: Duration,
) -> Vec<HostAttempt> {
    let mut out = Vec::new();
    let host = target.host.trim();

    if host.to_lowercase().ends_with(LOCAL_DOMAIN_SUFFIX) {
        out.push(HostAttempt {
            host: host.to_string(),
            port: None,
        });
        let base = &host[..host.len() - LOCAL_DOMAIN_SUFFIX.len()];
        if !base.is_empty() {
            out.push(HostAttempt {
                host: base.to_string(),
                port: None,
            });
        }
    } else {
        out.push(HostAttempt {
            host: host.to_string(),
            port: None,
        });
        if !host.contains('.') {
            out.push(HostAttempt {
                host: format!("{host}{LOCAL_DOMAIN_SUFFIX}"),
                port: None,
            });
        }
    }

    if let Some(service) = discovery.resolve(bare_name(host), timeout) {
        out.push(HostAttempt {
            host: service.host,
            port: Some(service.port),
        });
    }

    let mut seen = std::collections::HashSet::new();
    out.retain(|attempt| {
        let key = format!(
            "{}:{}",
            attempt.host.to_lowercase(),
            attempt.port.map_or(-1, i32::from)
        );
        seen.insert(key)
    });
    out
}

/// The text before the first dot, used as the discovery instance name.
fn bare_name(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}
