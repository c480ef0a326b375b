//! Service-discovery probe for SMB hosts on the local network.
//!
//! The probe is a single synchronous bounded call: browse `_smb._tcp`
//! in the local domain, match the instance name case-insensitively,
//! and report the resolved address and port if one shows up before the
//! timeout. Failure or timeout simply yields `None` - never an error -
//! because discovery is the last-resort candidate, not a requirement.

use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent};

/// Default bounded wait for the discovery probe.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Protocol default port used when a discovered service reports none.
pub const DEFAULT_SMB_PORT: u16 = 445;

/// mDNS service type browsed for share hosts.
const SMB_SERVICE_TYPE: &str = "_smb._tcp.local.";

/// A discovery match: concrete address plus the advertised port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredService {
    /// Resolved hostname or address, without trailing dot.
    pub host: String,
    /// Advertised port, or [`DEFAULT_SMB_PORT`] when unspecified.
    pub port: u16,
}

/// Seam over the local-network service-discovery query.
pub trait ShareDiscovery: Send + Sync {
    /// Look for a share service whose instance name equals `name`
    /// (case-insensitive), waiting at most `timeout`.
    fn resolve(&self, name: &str, timeout: Duration) -> Option<DiscoveredService>;
}

/// Discovery that never finds anything. Used by callers that want to
/// skip the probe and by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiscovery;

impl ShareDiscovery for NullDiscovery {
    fn resolve(&self, _name: &str, _timeout: Duration) -> Option<DiscoveredService> {
        None
    }
}

/// mDNS-backed discovery browsing `_smb._tcp.local.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdnsDiscovery;

impl MdnsDiscovery {
    /// Create a new probe. Each `resolve` call runs its own short-lived
    /// browse session.
    pub fn new() -> Self {
        Self
    }
}

impl ShareDiscovery for MdnsDiscovery {
    fn resolve(&self, name: &str, timeout: Duration) -> Option<DiscoveredService> {
        let daemon = match ServiceDaemon::new() {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("mdns daemon unavailable: {e}");
                return None;
            }
        };
        let receiver = match daemon.browse(SMB_SERVICE_TYPE) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("mdns browse failed: {e}");
                let _ = daemon.shutdown();
                return None;
            }
        };

        let deadline = Instant::now() + timeout;
        let mut found = None;
        loop {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match receiver.recv_timeout(remaining) {
                Ok(ServiceEvent::ServiceResolved(info)) => {
                    let instance = info
                        .get_fullname()
                        .strip_suffix(&format!(".{SMB_SERVICE_TYPE}"))
                        .unwrap_or(info.get_fullname());
                    if !instance.eq_ignore_ascii_case(name) {
                        continue;
                    }
                    let host = info.get_hostname().trim().trim_matches('.').to_string();
                    let host = if host.is_empty() {
                        match info.get_addresses().iter().next() {
                            Some(addr) => addr.to_string(),
                            None => continue,
                        }
                    } else {
                        host
                    };
                    let port = if info.get_port() > 0 {
                        info.get_port()
                    } else {
                        DEFAULT_SMB_PORT
                    };
                    found = Some(DiscoveredService { host, port });
                    break;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        let _ = daemon.stop_browse(SMB_SERVICE_TYPE);
        let _ = daemon.shutdown();
        found
    }
}
