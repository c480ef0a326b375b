//! Runtime configuration.
//!
//! Loaded from `config.json` next to the target list; every field has
//! a default, and an absent file means "all defaults". Durations are
//! written human-readable (`"30s"`, `"2s 500ms"`).

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine and path settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory all mountpoints are created under.
    pub volumes_root: PathBuf,
    /// Fixed reconnect tick interval.
    #[serde(with = "humantime_serde")]
    pub reconnect_interval: Duration,
    /// Minimum gap between mount attempts for one target.
    #[serde(with = "humantime_serde")]
    pub min_retry_gap: Duration,
    /// Bounded wait for the service-discovery probe.
    #[serde(with = "humantime_serde")]
    pub discovery_timeout: Duration,
    /// Unix socket of the privileged mount helper; absent means mount
    /// directly with the unprivileged tooling.
    pub helper_socket: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volumes_root: default_volumes_root(),
            reconnect_interval: Duration::from_secs(30),
            min_retry_gap: Duration::from_secs(10),
            discovery_timeout: Duration::from_secs(2),
            helper_socket: None,
        }
    }
}

impl Config {
    /// Load from `path`; an absent file yields the defaults.
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Platform config directory for this application, if resolvable.
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sharekeep")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

/// `~/Volumes`, falling back to a relative path when the home
/// directory cannot be resolved.
fn default_volumes_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join("Volumes"))
        .unwrap_or_else(|| PathBuf::from("Volumes"))
}
