//! The persistent record describing one share to mount.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One configured remote share.
///
/// `id` is the primary key for every per-target lookup (credential
/// mapping, retry timestamps, the manual-suppression set); it is
/// generated once at creation and never recycled. `is_online` is a
/// derived cache refreshed by the status poll - it is reset to `false`
/// on load and must never be trusted between polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountTarget {
    /// Stable opaque identifier, generated at creation.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Optional user label; empty string allowed.
    #[serde(default)]
    pub name: String,
    /// Network address or hostname, free-form (trimmed before use).
    pub host: String,
    /// Share/export name or sub-path.
    pub share_or_path: String,
    /// Share login name.
    #[serde(default)]
    pub username: String,
    /// Optional port; `None` means the protocol default.
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether this target participates in auto-mount and reconnect.
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Last observed mount state. Persisted for display but reset on
    /// load; the stale value is briefly visible until the first poll.
    #[serde(default, deserialize_with = "reset_on_load")]
    pub is_online: bool,
}

fn default_true() -> bool {
    true
}

// Online status is never trusted from disk.
fn reset_on_load<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let _ = bool::deserialize(deserializer)?;
    Ok(false)
}

impl MountTarget {
    /// Create a new target with a fresh id, enabled, offline.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        share_or_path: impl Into<String>,
        username: impl Into<String>,
        port: Option<u16>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            host: host.into(),
            share_or_path: share_or_path.into(),
            username: username.into(),
            port,
            is_enabled: true,
            is_online: false,
        }
    }

    /// The credential-store account key for this target.
    ///
    /// Two targets with the same host and share collide by design:
    /// they reference the same credential.
    pub fn keychain_account(&self) -> String {
        let host = self.host.trim().to_lowercase();
        format!("smb:{host}{}", normalize_share(&self.share_or_path))
    }

    /// The mountpoint directory name for this target.
    ///
    /// Pure function of `(name, host, share_or_path)`: it doubles as
    /// the join key against live mount-table state, so it must be
    /// stable across invocations.
    pub fn resolved_mount_name(&self) -> String {
        let display = self.name.trim();
        let base = if display.is_empty() {
            let last = self
                .share_or_path
                .split('/')
                .rev()
                .find(|s| !s.is_empty())
                .unwrap_or(self.share_or_path.as_str());
            format!("smb_{}_{last}", self.host)
        } else {
            display.to_string()
        };
        sanitize_filesystem_name(&base)
    }
}

/// Normalize a share path to a single leading slash with no duplicate
/// slashes.
pub(crate) fn normalize_share(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push('/');
    for c in trimmed.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Reduce an arbitrary label to a safe filesystem name.
///
/// Runs of characters outside `[A-Za-z0-9._-]` become a single `_`,
/// repeated underscores collapse, leading/trailing `._- ` are trimmed,
/// and the result is truncated to 64 characters. An empty result falls
/// back to `"smb_mount"`.
fn sanitize_filesystem_name(input: &str) -> String {
    let mut replaced = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            replaced.push(c);
            in_run = false;
        } else if !in_run {
            replaced.push('_');
            in_run = true;
        }
    }

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.chars() {
        if c == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches(|c| matches!(c, '.' | '_' | '-' | ' '));
    let truncated: String = trimmed.chars().take(64).collect();
    if truncated.is_empty() {
        "smb_mount".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn target(name: &str, host: &str, share: &str) -> MountTarget {
        MountTarget::new(name, host, share, "alice", None)
    }

    #[test]
    fn keychain_account_lowercases_host_and_normalizes_share() {
        let t = target("", "  NAS.Local ", "Media");
        assert_eq!(t.keychain_account(), "smb:nas.local/Media");
    }

    #[test]
    fn keychain_account_collapses_duplicate_slashes() {
        let t = target("", "nas", "//backup///daily");
        assert_eq!(t.keychain_account(), "smb:nas/backup/daily");
    }

    #[test]
    fn keychain_account_ignores_name_username_and_port() {
        let a = MountTarget::new("Work", "nas", "Media", "alice", Some(139));
        let b = MountTarget::new("", "nas", "Media", "bob", None);
        assert_eq!(a.keychain_account(), b.keychain_account());
    }

    #[test]
    fn mount_name_prefers_trimmed_label() {
        let t = target("  My Share  ", "nas", "Media");
        assert_eq!(t.resolved_mount_name(), "My_Share");
    }

    #[test]
    fn mount_name_derives_from_host_and_last_component() {
        let t = target("", "nas.local", "exports/Media");
        assert_eq!(t.resolved_mount_name(), "smb_nas.local_Media");
    }

    #[test]
    fn mount_name_falls_back_when_sanitized_away() {
        let t = target("///", "nas", "Media");
        assert_eq!(t.resolved_mount_name(), "smb_mount");
    }

    #[test]
    fn mount_name_is_stable() {
        let t = target("", "nas", "Media");
        assert_eq!(t.resolved_mount_name(), t.resolved_mount_name());
    }

    #[test]
    fn decode_defaults_and_online_reset() {
        let json = r#"{"host":"nas","shareOrPath":"Media","isOnline":true}"#;
        let t: MountTarget = serde_json::from_str(json).unwrap();
        assert_eq!(t.name, "");
        assert_eq!(t.username, "");
        assert!(t.is_enabled);
        assert!(!t.is_online, "online status must never be trusted from disk");
    }

    #[test]
    fn decode_preserves_explicit_fields() {
        let json = r#"{"id":"6ecd8c99-4036-403d-bf84-cf8400f67836","name":"Work",
            "host":"nas","shareOrPath":"Media","username":"bob","port":139,"isEnabled":false}"#;
        let t: MountTarget = serde_json::from_str(json).unwrap();
        assert_eq!(t.id.to_string(), "6ecd8c99-4036-403d-bf84-cf8400f67836");
        assert_eq!(t.port, Some(139));
        assert!(!t.is_enabled);
    }

    proptest! {
        #[test]
        fn sanitized_name_charset_length_and_fallback(name in ".{0,128}", host in ".{0,64}", share in ".{0,64}") {
            let t = MountTarget::new(name, host, share, "u", None);
            let resolved = t.resolved_mount_name();
            prop_assert!(!resolved.is_empty());
            prop_assert!(resolved.len() <= 64);
            prop_assert!(resolved
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
            // Pure function: re-derivation agrees.
            prop_assert_eq!(resolved.clone(), t.resolved_mount_name());
        }
    }
}
