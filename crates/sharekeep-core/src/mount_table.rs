//! Live mount-table query.
//!
//! The core parses the system mount table for exactly one question:
//! "is path P mounted with the SMB filesystem type". Everything else
//! in an entry is ignored.
//!
//! # Platform Differences
//!
//! - **macOS**: parse `mount` command output, fstype `smbfs`
//! - **Linux**: parse `/proc/mounts`, fstype `cifs`/`smb3`

use std::io;
use std::path::{Path, PathBuf};

/// One entry from the live mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTableEntry {
    /// The mount point path.
    pub mountpoint: PathBuf,
    /// The filesystem type (e.g. `smbfs`, `cifs`).
    pub fstype: String,
    /// The filesystem source / device (e.g. `//alice@nas/Media`).
    pub source: String,
}

/// Seam over the platform mount-table query.
pub trait MountTable: Send + Sync {
    /// Snapshot of the current mount table.
    fn entries(&self) -> io::Result<Vec<MountTableEntry>>;
}

/// Filesystem types that represent SMB mounts across platforms.
const SMB_FSTYPES: &[&str] = &["smbfs", "cifs", "smb3"];

/// Check whether a filesystem type is in the SMB family.
pub fn is_smb_fstype(fstype: &str) -> bool {
    let lower = fstype.to_lowercase();
    SMB_FSTYPES.iter().any(|ft| lower == *ft)
}

/// An entry represents a given target iff its mount path equals the
/// computed mountpoint exactly and its type is in the SMB family.
pub fn is_mountpoint_active(entries: &[MountTableEntry], path: &Path) -> bool {
    entries
        .iter()
        .any(|e| e.mountpoint == path && is_smb_fstype(&e.fstype))
}

/// Production mount table backed by the platform query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMountTable;

impl SystemMountTable {
    /// Create the platform-backed mount table.
    pub fn new() -> Self {
        Self
    }
}

impl MountTable for SystemMountTable {
    fn entries(&self) -> io::Result<Vec<MountTableEntry>> {
        #[cfg(target_os = "macos")]
        {
            entries_macos()
        }

        #[cfg(target_os = "linux")]
        {
            entries_linux()
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Ok(Vec::new())
        }
    }
}

#[cfg(target_os = "macos")]
fn entries_macos() -> io::Result<Vec<MountTableEntry>> {
    let output = std::process::Command::new("/sbin/mount").output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().filter_map(parse_macos_mount_line).collect())
}

#[cfg(target_os = "linux")]
fn entries_linux() -> io::Result<Vec<MountTableEntry>> {
    let contents = std::fs::read_to_string("/proc/mounts")?;
    Ok(contents.lines().filter_map(parse_linux_mount_line).collect())
}

/// Parse one macOS `mount` output line.
///
/// Format: `{source} on {mountpoint} ({fstype}, {options...})`
/// Example: `//alice@nas/Media on /Users/me/Volumes/Media (smbfs, nodev, nosuid)`
fn parse_macos_mount_line(line: &str) -> Option<MountTableEntry> {
    let on_idx = line.find(" on ")?;
    let source = line[..on_idx].to_string();

    let rest = &line[on_idx + 4..];
    let paren_idx = rest.find(" (")?;
    let mountpoint = PathBuf::from(&rest[..paren_idx]);

    let opts_start = rest.find('(')? + 1;
    let opts_end = rest.find(')')?;
    let fstype = rest[opts_start..opts_end].split(',').next()?.trim().to_string();

    Some(MountTableEntry {
        mountpoint,
        fstype,
        source,
    })
}

/// Parse one `/proc/mounts` line.
///
/// Format: `{source} {mountpoint} {fstype} {options} {dump} {pass}`
fn parse_linux_mount_line(line: &str) -> Option<MountTableEntry> {
    let mut parts = line.split_whitespace();
    let source = parts.next()?.to_string();
    let mountpoint = PathBuf::from(unescape_mount_path(parts.next()?));
    let fstype = parts.next()?.to_string();

    Some(MountTableEntry {
        mountpoint,
        fstype,
        source,
    })
}

/// Unescape octal escapes (`\040` space, `\011` tab, `\012` newline,
/// `\134` backslash) used by /proc/mounts.
fn unescape_mount_path(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            let mut octal = String::with_capacity(3);
            for _ in 0..3 {
                if let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() && next < '8' {
                        octal.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
            }

            if octal.len() == 3 {
                if let Ok(code) = u8::from_str_radix(&octal, 8) {
                    result.push(code as char);
                    continue;
                }
            }

            result.push('\\');
            result.push_str(&octal);
        } else {
            result.push(c);
        }
    }

    result
}
