//! Exit codes for scripting.
//!
//! Stable contract: scripts may rely on these values to distinguish
//! "no such target" from "mount failed" without parsing stderr.

/// Operation completed.
pub const SUCCESS: u8 = 0;

/// Unclassified failure.
pub const GENERAL_ERROR: u8 = 1;

/// Named target (or path) does not exist.
pub const NOT_FOUND: u8 = 3;

/// No credential stored for the target.
pub const CREDENTIAL_MISSING: u8 = 4;

/// The mount/unmount operation itself failed.
pub const MOUNT_FAILED: u8 = 5;

/// The OS denied access (keychain, mountpoint, socket).
pub const PERMISSION_DENIED: u8 = 6;
