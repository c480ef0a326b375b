//! Mount orchestration engine for SMB network shares.
//!
//! sharekeep keeps a single user's configured shares mounted under a
//! per-user volumes root and re-establishes lost connections in the
//! background. The crate is organized around a few seams so the hard
//! parts stay testable without touching a real mount table:
//!
//! - [`MountTarget`] - the persistent record describing one share and
//!   its derived identifiers (mountpoint name, credential account key)
//! - [`host_attempts`] - ordered, deduplicated host candidates: direct
//!   address, `.local` variants, then a service-discovery match
//! - [`Reconciler`] - guarantees a mountpoint is either an active mount
//!   or an empty directory, quarantining leftover user data instead of
//!   deleting it
//! - [`Mounter`] - drives mount/unmount against the candidate list with
//!   first-success short-circuit and a graceful/forced/administrative
//!   unmount ladder
//! - [`Engine`] - the reconnect scheduler: periodic status refresh plus
//!   throttled, suppression-aware remount attempts
//!
//! External collaborators are traits with thin production
//! implementations: [`CredentialStore`] (`keyring`), [`MountTable`]
//! (platform mount-table query), [`MountCommand`] (`mount_smbfs` /
//! `mount -t cifs`, or a privileged helper over a Unix socket), and
//! [`ShareDiscovery`] (mDNS browse for `_smb._tcp`).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod config;
mod credentials;
mod discovery;
mod engine;
mod error;
#[cfg(unix)]
mod helper;
mod mount_table;
mod mounter;
mod mountpoint;
mod resolver;
mod store;
mod target;

pub use command::{MountCommand, MountRequest, SystemMountCommand, UnmountMode};
pub use config::Config;
pub use credentials::{
    migrate_secret, CredentialError, CredentialStore, KeyringStore, MemoryStore, SERVICE_NAME,
};
pub use discovery::{
    DiscoveredService, MdnsDiscovery, NullDiscovery, ShareDiscovery, DEFAULT_DISCOVERY_TIMEOUT,
    DEFAULT_SMB_PORT,
};
pub use engine::Engine;
pub use error::MountError;
#[cfg(unix)]
pub use helper::HelperClient;
pub use mount_table::{is_mountpoint_active, is_smb_fstype, MountTableEntry, MountTable, SystemMountTable};
pub use mounter::Mounter;
pub use mountpoint::{CleanupOutcome, Reconciler, BENIGN_ENTRIES};
pub use resolver::{host_attempts, HostAttempt, LOCAL_DOMAIN_SUFFIX};
pub use store::TargetStore;
pub use target::MountTarget;
