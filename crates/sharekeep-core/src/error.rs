//! Error types for mount, unmount and credential operations.

use thiserror::Error;

use crate::credentials::CredentialError;

/// Errors surfaced by the mount executor and reconnect engine.
///
/// None of these are fatal: every failure here is recoverable by a
/// retry, either through the next scheduler tick or a manual action.
#[derive(Debug, Error)]
pub enum MountError {
    /// No secret is stored for this target's credential account.
    ///
    /// This is an expected condition (the user has not saved a
    /// password yet), not a failure escalation: the reconnect loop
    /// logs it and leaves the target offline.
    #[error("no credential stored for {account}")]
    MissingCredential {
        /// The credential account key that came up empty.
        account: String,
    },

    /// The external mount/unmount primitive returned nonzero or could
    /// not be executed. Carries the captured diagnostic text.
    #[error("mount/unmount command failed: {0}")]
    CommandFailed(String),

    /// Every host candidate was tried and none produced an active
    /// mount, with no individual candidate error to report (e.g. an
    /// empty candidate list).
    #[error("no reachable host variant for {host}")]
    ResolutionExhausted {
        /// The configured host that could not be reached in any form.
        host: String,
    },

    /// The given id matches no configured target.
    #[error("no such target: {0}")]
    UnknownTarget(uuid::Uuid),

    /// Credential store backend failure (distinct from a merely
    /// absent secret, which is `MissingCredential`).
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Filesystem error while preparing or reconciling a mountpoint.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
