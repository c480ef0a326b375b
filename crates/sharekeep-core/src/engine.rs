//! Reconnect engine: target collection, user actions and the
//! background scheduler.
//!
//! The engine is the single mutation point for the target list. All
//! per-target transient state (last attempt time, manual-unmount
//! suppression, the per-target operation lock) is keyed by target id
//! and never persisted. The scheduler is one background thread running
//! a fixed-interval pass; user actions run on the caller's thread and
//! serialize against the scheduler through the per-target locks.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::error::MountError;
use crate::mounter::Mounter;
use crate::store::TargetStore;
use crate::target::MountTarget;

/// Transient per-target scheduler state.
#[derive(Default)]
struct SchedulerState {
    last_attempt: HashMap<Uuid, Instant>,
    suppressed: HashSet<Uuid>,
}

/// Mount orchestration engine.
///
/// Construct with [`Engine::new`], then either drive it manually
/// (user actions, [`Engine::tick`]) or run the background scheduler
/// with [`Engine::start`] / [`Engine::stop`].
pub struct Engine {
    store: TargetStore,
    targets: Mutex<Vec<MountTarget>>,
    mounter: Mounter,
    credentials: Arc<dyn CredentialStore>,
    reconnect_interval: Duration,
    min_retry_gap: Duration,

    state: Mutex<SchedulerState>,
    target_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,

    shutdown: Mutex<bool>,
    wakeup: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Build an engine, loading the persisted target list.
    pub fn new(
        store: TargetStore,
        mounter: Mounter,
        credentials: Arc<dyn CredentialStore>,
        reconnect_interval: Duration,
        min_retry_gap: Duration,
    ) -> io::Result<Self> {
        let targets = store.load()?;
        Ok(Self {
            store,
            targets: Mutex::new(targets),
            mounter,
            credentials,
            reconnect_interval,
            min_retry_gap,
            state: Mutex::new(SchedulerState::default()),
            target_locks: Mutex::new(HashMap::new()),
            shutdown: Mutex::new(false),
            wakeup: Condvar::new(),
            worker: Mutex::new(None),
        })
    }

    // ---- target collection ----

    /// Snapshot of the current target list, in stored order.
    pub fn targets(&self) -> Vec<MountTarget> {
        self.targets.lock().clone()
    }

    /// Look up a target by id.
    pub fn target(&self, id: Uuid) -> Option<MountTarget> {
        self.targets.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Add a target and persist the list.
    pub fn add_target(&self, target: MountTarget) -> io::Result<()> {
        let mut targets = self.targets.lock();
        targets.push(target);
        self.store.save(&targets)
    }

    /// Replace the target with the same id and persist the list.
    pub fn update_target(&self, updated: MountTarget) -> Result<(), MountError> {
        let mut targets = self.targets.lock();
        let slot = targets
            .iter_mut()
            .find(|t| t.id == updated.id)
            .ok_or(MountError::UnknownTarget(updated.id))?;
        *slot = updated;
        self.store.save(&targets)?;
        Ok(())
    }

    /// Remove a target, dropping its transient state, and persist.
    ///
    /// Deleting a target also purges its stored credential, unless
    /// `keep_credential` is set or another remaining target maps to
    /// the same credential account (accounts are shared by design).
    pub fn remove_target(&self, id: Uuid, keep_credential: bool) -> Result<MountTarget, MountError> {
        let mut targets = self.targets.lock();
        let idx = targets
            .iter()
            .position(|t| t.id == id)
            .ok_or(MountError::UnknownTarget(id))?;
        let removed = targets.remove(idx);
        self.store.save(&targets)?;

        let account = removed.keychain_account();
        let shared = targets.iter().any(|t| t.keychain_account() == account);
        drop(targets);

        let mut state = self.state.lock();
        state.last_attempt.remove(&id);
        state.suppressed.remove(&id);
        drop(state);
        self.target_locks.lock().remove(&id);

        if keep_credential || shared {
            tracing::debug!(%account, shared, "stored credential retained");
        } else {
            self.credentials.delete(&account)?;
            tracing::info!(%account, "purged stored credential");
        }
        Ok(removed)
    }

    // ---- user actions ----

    /// Mount one target now. Clears manual suppression so the
    /// scheduler resumes watching it, even if this attempt fails.
    pub fn mount_target(&self, id: Uuid) -> Result<PathBuf, MountError> {
        let target = self.target(id).ok_or(MountError::UnknownTarget(id))?;
        self.state.lock().suppressed.remove(&id);

        let account = target.keychain_account();
        let password = self
            .credentials
            .get(&account)?
            .ok_or(MountError::MissingCredential { account })?;

        let lock = self.target_lock(id);
        let _guard = lock.lock();
        let path = self.mounter.mount(&target, &password)?;
        self.set_online(id, true);
        Ok(path)
    }

    /// Unmount one target and suppress automatic reconnects until the
    /// user mounts it again.
    pub fn unmount_target(&self, id: Uuid, force: bool) -> Result<(), MountError> {
        let target = self.target(id).ok_or(MountError::UnknownTarget(id))?;
        self.state.lock().suppressed.insert(id);

        let lock = self.target_lock(id);
        let _guard = lock.lock();
        self.mounter.unmount(&target.resolved_mount_name(), force)?;
        self.set_online(id, false);
        Ok(())
    }

    /// Mount every enabled target, reporting per-target outcomes.
    pub fn mount_all(&self) -> Vec<(Uuid, Result<PathBuf, MountError>)> {
        self.targets()
            .into_iter()
            .filter(|t| t.is_enabled)
            .map(|t| (t.id, self.mount_target(t.id)))
            .collect()
    }

    /// Unmount every target, reporting per-target outcomes.
    pub fn unmount_all(&self, force: bool) -> Vec<(Uuid, Result<(), MountError>)> {
        self.targets()
            .into_iter()
            .map(|t| (t.id, self.unmount_target(t.id, force)))
            .collect()
    }

    /// Re-derive every target's `is_online` from the live mount table,
    /// persisting only when something changed.
    pub fn refresh_statuses(&self) -> io::Result<()> {
        let mut targets = self.targets.lock();
        let mut changed = false;
        for target in targets.iter_mut() {
            let online = self.mounter.is_mounted(&target.resolved_mount_name());
            if target.is_online != online {
                target.is_online = online;
                changed = true;
            }
        }
        if changed {
            self.store.save(&targets)?;
        }
        Ok(())
    }

    // ---- scheduler ----

    /// Run one scheduler pass as of `now`: refresh statuses, then
    /// attempt a reconnect for every enabled, unsuppressed, unmounted
    /// target whose last attempt is older than the retry gap.
    ///
    /// All failures are logged and swallowed; the next pass is the
    /// retry.
    pub fn tick(&self, now: Instant) {
        if let Err(e) = self.refresh_statuses() {
            tracing::warn!(error = %e, "status refresh failed");
        }

        for target in self.targets() {
            if !target.is_enabled || target.is_online {
                continue;
            }
            {
                let mut state = self.state.lock();
                if state.suppressed.contains(&target.id) {
                    continue;
                }
                if let Some(last) = state.last_attempt.get(&target.id) {
                    if now.duration_since(*last) < self.min_retry_gap {
                        continue;
                    }
                }
                state.last_attempt.insert(target.id, now);
            }

            let account = target.keychain_account();
            let password = match self.credentials.get(&account) {
                Ok(Some(p)) => p,
                Ok(None) => {
                    tracing::info!(host = %target.host, %account, "no stored credential, leaving offline");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(host = %target.host, error = %e, "credential store failure");
                    continue;
                }
            };

            let lock = self.target_lock(target.id);
            let _guard = lock.lock();
            match self.mounter.mount(&target, &password) {
                Ok(path) => {
                    tracing::info!(host = %target.host, path = %path.display(), "reconnected");
                    self.set_online(target.id, true);
                }
                Err(e) => {
                    tracing::info!(host = %target.host, error = %e, "reconnect attempt failed");
                }
            }
        }
    }

    /// Start the background scheduler thread. The first pass runs
    /// immediately (startup auto-mount), then once per interval until
    /// [`Engine::stop`]. Takes a clone of the owning `Arc`; the caller
    /// keeps its own handle for later calls.
    pub fn start(self: Arc<Self>) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        *self.shutdown.lock() = false;

        let engine = Arc::clone(&self);
        *worker = Some(std::thread::spawn(move || {
            tracing::debug!(interval = ?engine.reconnect_interval, "scheduler started");
            engine.tick(Instant::now());
            loop {
                let mut shutdown = engine.shutdown.lock();
                if !*shutdown {
                    let _ = engine
                        .wakeup
                        .wait_for(&mut shutdown, engine.reconnect_interval);
                }
                if *shutdown {
                    break;
                }
                drop(shutdown);
                engine.tick(Instant::now());
            }
            tracing::debug!("scheduler stopped");
        }));
    }

    /// Stop the scheduler thread and wait for it to exit.
    pub fn stop(&self) {
        *self.shutdown.lock() = true;
        self.wakeup.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    // ---- internals ----

    fn target_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.target_locks.lock().entry(id).or_default().clone()
    }

    fn set_online(&self, id: Uuid, online: bool) {
        let mut targets = self.targets.lock();
        let Some(target) = targets.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if target.is_online == online {
            return;
        }
        target.is_online = online;
        if let Err(e) = self.store.save(&targets) {
            tracing::warn!(error = %e, "persisting online status failed");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // A forgotten stop() must not leave the thread running.
        *self.shutdown.lock() = true;
        self.wakeup.notify_all();
        if let Some(handle) = self.worker.get_mut().take() {
            let _ = handle.join();
        }
    }
}
