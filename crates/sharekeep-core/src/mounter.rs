//! Mount executor: drives one target through candidate addresses to an
//! active mount, and back down through the unmount ladder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::command::{MountCommand, MountRequest, UnmountMode};
use crate::discovery::ShareDiscovery;
use crate::error::MountError;
use crate::mountpoint::Reconciler;
use crate::resolver::host_attempts;
use crate::target::{normalize_share, MountTarget};

/// Mounts and unmounts targets through the injected seams.
pub struct Mounter {
    reconciler: Reconciler,
    command: Arc<dyn MountCommand>,
    discovery: Arc<dyn ShareDiscovery>,
    discovery_timeout: Duration,
}

impl Mounter {
    /// Executor over the given reconciler, primitive and discovery
    /// probe.
    pub fn new(
        reconciler: Reconciler,
        command: Arc<dyn MountCommand>,
        discovery: Arc<dyn ShareDiscovery>,
        discovery_timeout: Duration,
    ) -> Self {
        Self {
            reconciler,
            command,
            discovery,
            discovery_timeout,
        }
    }

    /// Mountpoint path a target resolves to.
    pub fn mount_path(&self, target: &MountTarget) -> PathBuf {
        self.reconciler.mount_path(&target.resolved_mount_name())
    }

    /// Whether the mountpoint for `mount_name` is currently an active
    /// SMB mount.
    pub fn is_mounted(&self, mount_name: &str) -> bool {
        self.reconciler.is_active(&self.reconciler.mount_path(mount_name))
    }

    /// Mount a target, trying each host candidate in order until one
    /// produces an active mount.
    ///
    /// Idempotent: an already-active mountpoint returns Ok without
    /// invoking the primitive. A candidate whose command succeeds but
    /// whose mount does not show up in the table is skipped without
    /// recording an error. When every candidate fails the mountpoint is
    /// cleaned up best-effort and the last candidate error is surfaced.
    pub fn mount(&self, target: &MountTarget, password: &str) -> Result<PathBuf, MountError> {
        let mount_point = self.mount_path(target);
        self.reconciler.prepare_fresh(&mount_point)?;
        if self.reconciler.is_active(&mount_point) {
            tracing::debug!(target = %target.host, path = %mount_point.display(), "already mounted");
            return Ok(mount_point);
        }

        let attempts = host_attempts(target, &*self.discovery, self.discovery_timeout);
        let mut last_err: Option<MountError> = None;

        for attempt in &attempts {
            let request = MountRequest {
                host: attempt.host.clone(),
                port: attempt.port.or(target.port),
                share_path: normalize_share(&target.share_or_path),
                username: target.username.clone(),
                password: password.to_string(),
                mount_point: mount_point.clone(),
            };
            tracing::debug!(host = %attempt.host, port = ?request.port, "trying mount candidate");
            match self.command.mount_smb(&request) {
                Ok(()) => {
                    if self.reconciler.is_active(&mount_point) {
                        tracing::info!(
                            host = %attempt.host,
                            path = %mount_point.display(),
                            "mounted"
                        );
                        return Ok(mount_point);
                    }
                    // Exited zero but nothing showed up in the table;
                    // try the next candidate.
                    tracing::debug!(host = %attempt.host, "command succeeded but mount not active");
                }
                Err(e) => {
                    tracing::debug!(host = %attempt.host, error = %e, "mount candidate failed");
                    last_err = Some(e);
                }
            }
        }

        if let Err(e) = self.reconciler.cleanup_stale(&mount_point) {
            tracing::debug!(path = %mount_point.display(), error = %e, "post-failure cleanup failed");
        }
        Err(last_err.unwrap_or(MountError::ResolutionExhausted {
            host: target.host.trim().to_string(),
        }))
    }

    /// Unmount by mount name, escalating through the ladder.
    ///
    /// Graceful first; a forced unmount is attempted only with `force`;
    /// the administrative escalation always runs as the last resort.
    /// The mountpoint is reconciled afterward regardless of outcome.
    pub fn unmount(&self, mount_name: &str, force: bool) -> Result<(), MountError> {
        let path = self.reconciler.mount_path(mount_name);
        let result = if self.reconciler.is_active(&path) {
            self.unmount_ladder(&path, force)
        } else {
            Ok(())
        };

        if let Err(e) = self.reconciler.cleanup_stale(&path) {
            tracing::debug!(path = %path.display(), error = %e, "post-unmount cleanup failed");
        }
        result
    }

    fn unmount_ladder(&self, path: &std::path::Path, force: bool) -> Result<(), MountError> {
        match self.command.unmount(path, UnmountMode::Graceful) {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "graceful unmount failed"),
        }
        if force {
            match self.command.unmount(path, UnmountMode::Forced) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "forced unmount failed");
                }
            }
        }
        self.command.unmount(path, UnmountMode::Administrative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoveredService, NullDiscovery};
    use crate::mount_table::{MountTable, MountTableEntry};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Mount table whose active set the fakes can mutate.
    #[derive(Default)]
    struct FakeTable(Mutex<HashSet<PathBuf>>);

    impl MountTable for FakeTable {
        fn entries(&self) -> std::io::Result<Vec<MountTableEntry>> {
            Ok(self
                .0
                .lock()
                .iter()
                .map(|p| MountTableEntry {
                    mountpoint: p.clone(),
                    fstype: "cifs".to_string(),
                    source: "//test".to_string(),
                })
                .collect())
        }
    }

    /// Primitive that succeeds only for listed hosts, activating the
    /// mountpoint in the shared table; records every request.
    struct FakeCommand {
        table: Arc<FakeTable>,
        good_hosts: Vec<String>,
        requests: Mutex<Vec<MountRequest>>,
        unmounts: Mutex<Vec<UnmountMode>>,
        graceful_fails: AtomicBool,
        forced_fails: AtomicBool,
    }

    impl FakeCommand {
        fn new(table: Arc<FakeTable>, good_hosts: &[&str]) -> Self {
            Self {
                table,
                good_hosts: good_hosts.iter().map(|s| s.to_string()).collect(),
                requests: Mutex::new(Vec::new()),
                unmounts: Mutex::new(Vec::new()),
                graceful_fails: AtomicBool::new(false),
                forced_fails: AtomicBool::new(false),
            }
        }
    }

    impl MountCommand for FakeCommand {
        fn mount_smb(&self, request: &MountRequest) -> Result<(), MountError> {
            self.requests.lock().push(request.clone());
            if self.good_hosts.iter().any(|h| *h == request.host) {
                self.table.0.lock().insert(request.mount_point.clone());
                Ok(())
            } else {
                Err(MountError::CommandFailed(format!(
                    "no route to {}",
                    request.host
                )))
            }
        }

        fn unmount(&self, path: &Path, mode: UnmountMode) -> Result<(), MountError> {
            self.unmounts.lock().push(mode);
            let fails = match mode {
                UnmountMode::Graceful => self.graceful_fails.load(Ordering::Relaxed),
                UnmountMode::Forced => self.forced_fails.load(Ordering::Relaxed),
                UnmountMode::Administrative => false,
            };
            if fails {
                Err(MountError::CommandFailed("busy".to_string()))
            } else {
                self.table.0.lock().remove(path);
                Ok(())
            }
        }
    }

    struct Rig {
        mounter: Mounter,
        command: Arc<FakeCommand>,
        table: Arc<FakeTable>,
        _tmp: tempfile::TempDir,
    }

    fn rig_with(good_hosts: &[&str], discovery: Arc<dyn ShareDiscovery>) -> Rig {
        let tmp = tempfile::tempdir().unwrap();
        let table = Arc::new(FakeTable::default());
        let command = Arc::new(FakeCommand::new(table.clone(), good_hosts));
        let reconciler = Reconciler::new(tmp.path().join("Volumes"), table.clone());
        let mounter = Mounter::new(reconciler, command.clone(), discovery, Duration::ZERO);
        Rig {
            mounter,
            command,
            table,
            _tmp: tmp,
        }
    }

    fn rig(good_hosts: &[&str]) -> Rig {
        rig_with(good_hosts, Arc::new(NullDiscovery))
    }

    fn target() -> MountTarget {
        MountTarget::new("Media", "nas.local", "Media", "alice", None)
    }

    #[test]
    fn first_candidate_success_short_circuits() {
        let rig = rig(&["nas.local", "nas"]);
        let path = rig.mounter.mount(&target(), "pw").unwrap();
        assert!(path.ends_with("Media"));
        let requests = rig.command.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].host, "nas.local");
    }

    #[test]
    fn falls_through_to_second_candidate() {
        let rig = rig(&["nas"]);
        rig.mounter.mount(&target(), "pw").unwrap();
        let requests = rig.command.requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].host, "nas");
    }

    #[test]
    fn discovery_candidate_wins_end_to_end() {
        struct Fixed;
        impl ShareDiscovery for Fixed {
            fn resolve(&self, _: &str, _: Duration) -> Option<DiscoveredService> {
                Some(DiscoveredService {
                    host: "nas.fritz.box".to_string(),
                    port: 139,
                })
            }
        }
        let rig = rig_with(&["nas.fritz.box"], Arc::new(Fixed));
        rig.mounter.mount(&target(), "pw").unwrap();
        let requests = rig.command.requests.lock();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].host, "nas.fritz.box");
        assert_eq!(requests[2].port, Some(139));
    }

    #[test]
    fn candidate_port_falls_back_to_target_port() {
        let mut t = target();
        t.port = Some(1445);
        let rig = rig(&["nas.local"]);
        rig.mounter.mount(&t, "pw").unwrap();
        assert_eq!(rig.command.requests.lock()[0].port, Some(1445));
    }

    #[test]
    fn mount_is_idempotent() {
        let rig = rig(&["nas.local"]);
        let path = rig.mounter.mount(&target(), "pw").unwrap();
        assert!(rig.mounter.is_mounted("Media"));

        let again = rig.mounter.mount(&target(), "pw").unwrap();
        assert_eq!(again, path);
        // The primitive was only invoked for the first mount.
        assert_eq!(rig.command.requests.lock().len(), 1);
    }

    #[test]
    fn all_candidates_failing_surfaces_last_error_and_cleans_up() {
        let rig = rig(&[]);
        let err = rig.mounter.mount(&target(), "pw").unwrap_err();
        let MountError::CommandFailed(msg) = err else {
            panic!("wrong variant");
        };
        assert!(msg.contains("no route to nas"));
        // The prepared mountpoint was reconciled away.
        assert!(!rig.mounter.mount_path(&target()).exists());
    }

    #[test]
    fn unmount_of_inactive_mount_is_ok() {
        let rig = rig(&[]);
        rig.mounter.unmount("Media", false).unwrap();
        assert!(rig.command.unmounts.lock().is_empty());
    }

    #[test]
    fn graceful_unmount_suffices() {
        let rig = rig(&["nas.local"]);
        rig.mounter.mount(&target(), "pw").unwrap();
        rig.mounter.unmount("Media", false).unwrap();
        assert_eq!(*rig.command.unmounts.lock(), vec![UnmountMode::Graceful]);
        assert!(!rig.mounter.is_mounted("Media"));
    }

    #[test]
    fn force_escalates_through_the_ladder() {
        let rig = rig(&["nas.local"]);
        rig.command.graceful_fails.store(true, Ordering::Relaxed);
        rig.command.forced_fails.store(true, Ordering::Relaxed);
        rig.mounter.mount(&target(), "pw").unwrap();

        rig.mounter.unmount("Media", true).unwrap();
        assert_eq!(
            *rig.command.unmounts.lock(),
            vec![
                UnmountMode::Graceful,
                UnmountMode::Forced,
                UnmountMode::Administrative
            ]
        );
    }

    #[test]
    fn without_force_the_forced_step_is_skipped() {
        let rig = rig(&["nas.local"]);
        rig.command.graceful_fails.store(true, Ordering::Relaxed);
        rig.mounter.mount(&target(), "pw").unwrap();

        rig.mounter.unmount("Media", false).unwrap();
        assert_eq!(
            *rig.command.unmounts.lock(),
            vec![UnmountMode::Graceful, UnmountMode::Administrative]
        );
    }

    #[test]
    fn stale_mountpoint_data_is_quarantined_before_mounting() {
        let rig = rig(&["nas.local"]);
        let path = rig.mounter.mount_path(&target());
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("leftover.txt"), "old").unwrap();

        rig.mounter.mount(&target(), "pw").unwrap();
        let quarantined = path
            .parent()
            .unwrap()
            .read_dir()
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("Media.stale-"));
        assert!(quarantined);
        // Activation state is tracked in the shared table.
        assert!(rig.table.0.lock().contains(&path));
    }
}
