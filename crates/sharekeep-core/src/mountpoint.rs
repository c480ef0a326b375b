//! Mountpoint reconciliation.
//!
//! Guarantees a target mountpoint is either an active mount (left
//! alone) or an empty, existing directory ready to be mounted onto.
//! The active-check → stale-check → quarantine-or-clean → create
//! sequence keeps mounting idempotent and never silently discards user
//! data left behind by a crash or forced unmount.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::mount_table::{is_mountpoint_active, MountTable};

/// Incidental entries a stale mountpoint may contain and still be
/// considered safe to remove (metadata/index sentinel files).
pub const BENIGN_ENTRIES: &[&str] = &[
    ".DS_Store",
    ".metadata_never_index",
    ".fseventsd",
    ".hidden",
];

/// What `cleanup_stale` did with a mountpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The path does not exist; nothing to do.
    Missing,
    /// The path is an active mount; never touched.
    ActiveMount,
    /// The directory was empty (or held only benign entries) and was
    /// removed.
    Removed,
    /// The directory held real data and was renamed aside to preserve
    /// it. Carries the quarantine path.
    Quarantined(PathBuf),
}

/// Ensures mountpoint directories are in a mountable state.
pub struct Reconciler {
    root: PathBuf,
    table: Arc<dyn MountTable>,
}

impl Reconciler {
    /// Reconciler for mountpoints under `root`.
    pub fn new(root: PathBuf, table: Arc<dyn MountTable>) -> Self {
        Self { root, table }
    }

    /// The volumes root all mountpoints live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mountpoint path for a resolved mount name.
    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// True iff the live mount table shows `path` mounted with the SMB
    /// filesystem type. A failed table query reads as "not active".
    pub fn is_active(&self, path: &Path) -> bool {
        self.table
            .entries()
            .map(|entries| is_mountpoint_active(&entries, path))
            .unwrap_or(false)
    }

    /// Reconcile a mountpoint that may be stale.
    ///
    /// Absent paths and live mounts are left alone. A directory that is
    /// empty or holds only [`BENIGN_ENTRIES`] is deleted. A directory
    /// with anything else (leftover user data from an unexpected
    /// disconnect) is renamed to `<path>.stale-<unix-ts>`, never
    /// deleted.
    pub fn cleanup_stale(&self, path: &Path) -> io::Result<CleanupOutcome> {
        if !path.exists() {
            return Ok(CleanupOutcome::Missing);
        }
        if self.is_active(path) {
            return Ok(CleanupOutcome::ActiveMount);
        }

        let entries: Vec<fs::DirEntry> = fs::read_dir(path)?.collect::<io::Result<_>>()?;
        let benign = entries.iter().all(|e| {
            let name = e.file_name();
            BENIGN_ENTRIES
                .iter()
                .any(|allowed| name.to_string_lossy() == *allowed)
        });

        if benign {
            for entry in &entries {
                let p = entry.path();
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(&p)?;
                } else {
                    fs::remove_file(&p)?;
                }
            }
            fs::remove_dir(path)?;
            return Ok(CleanupOutcome::Removed);
        }

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut quarantine = path.as_os_str().to_os_string();
        quarantine.push(format!(".stale-{ts}"));
        let quarantine = PathBuf::from(quarantine);
        fs::rename(path, &quarantine)?;
        tracing::warn!(
            from = %path.display(),
            to = %quarantine.display(),
            "quarantined stale mountpoint with leftover data"
        );
        Ok(CleanupOutcome::Quarantined(quarantine))
    }

    /// Make `path` ready to be mounted onto.
    ///
    /// Ensures the volumes root exists with owner-only permissions,
    /// stops if the path is already an active mount, otherwise cleans
    /// up stale state and creates the directory fresh.
    pub fn prepare_fresh(&self, path: &Path) -> io::Result<()> {
        // Root creation is best-effort: a pre-existing root with odd
        // permissions should not block mounting into it.
        let _ = create_private_dir(&self.root);

        if self.is_active(path) {
            return Ok(());
        }
        self.cleanup_stale(path)?;
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount_table::MountTableEntry;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Mount table whose active set is controlled by the test.
    struct FakeTable(Mutex<HashSet<PathBuf>>);

    impl FakeTable {
        fn empty() -> Arc<Self> {
            Arc::new(Self(Mutex::new(HashSet::new())))
        }

        fn activate(&self, path: &Path) {
            self.0.lock().insert(path.to_path_buf());
        }
    }

    impl MountTable for FakeTable {
        fn entries(&self) -> io::Result<Vec<MountTableEntry>> {
            Ok(self
                .0
                .lock()
                .iter()
                .map(|p| MountTableEntry {
                    mountpoint: p.clone(),
                    fstype: "smbfs".to_string(),
                    source: "//test".to_string(),
                })
                .collect())
        }
    }

    fn reconciler(root: &Path) -> (Reconciler, Arc<FakeTable>) {
        let table = FakeTable::empty();
        (Reconciler::new(root.to_path_buf(), table.clone()), table)
    }

    #[test]
    fn cleanup_missing_path_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, _) = reconciler(tmp.path());
        let outcome = r.cleanup_stale(&tmp.path().join("gone")).unwrap();
        assert_eq!(outcome, CleanupOutcome::Missing);
    }

    #[test]
    fn cleanup_never_touches_active_mount() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, table) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();
        fs::write(mp.join("important.txt"), "data").unwrap();
        table.activate(&mp);

        let outcome = r.cleanup_stale(&mp).unwrap();
        assert_eq!(outcome, CleanupOutcome::ActiveMount);
        assert!(mp.join("important.txt").exists());
    }

    #[test]
    fn cleanup_removes_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, _) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();

        let outcome = r.cleanup_stale(&mp).unwrap();
        assert_eq!(outcome, CleanupOutcome::Removed);
        assert!(!mp.exists());
    }

    #[test]
    fn cleanup_removes_directory_with_only_benign_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, _) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();
        fs::write(mp.join(".DS_Store"), "junk").unwrap();
        fs::create_dir(mp.join(".fseventsd")).unwrap();

        let outcome = r.cleanup_stale(&mp).unwrap();
        assert_eq!(outcome, CleanupOutcome::Removed);
        assert!(!mp.exists());
    }

    #[test]
    fn cleanup_quarantines_leftover_user_data() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, _) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();
        fs::write(mp.join("report.pdf"), "do not lose").unwrap();

        let outcome = r.cleanup_stale(&mp).unwrap();
        let CleanupOutcome::Quarantined(quarantine) = outcome else {
            panic!("expected quarantine, got {outcome:?}");
        };
        assert!(!mp.exists());
        assert!(quarantine
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Media.stale-"));
        assert_eq!(
            fs::read_to_string(quarantine.join("report.pdf")).unwrap(),
            "do not lose"
        );
    }

    #[test]
    fn cleanup_quarantines_mixed_benign_and_real_data() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, _) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();
        fs::write(mp.join(".DS_Store"), "junk").unwrap();
        fs::write(mp.join("notes.txt"), "keep me").unwrap();

        let outcome = r.cleanup_stale(&mp).unwrap();
        assert!(matches!(outcome, CleanupOutcome::Quarantined(_)));
    }

    #[test]
    fn prepare_fresh_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Volumes");
        let table = FakeTable::empty();
        let r = Reconciler::new(root.clone(), table);
        let mp = root.join("Media");

        r.prepare_fresh(&mp).unwrap();
        assert!(mp.is_dir());
        // Idempotent on a clean directory.
        r.prepare_fresh(&mp).unwrap();
        assert!(mp.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn prepare_fresh_root_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Volumes");
        let r = Reconciler::new(root.clone(), FakeTable::empty());
        r.prepare_fresh(&root.join("Media")).unwrap();
        let mode = fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn prepare_fresh_leaves_active_mount_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let (r, table) = reconciler(tmp.path());
        let mp = tmp.path().join("Media");
        fs::create_dir(&mp).unwrap();
        fs::write(mp.join("live.txt"), "mounted content").unwrap();
        table.activate(&mp);

        r.prepare_fresh(&mp).unwrap();
        assert!(mp.join("live.txt").exists());
    }
}
