//! Persisted target list.
//!
//! Targets live as an ordered JSON array in `targets.json`. Saves are
//! atomic: serialize to a temp file in the same directory, then rename
//! over the old file, so a crash mid-save never leaves a truncated
//! list.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::target::MountTarget;

/// Loads and saves the ordered target list.
#[derive(Debug, Clone)]
pub struct TargetStore {
    path: PathBuf,
}

impl TargetStore {
    /// Store backed by the file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all targets. An absent file is an empty list; a malformed
    /// file is an error (the caller decides whether to start over).
    pub fn load(&self) -> io::Result<Vec<MountTarget>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Atomically replace the stored list, preserving order.
    pub fn save(&self, targets: &[MountTarget]) -> io::Result<()> {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut tmp, targets)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> TargetStore {
        TargetStore::new(dir.join("targets.json"))
    }

    #[test]
    fn absent_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(store_in(tmp.path()).load().unwrap().is_empty());
    }

    #[test]
    fn save_load_preserves_order_and_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let targets = vec![
            MountTarget::new("Work", "nas.local", "Media", "alice", Some(139)),
            MountTarget::new("", "backup", "exports/daily", "alice", None),
        ];
        store.save(&targets).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, targets[0].id);
        assert_eq!(loaded[0].name, "Work");
        assert_eq!(loaded[0].port, Some(139));
        assert_eq!(loaded[1].id, targets[1].id);
        assert_eq!(loaded[1].share_or_path, "exports/daily");
    }

    #[test]
    fn online_flag_is_not_trusted_across_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let mut target = MountTarget::new("", "nas", "Media", "alice", None);
        target.is_online = true;
        store.save(&[target]).unwrap();

        let loaded = store.load().unwrap();
        assert!(!loaded[0].is_online);
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("nested/dir/targets.json"));
        store.save(&[]).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn save_replaces_rather_than_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store
            .save(&[MountTarget::new("", "a", "x", "u", None)])
            .unwrap();
        store
            .save(&[MountTarget::new("", "b", "y", "u", None)])
            .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].host, "b");
    }
}
