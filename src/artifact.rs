//! Temporary audio artifacts on local storage.
//!
//! [`ArtifactStore`] names, writes, enumerates and deletes the audio files
//! produced by speech synthesis.  It only ever touches files that carry its
//! own prefix and extension, so pointing it at a shared temp directory is
//! safe.
//!
//! Deletion never fails the caller: a file that is already gone counts as
//! deleted, and any other failure is reported as a [`CleanupError`] and
//! logged as a warning.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// CleanupError / PurgeReport
// ---------------------------------------------------------------------------

/// A single artifact could not be deleted.
#[derive(Debug, Error)]
#[error("could not delete {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Outcome of [`ArtifactStore::purge_all`].
#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Number of files actually removed.
    pub removed: usize,
    /// Files that could not be removed.
    pub failures: Vec<CleanupError>,
}

impl PurgeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AudioArtifact
// ---------------------------------------------------------------------------

/// Handle to one generated audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    path: PathBuf,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Owns the artifact directory and its naming scheme.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.artifact_dir(),
            config.artifacts.prefix.clone(),
            config.artifacts.extension.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory if it is missing.
    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// A fresh, collision-free path inside the artifact directory.
    pub fn new_artifact_path(&self) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.prefix,
            uuid::Uuid::new_v4(),
            self.extension
        ))
    }

    /// Write `bytes` to a new artifact file.
    pub fn write(&self, bytes: &[u8]) -> io::Result<AudioArtifact> {
        self.ensure_dir()?;
        let path = self.new_artifact_path();
        std::fs::write(&path, bytes)?;
        log::debug!("artifact: wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(AudioArtifact::new(path))
    }

    /// Whether `path` is a file this store owns.
    pub fn is_artifact(&self, path: &Path) -> bool {
        if path.parent() != Some(self.dir.as_path()) {
            return false;
        }
        let name_ok = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&self.prefix));
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
        name_ok && ext_ok
    }

    /// Every artifact file currently present, sorted by path.
    ///
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.is_artifact(path))
            .collect();
        files.sort();
        files
    }

    /// Delete one artifact.  Returns `Ok(false)` when it was already gone.
    pub fn delete_one(&self, artifact: &AudioArtifact) -> Result<bool, CleanupError> {
        remove_file(artifact.path())
    }

    /// Delete every artifact in the directory.
    ///
    /// Tolerates a missing directory and files vanishing mid-purge.  Failures
    /// are logged and collected; they never stop the purge.
    pub fn purge_all(&self) -> PurgeReport {
        let mut report = PurgeReport::default();

        for path in self.list() {
            match remove_file(&path) {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("artifact: {e}");
                    report.failures.push(e);
                }
            }
        }

        if report.removed > 0 {
            log::debug!(
                "artifact: purged {} file(s) from {}",
                report.removed,
                self.dir.display()
            );
        }
        report
    }
}

fn remove_file(path: &Path) -> Result<bool, CleanupError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanupError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(dir.join("temp"), "description_", "mp3")
    }

    #[test]
    fn new_paths_are_unique_and_owned() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let a = store.new_artifact_path();
        let b = store.new_artifact_path();
        assert_ne!(a, b);
        assert!(store.is_artifact(&a));
        assert!(a.file_name().unwrap().to_str().unwrap().starts_with("description_"));
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.dir().exists());

        let artifact = store.write(b"ID3").unwrap();
        assert!(artifact.exists());
        assert_eq!(store.list(), vec![artifact.path().to_path_buf()]);
    }

    #[test]
    fn purge_all_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.write(b"one").unwrap();
        store.write(b"two").unwrap();

        let first = store.purge_all();
        assert_eq!(first.removed, 2);
        assert!(first.is_clean());
        assert!(store.list().is_empty());

        let second = store.purge_all();
        assert_eq!(second.removed, 0);
        assert!(second.is_clean());
        assert!(store.list().is_empty());
    }

    #[test]
    fn purge_all_tolerates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let report = store.purge_all();
        assert_eq!(report.removed, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn purge_leaves_foreign_files_alone() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dir().unwrap();

        let foreign_mp3 = store.dir().join("song.mp3");
        let foreign_txt = store.dir().join("description_notes.txt");
        std::fs::write(&foreign_mp3, b"x").unwrap();
        std::fs::write(&foreign_txt, b"x").unwrap();
        store.write(b"audio").unwrap();

        assert_eq!(store.purge_all().removed, 1);
        assert!(foreign_mp3.exists());
        assert!(foreign_txt.exists());
    }

    #[test]
    fn delete_one_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let artifact = store.write(b"audio").unwrap();

        assert!(store.delete_one(&artifact).unwrap());
        assert!(!artifact.exists());
        assert!(!store.delete_one(&artifact).unwrap());
    }

    #[test]
    fn undeletable_artifact_is_a_cleanup_error() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let blocker = store.dir().join("description_blocker.mp3");
        std::fs::create_dir_all(&blocker).unwrap();

        let err = store.delete_one(&AudioArtifact::new(blocker.clone())).unwrap_err();
        assert_eq!(err.path, blocker);
        assert_ne!(err.source.kind(), io::ErrorKind::NotFound);

        // Purge only looks at files, so the directory is skipped quietly.
        let report = store.purge_all();
        assert_eq!(report.removed, 0);
        assert!(report.is_clean());
        assert!(blocker.is_dir());
    }

    #[test]
    fn is_artifact_rejects_other_directories() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.is_artifact(&dir.path().join("description_x.mp3")));
    }

    #[test]
    fn from_config_uses_override_dir() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.artifacts.dir = Some(dir.path().to_path_buf());

        let store = ArtifactStore::from_config(&config);
        assert_eq!(store.dir(), dir.path());
    }
}
