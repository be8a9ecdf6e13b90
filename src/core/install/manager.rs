use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Owns the install root: one subdirectory per installed version, and at
/// most one of them survives a reconciliation.
pub struct InstallDirManager {
    root: PathBuf,
}

impl InstallDirManager {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Names of the version directories currently on disk, sorted.
    pub async fn list_versions(&self) -> LauncherResult<Vec<String>> {
        let mut versions = Vec::new();

        if !self.root.exists() {
            return Ok(versions);
        }

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| LauncherError::Io {
                path: self.root.clone(),
                source: e,
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| LauncherError::Io {
            path: self.root.clone(),
            source: e,
        })? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                versions.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Delete every version directory except `keep`.
    ///
    /// Destructive: there is no retention window and no rollback copy. The
    /// first directory that cannot be removed aborts the pass with
    /// `LauncherError::Cleanup`; what was already removed stays removed.
    pub async fn remove_stale(&self, keep: &str) -> LauncherResult<Vec<PathBuf>> {
        let listed = self.list_versions().await?;
        self.prune(&listed, keep).await
    }

    async fn prune(&self, listed: &[String], keep: &str) -> LauncherResult<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for name in listed {
            if name == keep {
                continue;
            }

            let path = self.root.join(name);
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(|source| LauncherError::Cleanup {
                    path: path.clone(),
                    source,
                })?;

            info!("Removed stale version {}", name);
            removed.push(path);
        }

        Ok(removed)
    }

    /// Create the directory for `version` if it is missing.
    pub async fn ensure_version_dir(&self, version: &str) -> LauncherResult<PathBuf> {
        let path = self.version_dir(version);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| LauncherError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Full reconciliation pass: prune, then make sure `version` has a home.
    ///
    /// A failed prune is logged and handed back alongside the directory so the
    /// caller can keep going with the version it actually needs. Failing to
    /// read the root at all is returned as-is.
    pub async fn reconcile(&self, version: &str) -> LauncherResult<Reconciled> {
        let listed = self.list_versions().await?;
        self.reconcile_listed(&listed, version).await
    }

    async fn reconcile_listed(&self, listed: &[String], version: &str) -> LauncherResult<Reconciled> {
        let (removed, cleanup_error) = match self.prune(listed, version).await {
            Ok(removed) => (removed, None),
            Err(err) if !err.is_fatal() => {
                warn!("Stale version cleanup aborted: {}", err);
                (Vec::new(), Some(err))
            }
            Err(err) => return Err(err),
        };

        let version_dir = self.ensure_version_dir(version).await?;

        Ok(Reconciled {
            version_dir,
            removed,
            cleanup_error,
        })
    }
}

/// Outcome of [`InstallDirManager::reconcile`].
#[derive(Debug)]
pub struct Reconciled {
    pub version_dir: PathBuf,
    pub removed: Vec<PathBuf>,
    pub cleanup_error: Option<LauncherError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_root_only_gains_the_current_version() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstallDirManager::new(temp.path().join("rblx-versions"));

        let outcome = manager.reconcile("v100").await.unwrap();

        assert!(outcome.removed.is_empty());
        assert!(outcome.cleanup_error.is_none());
        assert!(outcome.version_dir.is_dir());
        assert_eq!(manager.list_versions().await.unwrap(), vec!["v100"]);
    }

    #[tokio::test]
    async fn other_versions_are_removed_outright() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("v98")).unwrap();
        std::fs::create_dir_all(root.join("v99").join("content")).unwrap();
        std::fs::write(root.join("v99").join("RobloxPlayerBeta.exe"), b"old").unwrap();
        std::fs::write(root.join("notes.txt"), b"not a version").unwrap();

        let manager = InstallDirManager::new(root.clone());
        let outcome = manager.reconcile("v100").await.unwrap();

        assert_eq!(outcome.removed.len(), 2);
        assert!(!root.join("v98").exists());
        assert!(!root.join("v99").exists());
        assert!(root.join("notes.txt").exists());
        assert_eq!(manager.list_versions().await.unwrap(), vec!["v100"]);
    }

    #[tokio::test]
    async fn current_version_contents_survive() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("v100")).unwrap();
        std::fs::write(root.join("v100").join("RobloxPlayerBeta.exe"), b"exe").unwrap();

        let manager = InstallDirManager::new(root.clone());
        manager.reconcile("v100").await.unwrap();

        assert!(root.join("v100").join("RobloxPlayerBeta.exe").exists());
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("v99")).unwrap();

        let manager = InstallDirManager::new(root);
        manager.reconcile("v100").await.unwrap();
        let before = manager.list_versions().await.unwrap();

        let second = manager.reconcile("v100").await.unwrap();
        let after = manager.list_versions().await.unwrap();

        assert!(second.removed.is_empty());
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn failed_removal_aborts_the_pass_but_keeps_current() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("v98")).unwrap();
        std::fs::create_dir_all(root.join("v99")).unwrap();

        let manager = InstallDirManager::new(root.clone());
        // "v97" vanished after listing, so removing it cannot succeed.
        let listed = ["v98", "v97", "v99"].map(String::from);
        let outcome = manager.reconcile_listed(&listed, "v100").await.unwrap();

        match &outcome.cleanup_error {
            Some(LauncherError::Cleanup { path, .. }) => assert_eq!(path, &root.join("v97")),
            other => panic!("expected a cleanup error, got {:?}", other),
        }
        assert!(outcome.removed.is_empty());
        assert!(!root.join("v98").exists());
        assert!(root.join("v99").is_dir());
        assert!(root.join("v100").is_dir());
    }

    #[tokio::test]
    async fn remove_stale_reports_the_first_failure() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstallDirManager::new(temp.path().to_path_buf());

        let err = manager
            .prune(&["gone".to_string()], "v100")
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Cleanup { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn unreadable_root_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("rblx-versions");
        std::fs::write(&root, b"not a directory").unwrap();

        let err = InstallDirManager::new(root).reconcile("v100").await.unwrap_err();
        assert!(matches!(err, LauncherError::Io { .. }));
    }
}
