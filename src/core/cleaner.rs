// ─── Cleaner ───
// Prunes old log and cache files the client leaves behind.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::paths::RuntimePaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CleanTarget {
    Logs,
    Cache,
}

impl CleanTarget {
    pub fn dirs(self, paths: &RuntimePaths) -> Vec<PathBuf> {
        match self {
            CleanTarget::Logs => paths.log_dirs(),
            CleanTarget::Cache => paths.cache_dirs(),
        }
    }
}

/// Delete regular files directly inside `dirs` that were last modified more
/// than `max_age` ago. Missing directories and undeletable files are skipped.
pub async fn clean_old_files(dirs: &[PathBuf], max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for dir in dirs {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            continue;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);

            if age > max_age && tokio::fs::remove_file(entry.path()).await.is_ok() {
                debug!("Removed {:?}", entry.path());
                removed += 1;
            }
        }
    }

    info!("Cleaned {} files", removed);
    removed
}

pub fn days(count: u32) -> Duration {
    Duration::from_secs(u64::from(count) * 24 * 60 * 60)
}
