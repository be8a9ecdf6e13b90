use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::Regex;
use tracing::debug;

pub const UNKNOWN_GAME: &str = "Unknown Game";

const JOIN_MARKER: &str = "Joining game";

/// Place id of the most recent join recorded in the client's logs.
///
/// Logs are read newest first and each one from its last line up, so the
/// latest join wins even when an older session left a later-named file.
pub async fn latest_place_id(log_dirs: &[PathBuf]) -> Option<String> {
    let pattern = Regex::new(r"place (\d+)").ok()?;

    for path in logs_newest_first(log_dirs).await {
        let Ok(bytes) = tokio::fs::read(&path).await else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        let found = content
            .lines()
            .rev()
            .filter(|line| line.contains(JOIN_MARKER))
            .find_map(|line| pattern.captures(line))
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string());
        if found.is_some() {
            debug!("Found place id in {:?}", path);
            return found;
        }
    }
    None
}

pub async fn current_game_name(log_dirs: &[PathBuf]) -> String {
    latest_place_id(log_dirs)
        .await
        .unwrap_or_else(|| UNKNOWN_GAME.to_string())
}

async fn logs_newest_first(log_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut logs: Vec<(PathBuf, SystemTime)> = Vec::new();
    for dir in log_dirs {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_log_file(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            logs.push((path, modified));
        }
    }
    logs.sort_by(|a, b| b.1.cmp(&a.1));
    logs.into_iter().map(|(path, _)| path).collect()
}

fn is_log_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "log")
}
