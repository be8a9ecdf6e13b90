use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the bootstrapper core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Malformed response from {url}: {reason}")]
    Protocol { url: String, reason: String },

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Install lifecycle ───────────────────────────────
    #[error("Could not remove stale version {path:?}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Auto-download is disabled. Enable it in settings to install version {version}")]
    UpdateDisabled { version: String },

    #[error("Roblox is currently running. Close it before updating")]
    ProgramRunning,

    #[error("A launch is already in progress for {0:?}")]
    LaunchInProgress(PathBuf),

    // ── Archive ─────────────────────────────────────────
    #[error("Rejected archive entry {entry:?}: {reason}")]
    Extraction { entry: String, reason: String },

    #[error("Could not mark {path:?} as executable: {reason}")]
    Permission { path: PathBuf, reason: String },

    // ── Serialization ───────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("TOML error: {0}")]
    Toml(String),

    // ── Process ─────────────────────────────────────────
    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{0} is not supported on this platform")]
    Unsupported(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Whether this error must abort the launch attempt.
    ///
    /// Cleanup of stale versions is best-effort; everything else that
    /// reaches the pipeline's top level stops the attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LauncherError::Cleanup { .. })
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for the UI bridge ─────────────────────
// The UI collaborator only ever shows the message.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
