use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

pub const WINDOWS_PLAYER_EXE: &str = "RobloxPlayerBeta.exe";
pub const WINDOWS_STUDIO_EXE: &str = "RobloxStudioBeta.exe";
pub const MAC_PLAYER_BUNDLE: &str = "RobloxPlayer.app";
pub const MAC_PLAYER_BINARY: &str = "RobloxPlayer.app/Contents/MacOS/RobloxPlayer";

/// Flatpak application id of the sandboxed runtime used on Linux.
pub const SOBER_APP_ID: &str = "org.vinegarhq.Sober";
/// Flatpak application id of the runtime that hosts Studio on Linux.
pub const VINEGAR_APP_ID: &str = "org.vinegarhq.Vinegar";

/// Platform families the bootstrapper knows how to drive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux: the program runs inside an external flatpak runtime that
    /// owns installation and updates.
    LinuxSandboxed,
}

impl Platform {
    /// Detect the host platform family.
    pub fn current() -> LauncherResult<Self> {
        if cfg!(target_os = "windows") {
            Ok(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Ok(Platform::MacOs)
        } else if cfg!(target_os = "linux") {
            Ok(Platform::LinuxSandboxed)
        } else {
            Err(LauncherError::Unsupported(std::env::consts::OS.to_string()))
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::MacOs => write!(f, "macos"),
            Platform::LinuxSandboxed => write!(f, "linux"),
        }
    }
}

/// Build flavour requested from the version service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryKind {
    WindowsPlayer,
    WindowsStudio64,
    MacPlayer,
}

impl BinaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryKind::WindowsPlayer => "WindowsPlayer",
            BinaryKind::WindowsStudio64 => "WindowsStudio64",
            BinaryKind::MacPlayer => "MacPlayer",
        }
    }
}

impl std::fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
