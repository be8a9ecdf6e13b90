use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// Persisted launcher settings.
///
/// Keys are camelCase on disk so the file stays interchangeable with the
/// settings UI. Unknown keys are ignored and missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LauncherConfig {
    pub auto_update: bool,
    pub cpu_core_limit: u32,
    pub discord_rpc_enabled: bool,
    pub show_notifications: bool,
    pub fast_flags: BTreeMap<String, serde_json::Value>,
    pub fast_flags_studio: BTreeMap<String, serde_json::Value>,
    pub current_skybox: String,
    /// Settings merged into the sandboxed runtime's own config document.
    pub sober: serde_json::Map<String, serde_json::Value>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let sober = serde_json::json!({
            "allow_gamepad_permission": false,
            "bring_back_oof": false,
            "close_on_leave": true,
            "discord_rpc_enabled": false,
            "enable_gamemode": true,
            "graphics_optimization_mode": "performance",
        });

        Self {
            auto_update: true,
            cpu_core_limit: 0,
            discord_rpc_enabled: false,
            show_notifications: true,
            fast_flags: BTreeMap::new(),
            fast_flags_studio: BTreeMap::new(),
            current_skybox: "Default".into(),
            sober: match sober {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }
}

impl LauncherConfig {
    /// Read the settings file; a missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring corrupt settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
