// ─── Flag Overrides ───
// Turns the persisted flag maps into the textual form the client's own flag
// parser expects, and fetches the public catalog of known flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};

const FLAG_TRACKER_BASE: &str = "https://raw.githubusercontent.com/MaximumADHD/Roblox-FFlag-Tracker/main";

/// Which flag group a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlagMode {
    Player,
    Studio,
}

impl FlagMode {
    fn catalog_file(self) -> &'static str {
        match self {
            FlagMode::Player => "PCClientApp.json",
            FlagMode::Studio => "PCStudioApp.json",
        }
    }
}

impl std::fmt::Display for FlagMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagMode::Player => write!(f, "player"),
            FlagMode::Studio => write!(f, "studio"),
        }
    }
}

/// Textual form of one flag value. Booleans are case-sensitive.
pub fn flag_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("True".into()),
        Value::Bool(false) => Some("False".into()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce every value of a flag map. Values with no textual form are dropped.
pub fn coerce_flags(flags: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    flags
        .iter()
        .filter_map(|(name, value)| match flag_text(value) {
            Some(text) => Some((name.clone(), text)),
            None => {
                warn!("Dropping flag {} with unsupported value {}", name, value);
                None
            }
        })
        .collect()
}

pub fn catalog_url(mode: FlagMode) -> String {
    format!("{}/{}", FLAG_TRACKER_BASE, mode.catalog_file())
}

/// Fetch the public list of known flags for `mode`.
pub async fn fetch_flag_catalog(fetcher: &dyn Fetcher, mode: FlagMode) -> LauncherResult<Value> {
    let url = catalog_url(mode);
    info!("Fetching {} flag catalog", mode);

    let payload = fetcher.get(&url).await?;
    if !payload.is_success() {
        return Err(LauncherError::Network {
            url,
            reason: format!("HTTP {}", payload.status),
        });
    }

    serde_json::from_slice(&payload.body).map_err(|e| LauncherError::Protocol {
        url,
        reason: e.to_string(),
    })
}
