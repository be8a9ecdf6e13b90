// ─── Version Resolver ───
// Asks the client-settings service which build is currently required.

use serde::Deserialize;
use tracing::info;

use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::BinaryKind;

const CLIENT_VERSION_URL: &str = "https://clientsettings.roblox.com/v2/client-version";

/// Response body of the client-version endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientVersionResponse {
    #[serde(default)]
    pub version: Option<String>,
    /// The build label that names the CDN artifacts (`version-xxxxxxxx`).
    pub client_version_upload: String,
}

pub fn version_url(kind: BinaryKind) -> String {
    format!("{}/{}", CLIENT_VERSION_URL, kind.as_str())
}

pub struct VersionResolver<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> VersionResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch the definitive version identifier for `kind`.
    pub async fn resolve(&self, kind: BinaryKind) -> LauncherResult<String> {
        let url = version_url(kind);
        info!("Resolving current {} version...", kind);

        let payload = self.fetcher.get(&url).await?;
        if !payload.is_success() {
            return Err(LauncherError::Network {
                url,
                reason: format!("version service answered HTTP {}", payload.status),
            });
        }

        let response: ClientVersionResponse =
            serde_json::from_slice(&payload.body).map_err(|e| LauncherError::Protocol {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let version = response.client_version_upload.trim().to_string();
        validate_version_identifier(&version).map_err(|reason| LauncherError::Protocol {
            url: url.clone(),
            reason,
        })?;

        info!("Current {} version: {}", kind, version);
        Ok(version)
    }
}

/// The identifier becomes a directory name under the install root, so it
/// must be exactly one plain path component.
pub fn validate_version_identifier(version: &str) -> Result<(), String> {
    if version.is_empty() {
        return Err("empty version identifier".into());
    }
    if version == "." || version == ".." {
        return Err(format!("invalid version identifier {:?}", version));
    }
    if version
        .chars()
        .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control())
    {
        return Err(format!(
            "version identifier {:?} contains path characters",
            version
        ));
    }
    Ok(())
}
