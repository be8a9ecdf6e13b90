// ─── nullstrap Core ───
// Install/update/launch pipeline for the Roblox client.
//
// Architecture:
//   core/
//     version/    Client version lookup
//     install/    Version directories, archive download + extraction
//     mods/       Flag overrides, skybox textures, sandboxed runtime config
//     strategy/   Windows / macOS / Linux (flatpak) behaviour, Studio
//     launch/     Command lines + process spawner
//     logs        Current place from the client's log files
//     pipeline    resolve -> reconcile -> install -> stage -> spawn
//     downloader/ HTTP seam with progress
//     state/      Settings + application state

pub mod cleaner;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod install;
pub mod launch;
pub mod logs;
pub mod mods;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod state;
pub mod strategy;
pub mod version;
