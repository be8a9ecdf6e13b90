pub mod archive;
pub mod installer;
pub mod manager;

pub use archive::{extract_archive, ExtractSummary};
pub use installer::{mark_executable, ArchiveInstaller, InstalledProgram};
pub use manager::{InstallDirManager, Reconciled};
