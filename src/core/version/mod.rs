pub mod resolver;

pub use resolver::{validate_version_identifier, version_url, VersionResolver};
