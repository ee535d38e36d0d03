//! Version string for the ibot CLI.

/// The current version of ibot, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_string() -> String {
    format!("ibot {}", VERSION)
}
