mod config;

pub use config::Config;

use std::path::PathBuf;

/// Returns `~/.config/breathwork[-dev]/` based on BREATHWORK_ENV.
///
/// Set BREATHWORK_ENV=dev to use development data directory.
/// BREATHWORK_HOME overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = if let Ok(home) = std::env::var("BREATHWORK_HOME") {
        PathBuf::from(home)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");

        let env = std::env::var("BREATHWORK_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("breathwork-dev")
        } else {
            base_dir.join("breathwork")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
