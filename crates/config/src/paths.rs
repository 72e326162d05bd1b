//! Filesystem locations under `~/.agentdesk`

use std::path::{Path, PathBuf};

/// Root data directory (~/.agentdesk)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".agentdesk"))
        .unwrap_or_else(|| PathBuf::from(".agentdesk"))
}

/// Configuration file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Interaction log directory
pub fn interactions_dir() -> PathBuf {
    data_dir().join("interactions")
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Ensure directory exists
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
