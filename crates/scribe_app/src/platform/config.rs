//! Application settings, stored as RON next to the working directory.
//!
//! ```ron
//! (
//!     base_url: "https://projectx-production-d880.up.railway.app",
//!     connect_timeout_secs: 10,
//!     request_timeout_secs: Some(900),
//!     output_dir: "books",
//!     identity: Some((uid: "uid-123", display_name: Some("Ada"), email: None, photo_url: None)),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use scribe_engine::{
    AtomicFileWriter, ClientSettings, ProviderUser, DEFAULT_BASE_URL, FALLBACK_TOTAL_BYTES,
};
use scribe_logging::{scribe_info, scribe_warn};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "scribe.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IdentityConfig {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl From<IdentityConfig> for ProviderUser {
    fn from(identity: IdentityConfig) -> Self {
        ProviderUser {
            uid: identity.uid,
            display_name: identity.display_name,
            email: identity.email,
            photo_url: identity.photo_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// `None` leaves generation time unbounded.
    pub request_timeout_secs: Option<u64>,
    pub fallback_total_bytes: u64,
    pub output_dir: PathBuf,
    /// Signed-in user; written by `scribe sign-in`, cleared by `scribe sign-out`.
    pub identity: Option<IdentityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            fallback_total_bytes: FALLBACK_TOTAL_BYTES,
            output_dir: PathBuf::from("books"),
            identity: None,
        }
    }
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            fallback_total_bytes: self.fallback_total_bytes,
        }
    }
}

/// Reads the config at `path`. Missing or unreadable files fall back to defaults.
pub(crate) fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            scribe_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            scribe_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            scribe_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

pub(crate) fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(config, pretty).context("serialize config")?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("config path {path:?} has no file name"))?;

    AtomicFileWriter::new(dir)
        .write(file_name, content.as_bytes())
        .with_context(|| format!("write config to {path:?}"))?;
    Ok(())
}
