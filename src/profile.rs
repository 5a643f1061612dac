//! Stored login profile.
//!
//! Credential persistence is the CLI's concern; the core rebuilds a
//! fresh `Session` from this profile on every run and never stores it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct Profile {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Profile {
    /// Profile location: `~/.config/odocal/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("odocal");
        Ok(config_dir.join("config.toml"))
    }

    /// Prepend https:// when the user typed a bare host.
    pub fn normalize_url(raw: &str) -> String {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        }
    }

    pub fn load() -> Result<Option<Profile>> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let profile = toml::from_str(&content).context("Profile file is malformed")?;
        Ok(Some(profile))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Could not write {}", path.display()))?;
        Ok(())
    }

    pub fn delete() -> Result<()> {
        let path = Self::config_path()?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Could not remove {}", path.display())),
        }
    }

    pub fn to_session(&self) -> odocal_core::Session {
        odocal_core::Session::new(&self.url, &self.database, &self.username, &self.password)
    }
}
