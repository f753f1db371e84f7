//! Server configuration.
//!
//! Loaded from `~/.config/datefinder/config.toml` (or the path in
//! `DATEFINDER_CONFIG`). Every field has a default, so a missing file
//! yields a usable development setup with an empty roster.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use datefinder_core::Roster;

fn default_port() -> u16 {
    4250
}

fn default_calendar_name() -> String {
    "Podcast Schedule".to_string()
}

fn default_confirm_template() -> String {
    "{description}".to_string()
}

fn default_unconfirm_template() -> String {
    "Date {date} has been unconfirmed.".to_string()
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where the JSON store snapshots live. Defaults to the platform
    /// data directory.
    pub data_dir: Option<PathBuf>,

    /// Known users: id -> display name. Requests from ids outside this
    /// map are rejected.
    #[serde(default)]
    pub users: BTreeMap<String, String>,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            data_dir: None,
            users: BTreeMap::new(),
            export: ExportConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Public .ics export settings.
#[derive(Deserialize, Clone)]
pub struct ExportConfig {
    /// Path of the published .ics file; export is disabled when unset.
    pub ical_path: Option<PathBuf>,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            ical_path: None,
            calendar_name: default_calendar_name(),
        }
    }
}

/// Webhook notification settings.
///
/// Templates support the `{date}`, `{date_formatted}`, `{description}`
/// and `{confirmed_by}` placeholders.
#[derive(Deserialize, Clone)]
pub struct NotifyConfig {
    /// URLs that receive a JSON message on confirm/unconfirm;
    /// notifications are disabled when empty.
    #[serde(default)]
    pub webhook_urls: Vec<String>,

    #[serde(default = "default_confirm_template")]
    pub confirm_template: String,

    #[serde(default = "default_unconfirm_template")]
    pub unconfirm_template: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            webhook_urls: Vec::new(),
            confirm_template: default_confirm_template(),
            unconfirm_template: default_unconfirm_template(),
        }
    }
}

impl ServerConfig {
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("DATEFINDER_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("datefinder");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not
    /// exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(ServerConfig::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        Ok(dirs::data_dir()
            .context("Could not determine data directory")?
            .join("datefinder"))
    }

    pub fn roster(&self) -> Roster {
        self.users
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [users]
            alice = "Alice A."
            bob = "Bob B."
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 4250);
        assert!(config.export.ical_path.is_none());
        assert!(config.notify.webhook_urls.is_empty());
        assert_eq!(config.notify.confirm_template, "{description}");
        assert_eq!(config.users.len(), 2);
    }

    #[test]
    fn test_missing_file_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4250);
        assert!(config.users.is_empty());
        assert_eq!(config.export.calendar_name, "Podcast Schedule");
    }

    #[test]
    fn test_full_config_parses() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 8080
            data_dir = "/var/lib/datefinder"

            [users]
            alice = "Alice A."

            [export]
            ical_path = "/srv/www/schedule.ics"
            calendar_name = "Live Schedule"

            [notify]
            webhook_urls = ["https://hooks.example.com/abc"]
            confirm_template = "Confirmed: {description} on {date_formatted}"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.export.ical_path.as_deref(),
            Some(std::path::Path::new("/srv/www/schedule.ics"))
        );
        assert_eq!(config.notify.webhook_urls.len(), 1);
        // Unset template keeps its default
        assert_eq!(
            config.notify.unconfirm_template,
            "Date {date} has been unconfirmed."
        );
    }
}
