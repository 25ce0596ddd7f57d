//! Per-user configuration store.
//!
//! Credentials and preferences live in a single JSON file at
//! `~/.ticktick/config`. The file is rewritten wholesale on every logical
//! change; there is no locking, so concurrent writers are last-one-wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_DIR_NAME: &str = ".ticktick";
pub const CONFIG_FILE_NAME: &str = "config";
const CONFIG_VERSION: &str = "1.0";

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    #[diagnostic(code(ticktick::config::no_home))]
    NoHomeDir,

    #[error("Failed to read config at {path}: {source}")]
    #[diagnostic(code(ticktick::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config at {path}: {source}")]
    #[diagnostic(code(ticktick::config::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file: {message}")]
    #[diagnostic(
        code(ticktick::config::parse),
        help("The config file is not valid JSON. Fix it by hand or delete it to start over.")
    )]
    Parse { message: String },

    #[error("Unknown preference key: {key}")]
    #[diagnostic(
        code(ticktick::config::unknown_preference),
        help("Valid keys are defaultProject, dateFormat, timeFormat, colorOutput.")
    )]
    UnknownPreference { key: String },

    #[error("Invalid preference value: {message}")]
    #[diagnostic(code(ticktick::config::invalid_preference))]
    InvalidPreference { message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
    /// RFC 3339 timestamp; empty while unauthenticated.
    pub expiry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
    pub date_format: String,
    pub time_format: String,
    pub default_priority: i32,
    pub color_output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            auth: AuthConfig::default(),
            preferences: Preferences::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_project: None,
            date_format: "YYYY-MM-DD".to_string(),
            time_format: "24h".to_string(),
            default_priority: 0,
            color_output: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 300,
        }
    }
}

impl Config {
    pub fn is_authenticated(&self) -> bool {
        !self.auth.access_token.is_empty() && !self.auth.refresh_token.is_empty()
    }

    /// An unparseable or absent expiry counts as expired.
    pub fn is_token_expired(&self) -> bool {
        match self.expiry() {
            Some(expiry) => Utc::now() > expiry,
            None => true,
        }
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.auth.expiry)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Handle to the on-disk config file.
///
/// Every mutation is load-then-mutate-then-save inside one method; nothing
/// exposes partial in-place mutation.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the fixed per-user path (`~/.ticktick/config`).
    pub fn new() -> ConfigResult<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self {
            path: home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        })
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(&self) -> ConfigResult<Config> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Write the whole config. The containing directory is created with
    /// owner-only permissions and the file is readable by the owner alone.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
            }
        }

        let data = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        fs::write(&self.path, data).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        Ok(())
    }

    /// Replace the auth block after a successful login.
    pub fn update_auth(
        &self,
        client_id: &str,
        client_secret: &str,
        access_token: &str,
        refresh_token: &str,
        expiry: DateTime<Utc>,
    ) -> ConfigResult<()> {
        let mut config = self.load()?;
        config.auth = AuthConfig {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expiry: expiry.to_rfc3339(),
        };
        self.save(&config)
    }

    /// Blank the auth block, keeping preferences and cache settings.
    pub fn clear_auth(&self) -> ConfigResult<()> {
        let mut config = self.load()?;
        config.auth = AuthConfig::default();
        self.save(&config)
    }

    pub fn set_preference(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut config = self.load()?;
        match key {
            "defaultProject" => config.preferences.default_project = Some(value.to_string()),
            "dateFormat" => config.preferences.date_format = value.to_string(),
            "timeFormat" => {
                if value != "12h" && value != "24h" {
                    return Err(ConfigError::InvalidPreference {
                        message: "timeFormat must be \"12h\" or \"24h\"".to_string(),
                    });
                }
                config.preferences.time_format = value.to_string();
            }
            "colorOutput" => config.preferences.color_output = value == "true",
            _ => {
                return Err(ConfigError::UnknownPreference {
                    key: key.to_string(),
                });
            }
        }
        self.save(&config)
    }

    pub fn get_preference(&self, key: &str) -> ConfigResult<String> {
        let config = self.load()?;
        match key {
            "defaultProject" => Ok(config.preferences.default_project.unwrap_or_default()),
            "dateFormat" => Ok(config.preferences.date_format),
            "timeFormat" => Ok(config.preferences.time_format),
            "colorOutput" => Ok(config.preferences.color_output.to_string()),
            _ => Err(ConfigError::UnknownPreference {
                key: key.to_string(),
            }),
        }
    }

    pub fn clear_default_project(&self) -> ConfigResult<()> {
        let mut config = self.load()?;
        config.preferences.default_project = None;
        self.save(&config)
    }
}
