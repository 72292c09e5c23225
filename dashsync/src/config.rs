use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".dashsync.yaml";
pub const ENV_URL: &str = "DASHSYNC_URL";
pub const ENV_APIKEY: &str = "DASHSYNC_APIKEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("server url not specified (use --url, DASHSYNC_URL or the config file)")]
    MissingUrl,
    #[error("api key not specified (use --apikey, DASHSYNC_APIKEY or the config file)")]
    MissingApiKey,
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One layer of optional settings: flags, environment or config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub apikey: Option<String>,
}

impl ConfigLayer {
    pub fn from_env() -> Self {
        Self {
            url: read_env(ENV_URL),
            apikey: read_env(ENV_APIKEY),
        }
    }

    fn or(self, fallback: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            url: self.url.or(fallback.url),
            apikey: self.apikey.or(fallback.apikey),
        }
    }
}

/// Settings resolved once at startup and handed to the client and engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub url: String,
    /// Either an API key or `user:password`.
    pub apikey: String,
}

impl SyncConfig {
    /// Flags win over the environment, which wins over the config file.
    pub fn load(flags: ConfigLayer, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => read_config_file(path)?,
            None => {
                let cwd = std::env::current_dir().ok();
                let home = dirs::home_dir();
                match find_config_file(cwd.as_deref(), home.as_deref()) {
                    Some(path) => read_config_file(&path)?,
                    None => ConfigLayer::default(),
                }
            }
        };
        Self::from_layers(flags, ConfigLayer::from_env(), file)
    }

    pub fn from_layers(
        flags: ConfigLayer,
        env: ConfigLayer,
        file: ConfigLayer,
    ) -> Result<Self, ConfigError> {
        let merged = flags.or(env).or(file);
        let url = merged
            .url
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let apikey = merged
            .apikey
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok(Self { url, apikey })
    }

    /// Absolute link for a server-relative path such as `/d/abc/cpu`.
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// `.dashsync.yaml` in the working directory first, then in the home directory.
pub fn find_config_file(cwd: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    [cwd, home]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

pub fn read_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
