//! JSON configuration file adapter implementing [`ConfigPort`].
//!
//! Fields missing from the file take their defaults; the result is
//! validated before it is returned.  Without a path, the defaults are
//! used.

use std::path::PathBuf;

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default)]
pub struct JsonConfigFile {
    path: Option<PathBuf>,
}

impl JsonConfigFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let config = match &self.path {
            None => {
                info!("Config: no file given, using defaults");
                SystemConfig::default()
            }
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ConfigError::NotFound(path.display().to_string())
                    } else {
                        ConfigError::Io(e.to_string())
                    }
                })?;
                let config: SystemConfig =
                    serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
                info!("Config: loaded {}", path.display());
                config
            }
        };
        config.validate()?;
        Ok(config)
    }
}
