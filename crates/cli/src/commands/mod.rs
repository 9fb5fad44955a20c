pub mod init;
pub mod model;

use std::path::{Path, PathBuf};

use crate::config::{BridgeConfig, CONFIG_FILE_NAME};
use crate::error::Result;

/// Resolve the config path: explicit flag or the file in the current
/// directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<BridgeConfig> {
    BridgeConfig::load(&config_path(explicit))
}
