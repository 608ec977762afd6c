use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "TOPO_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "topo.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "topo";
const APPLICATION: &str = "topo";

/// `$TOPO_CONFIG_DIR` when set and non-empty, otherwise the platform config
/// directory.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = env_override(ENV_CONFIG_DIR) {
        return Ok(dir);
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn default_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
