//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub api_url: Option<String>,
    pub workspace: Option<String>,
    pub force: bool,
}

/// Write a configuration file populated with defaults
pub fn cmd_init(options: InitOptions) -> Result<Config> {
    let InitOptions {
        base_dir,
        config_path,
        api_url,
        workspace,
        force,
    } = options;

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.init_paths(Some(base_dir));
    config.paths.config_file = config_path;
    if let Some(url) = api_url {
        config.api_url = url;
    }
    config.workspace = workspace;
    config.validate()?;

    config.save()?;
    info!("Initialized lectern in {:?}", config.paths.base_dir);
    Ok(config)
}
