use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::{Error, JointStatePlotConfig};

const OPENRR_BAG_CONFIG_ENV_NAME: &str = "OPENRR_BAG_JOINT_STATE_PLOT_CONFIG_PATH";

/// Get config path from input or env OPENRR_BAG_JOINT_STATE_PLOT_CONFIG_PATH
pub fn get_joint_state_plot_config(config: Option<PathBuf>) -> Option<PathBuf> {
    if config.is_some() {
        config
    } else {
        std::env::var(OPENRR_BAG_CONFIG_ENV_NAME)
            .map(|s| {
                warn!("### ENV VAR {} is used ###", s);
                PathBuf::from(s)
            })
            .ok()
    }
}

/// Loads the config file, or returns the default config if no path is given.
pub fn resolve_joint_state_plot_config(
    config_path: Option<&Path>,
) -> Result<JointStatePlotConfig, Error> {
    let config = match config_path {
        Some(path) => JointStatePlotConfig::new(path)?,
        None => JointStatePlotConfig::default(),
    };
    debug!(?config_path, ?config, "resolved config");
    Ok(config)
}

/// Initializes logging. The level is read from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
