#![warn(rust_2018_idioms)]

mod error;
mod joint_state_plot_config;
pub mod utils;

use std::path::Path;

use openrr_bag::ExtractedSeries;
use tracing::{info, warn};

pub use crate::{error::*, joint_state_plot_config::*};

/// Extracts the joint configured by `config` from the bag at `bag_path`.
pub fn extract_joint_state(
    bag_path: &Path,
    config: &JointStatePlotConfig,
) -> Result<ExtractedSeries, Error> {
    let series = config.extractor().extract(bag_path)?;
    if series.is_empty() {
        warn!(
            "{} is not found in {} of {:?}",
            config.joint_name, config.topic, bag_path
        );
    } else {
        info!(
            joint_name = %config.joint_name,
            records = series.len(),
            duration = series.duration(),
            "extracted joint states"
        );
    }
    Ok(series)
}

/// Extracts the configured joint from the bag and shows it in a plot window.
pub fn plot_joint_state(bag_path: &Path, config: &JointStatePlotConfig) -> Result<(), Error> {
    let series = extract_joint_state(bag_path, config)?;
    openrr_bag_gui::joint_state_plot(&series, &config.joint_name, config.column)?;
    Ok(())
}
