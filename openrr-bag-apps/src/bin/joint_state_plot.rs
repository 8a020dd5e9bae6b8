use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use openrr_bag::Column;
use tracing::debug;

/// Plot the position or velocity of a joint recorded in a rosbag2 bag.
#[derive(Parser, Debug)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Opt {
    /// Path to the bag directory or `.db3` file.
    #[clap(value_parser)]
    bag_path: PathBuf,
    /// Name of the joint to plot.
    #[clap(short, long)]
    joint_name: Option<String>,
    /// Topic of the joint states.
    #[clap(short, long)]
    topic: Option<String>,
    /// Column to plot: timestamp, position or velocity.
    #[clap(long)]
    column: Option<Column>,
    /// Path to the setting file.
    #[clap(short, long, value_parser)]
    config_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    openrr_bag_apps::utils::init_tracing();
    let opt = Opt::parse();
    debug!("opt: {:?}", opt);

    let config_path = openrr_bag_apps::utils::get_joint_state_plot_config(opt.config_path);
    let mut config =
        openrr_bag_apps::utils::resolve_joint_state_plot_config(config_path.as_deref())?;
    // Command line options take priority over the setting file.
    if let Some(joint_name) = opt.joint_name {
        config.joint_name = joint_name;
    }
    if let Some(topic) = opt.topic {
        config.topic = topic;
    }
    if let Some(column) = opt.column {
        config.column = column;
    }

    openrr_bag_apps::plot_joint_state(&opt.bag_path, &config)?;
    Ok(())
}
