use clap::{Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use tracing::debug;

#[derive(Debug, Parser)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    #[clap(subcommand)]
    subcommand: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate JSON schema for the specified config file.
    Schema {
        /// Kind of config file.
        #[clap(value_enum, ignore_case = true)]
        kind: ConfigKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKind {
    JointStatePlotConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    debug!(?args);

    match args.subcommand {
        Command::Schema { kind } => {
            let schema = match kind {
                ConfigKind::JointStatePlotConfig => {
                    schema_for!(openrr_bag_apps::JointStatePlotConfig)
                }
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}
