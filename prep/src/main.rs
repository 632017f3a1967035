use anyhow::{Context, Result};
use prep::config::Config;
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Turn raw image-caption records into masked pretraining features.
struct Args {
    #[structopt(long, default_value = "prep.json5")]
    /// configuration file
    pub config_file: PathBuf,
    #[structopt(long)]
    /// input JSON lines file of raw records
    pub input: PathBuf,
    #[structopt(long)]
    /// output JSON lines file of encoded features
    pub output: PathBuf,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let Args {
        config_file,
        input,
        output,
    } = Args::from_args();
    let config = Arc::new(
        Config::open(&config_file)
            .with_context(|| format!("failed to load config file '{}'", config_file.display()))?,
    );

    prep::start(config, &input, &output)?;

    Ok(())
}
