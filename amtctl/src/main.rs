mod cli;
mod commands;
mod logging;

use amtconfig::Config;
use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_config(cli.config_dir.as_deref().unwrap_or(""))?;
    logging::init_tracing(cli.verbose, &config);

    if let Some(output) = commands::execute(cli.command, &cli.connection, &config)? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
