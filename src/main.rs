use anyhow::Context;
use clap::Parser;
use climate_extremes::cli::{run, Cli};
use climate_extremes::utils::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref()).context("failed to initialise logging")?;

    let command = command_name(&cli);
    run(cli).with_context(|| format!("{} failed", command))
}

fn command_name(cli: &Cli) -> &'static str {
    use climate_extremes::cli::Commands;
    match cli.command {
        Commands::Thresholds { .. } => "thresholds",
        Commands::Detect { .. } => "detect",
        Commands::Batch { .. } => "batch",
        Commands::Validate { .. } => "validate",
    }
}
