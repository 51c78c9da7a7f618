use alertbench::{collect, report, Cli, Command, Config, SummaryFormat};
use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    debug!("Configuration: {:?}", config);

    match &cli.command {
        Command::Collect(args) => {
            collect(&args.captures, &config.collect.output).with_context(|| {
                format!(
                    "Failed to collect results into {}",
                    config.collect.output.display()
                )
            })?;
        }
        Command::Report(args) => {
            let format = if args.json {
                SummaryFormat::Json
            } else {
                SummaryFormat::Table
            };
            report(&config.report, &config.charts, format).with_context(|| {
                format!("Failed to report on {}", config.report.input.display())
            })?;
        }
    }

    Ok(())
}
