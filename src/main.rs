use std::process::ExitCode;

use anyhow::Context;
use arbiter::adapter::inbound::cli::command::{
    Cli, ColorChoice, Commands, ConfigCommand, StrategyCommand,
};
use arbiter::adapter::inbound::cli::output::{self, OutputConfig};
use arbiter::adapter::inbound::cli::{backtest, config, run, scan, strategy};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match dispatch(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => run::execute(&args)
            .await
            .with_context(|| format!("run with {}", args.config.display()))?,
        Commands::Scan(args) => scan::execute(&args)
            .await
            .with_context(|| format!("scan with {}", args.config.display()))?,
        Commands::Backtest(args) => backtest::execute(&args)
            .await
            .with_context(|| format!("backtest with {}", args.config.display()))?,
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force)?,
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config)?,
        Commands::Config(ConfigCommand::Validate(args)) => {
            config::execute_validate(&args.config)?;
        }
        Commands::Strategies(StrategyCommand::List) => strategy::list()?,
        Commands::Strategies(StrategyCommand::Explain { name }) => strategy::explain(&name)?,
    }
    Ok(())
}
