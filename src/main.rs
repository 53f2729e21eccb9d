use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use optimus::{app, commands, logging, Config, SendOutcome};

#[derive(Parser)]
#[command(name = "optimus")]
#[command(version)]
#[command(about = "Chat with the financial analysis agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend root url (overrides config and OPTIMUS_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Milliseconds between result polls
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Config file to use instead of ~/.optimus/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the analysis
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show the resolved configuration
    Config {
        /// Write the configuration file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        None => {
            logging::init_file(&config.log_path()?, cli.debug)?;
            app::run(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { query }) => {
            logging::init_stderr(cli.debug)?;
            let outcome = commands::ask(&config, &query.join(" ")).await?;
            Ok(match outcome {
                SendOutcome::Completed { .. } => ExitCode::SUCCESS,
                SendOutcome::SubmitFailed | SendOutcome::PollFailed => ExitCode::FAILURE,
            })
        }
        Some(Commands::Config { init }) => {
            commands::config(&config, cli.config.as_deref(), *init)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
