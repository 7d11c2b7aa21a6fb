mod cli;
mod config;
mod pollinations_client;

use std::io;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::config::{Config, ConfigOverrides};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Send a single message and print the reply
    #[arg(short, long)]
    input: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Send a single message and print the reply
        #[arg(short, long)]
        input: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct ApiArgs {
    /// Chat completion endpoint [env: CONFUCIUS_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Model name sent with each request [env: CONFUCIUS_MODEL]
    #[arg(long, global = true)]
    model: Option<String>,

    /// Request timeout in seconds [env: CONFUCIUS_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

impl From<ApiArgs> for ConfigOverrides {
    fn from(args: ApiArgs) -> Self {
        Self {
            api_url: args.api_url,
            model: args.model,
            timeout_secs: args.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let (input, verbose) = match cli.command {
        Some(Commands::Chat { input, verbose }) => (input.or(cli.input), verbose || cli.verbose),
        None => (cli.input, cli.verbose),
    };

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Logs go to stderr so they never interleave with the transcript.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("Failed to set tracing subscriber")?;

    let config = Config::load(cli.api.into())?;
    info!("Starting Confucius chat");
    debug!(?config, "Resolved configuration");

    let interactive = input.is_none();
    let mut chat_context = ChatContext::new(Box::new(io::stdout()), input, interactive, config);
    chat_context.run().await
}
