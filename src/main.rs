mod client;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod server;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::session::{ClientSession, today};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::generate::GenerateArgs;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::clipboard::SystemClipboard;
use crate::infra::llm::GeminiClient;
use crate::infra::local_storage::FileStorage;
use crate::infra::ticket_api::HttpTicketApi;
use crate::services::LanguageModelService;

#[derive(Parser)]
#[command(
    name = "ticketzero",
    author,
    version,
    about = "Turns angry bug reports into triaged tickets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ticket analysis server.
    Serve(ServeArgs),
    /// Start the interactive triage client.
    App(ClientArgs),
    /// Triage a single bug report and print the ticket.
    Generate {
        #[command(flatten)]
        client: ClientArgs,
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Ask the server which models the configured key can use.
    Models(ClientArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on, e.g. 127.0.0.1:3000.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Args)]
struct ClientArgs {
    /// Base URL of a running `ticketzero serve`.
    #[arg(short, long)]
    server: Option<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ticketzero=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Serve(args) => run_serve(args).await,
        Commands::App(client) => {
            let config = AppConfig::load()?;
            let api = ticket_api(&config, client);
            let session = open_session(&config)?;
            cmd::app::run(session, &api, &SystemClipboard).await
        }
        Commands::Generate { client, args } => {
            let config = AppConfig::load()?;
            let api = ticket_api(&config, client);
            let session = open_session(&config)?;
            cmd::generate::run(session, args, &api, &SystemClipboard).await
        }
        Commands::Models(client) => {
            let config = AppConfig::load()?;
            cmd::models::run(&ticket_api(&config, client)).await
        }
    }
}

async fn run_serve(args: ServeArgs) -> AppResult<()> {
    let config = AppConfig::load()?;

    let language_model: Arc<dyn LanguageModelService> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    ));
    let context = AppContext::new(config, language_model);

    cmd::serve::run(context, args.bind).await
}

fn ticket_api(config: &AppConfig, client: ClientArgs) -> HttpTicketApi {
    HttpTicketApi::new(client.server.unwrap_or_else(|| config.server_url.clone()))
}

fn open_session(config: &AppConfig) -> AppResult<ClientSession> {
    let storage = Arc::new(FileStorage::load()?);
    ClientSession::open(storage, &today(), config.daily_limit)
}
