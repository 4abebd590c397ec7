mod error;
mod events;
mod handler;
mod orchestrator;
mod providers;
mod roles;
mod selector;
mod server;
mod telemetry;

use anyhow::Context;
use carechat_common::config;
use carechat_common::session::JsonlLogger;
use clap::Parser;
use handler::RequestHandler;
use providers::openai::OpenAiChatModel;
use roles::RoleRegistry;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "carechat")]
#[command(about = "Emotion analysis and self-care recommendations from a scripted group chat")]
struct Cli {
    /// Model identifier (overrides MODEL_ID)
    #[arg(long)]
    model: Option<String>,

    /// Model API base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 7860)]
    port: u16,

    /// Maximum messages per conversation, opener included
    #[arg(long, env = "MAX_ROUNDS", default_value_t = orchestrator::DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Append every turn as JSONL to this file
    #[arg(long, env = "TRANSCRIPT_LOG")]
    transcript_log: Option<PathBuf>,

    /// Answer a single message on stdout instead of serving the form
    #[arg(long)]
    once: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing so clap's env fallbacks see `.env` values too.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json, "info");

    let model_config = config::load_config()?.with_overrides(cli.model, cli.base_url);
    let client = config::build_http_client().context("failed to build HTTP client")?;
    tracing::info!(model = %model_config.model, base_url = %model_config.base_url, "model configured");

    let logger = JsonlLogger::from_optional_path(cli.transcript_log.as_deref());
    if let Some(path) = cli.transcript_log.as_deref().filter(|_| logger.is_enabled()) {
        tracing::info!(path = %path.display(), "appending turns to transcript log");
    }
    let handler = Arc::new(RequestHandler::new(
        RoleRegistry::default(),
        Arc::new(OpenAiChatModel::new(client, model_config)),
        cli.max_rounds,
        logger,
    ));

    if let Some(message) = cli.once {
        println!("{}", handler.handle(&message).await);
        return Ok(());
    }

    let addr = SocketAddr::new(cli.host, cli.port);
    server::run(handler, addr).await
}
