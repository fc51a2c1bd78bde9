// src/main.rs — issuecost service entry point

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use issuecost::api::{start_server, ApiState};
use issuecost::core::orchestrator::AnalysisOrchestrator;
use issuecost::core::session::SessionStore;
use issuecost::estimator::ComplexityEstimator;
use issuecost::github::GithubClient;
use issuecost::infra::config::Config;
use issuecost::infra::logger::init_logging;
use issuecost::provider::resolver;

#[derive(Parser)]
#[command(
    name = "issuecost",
    version,
    about = "Estimate complexity and development cost of open GitHub issues"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Log level filter (e.g. info, debug, issuecost=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let provider = resolver::from_config(&config.model)?;
    tracing::info!(provider = provider.id(), "model provider configured");
    if config.github.token.is_none() {
        tracing::warn!("no GITHUB_TOKEN set; GitHub rate limits will be low");
    }

    let store = Arc::new(SessionStore::new(config.sessions.ttl_minutes));
    let fetcher = Arc::new(GithubClient::new(config.github.clone()));
    let estimator = Arc::new(
        ComplexityEstimator::new(Arc::clone(&provider), config.estimator.fallback_hours)
            .with_model_params(config.model.max_tokens, config.model.temperature),
    );

    let state = ApiState {
        provider_id: provider.id().to_string(),
        orchestrator: Arc::new(AnalysisOrchestrator::new(store, fetcher, estimator)),
    };

    start_server(&config.server, state).await
}
