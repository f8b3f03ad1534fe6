mod cli;
mod config;
mod error;
mod model;
mod orchestration;
mod search;

use std::sync::Arc;

use clap::Parser;

use model::{GenaiModel, ModelClient};
use orchestration::orchestrator::Orchestrator;
use search::SearchClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = config::load_config(&cli)?;
    tracing::info!(
        model = %config.model,
        provider = ?config.search_provider,
        max_subtasks = config.max_subtasks,
        "Config loaded"
    );

    match cli.command {
        cli::Commands::Ask { ref query, .. } => {
            let model: Arc<dyn ModelClient> = Arc::new(GenaiModel::new(config.model.clone()));
            let search = SearchClient::from_config(&config)?;
            let orchestrator = Orchestrator::new(model, search, &config);

            let answer = orchestrator.run(query).await;

            println!("{}", answer.text);

            if !answer.sources.is_empty() {
                println!("\nSources:");
                for url in &answer.sources {
                    println!("  - {url}");
                }
            }

            if answer.partial {
                eprintln!("\n[note] one or more research subtasks failed; this answer may be incomplete");
            }
        }
    }

    Ok(())
}
