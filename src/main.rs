// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use strategist_rs::adk::model::create_model;
use strategist_rs::strategist::agent_factory::AgentFactory;
use strategist_rs::strategist::config::{validate_links, StrategistConfig};
use strategist_rs::strategist::console::{Console, TerminalConsole};
use strategist_rs::strategist::nodes::Stage;
use strategist_rs::strategist::pipeline::{build_workflow, WorkflowOptions};
use strategist_rs::strategist::state::StrategyState;
use strategist_rs::strategist::store::FileStore;
use strategist_rs::strategist::tools::fetch::{HttpFetcher, WebFetcher};
use strategist_rs::strategist::tools::registry::ToolRegistry;
use strategist_rs::strategist::tools::research::ResearchTool;
use strategist_rs::strategist::tools::search::TavilySearchTool;
use strategist_rs::strategist::workflow::state::GraphState;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Produce a marketing strategy for a brand
    Run {
        /// The brand brief
        #[arg(short, long, conflicts_with = "brief_file")]
        brief: Option<String>,

        /// Read the brief from a file
        #[arg(long)]
        brief_file: Option<PathBuf>,

        /// Brand website to analyse (repeatable)
        #[arg(short, long = "url")]
        urls: Vec<String>,

        /// Interview the user for requirements before planning
        #[arg(long)]
        gather: bool,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Model provider (openai, anthropic, gemini, groq)
        #[arg(long)]
        provider: Option<String>,

        /// The model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Directory the final document is written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Node executions allowed before the run is aborted
        #[arg(long)]
        max_steps: Option<usize>,
    },
    /// Print the effective configuration as YAML
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            brief,
            brief_file,
            urls,
            gather,
            config,
            provider,
            model,
            output_dir,
            max_steps,
        } => {
            let mut config = StrategistConfig::load(config.as_deref())?;
            if let Some(provider) = provider {
                config.model.provider = Some(provider.parse()?);
            }
            if model.is_some() {
                config.model.model_name = model;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if max_steps.is_some() {
                config.max_steps = max_steps;
            }

            let brief = match (brief, brief_file) {
                (Some(brief), _) => brief,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read brief from {}", path.display()))?,
                (None, None) if gather => String::new(),
                (None, None) => bail!("a brief is required unless --gather is set"),
            };
            let links = validate_links(&urls)?;

            run(config, brief, links, gather).await?;
        }
        Commands::Config { config } => {
            let config = StrategistConfig::load(config.as_deref())?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

async fn run(
    config: StrategistConfig,
    brief: String,
    links: Vec<String>,
    gather: bool,
) -> anyhow::Result<()> {
    let provider = config.model.provider();
    let model_name = config.model.model_name().to_string();
    log::info!("Using provider: {} with model: {}", provider, model_name);
    let model = create_model(provider, model_name)?;

    let fetcher: Arc<dyn WebFetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);

    let registry = ToolRegistry::new();
    registry
        .register(Arc::new(ResearchTool::new(Arc::clone(&fetcher))))
        .await;
    match TavilySearchTool::new(config.search.max_results) {
        Ok(search_tool) => {
            log::info!("Registered tool: web_search");
            registry.register(Arc::new(search_tool)).await;
        }
        Err(e) => log::warn!("Web search disabled: {}", e),
    }

    let console = gather.then(|| Arc::new(TerminalConsole) as Arc<dyn Console>);
    let store = Arc::new(FileStore::new(config.output_dir.clone()));
    let factory = AgentFactory::new(&registry, model, &config);
    let deps = factory.workflow_deps(fetcher, store, console).await?;

    let workflow = build_workflow(
        deps,
        WorkflowOptions {
            max_steps: config.max_steps,
            max_correction_rounds: config.max_correction_rounds,
        },
    )?;

    log::info!(
        "Workflow ready: entry {}, step limit {:?}",
        workflow.entry(),
        workflow.max_steps()
    );

    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling run");
            watcher.cancel();
        }
    });

    let started = chrono::Local::now();
    let mut confirmation = None;
    let mut steps = Box::pin(
        workflow
            .run(StrategyState::new(brief, links))
            .with_cancellation(token)
            .into_stream(),
    );
    while let Some(step) = steps.next().await {
        let step = step?;
        let fields: Vec<String> = StrategyState::written(&step.update)
            .iter()
            .map(|f| f.to_string())
            .collect();
        println!("[{}] wrote: {}", step.node, fields.join(", "));
        if step.node == Stage::SaveFile {
            confirmation = step.update.final_output;
        }
    }

    let elapsed = chrono::Local::now() - started;
    match confirmation {
        Some(message) => println!("{} ({}s)", message, elapsed.num_seconds()),
        None => bail!("run ended without saving a strategy"),
    }
    Ok(())
}
