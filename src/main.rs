use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use threadlens::server::{create_router, AppState, SharedState};
use threadlens::{Analyzer, Config};
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "threadlens", about = "Summarize a Reddit thread and score comment relevance")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web front end (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Analyze one thread and print the report as JSON
    Analyze {
        url: String,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        summary_model: Option<String>,
        #[arg(long)]
        relevance_model: Option<String>,
    },
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
        .add_directive("threadlens=debug".parse()?)
        .add_directive("axum::rejection=trace".parse()?);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let mut config = Config::load_auto(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(Arc::new(config)).await
        }
        Command::Analyze {
            url,
            limit,
            summary_model,
            relevance_model,
        } => {
            let limit = config.analysis.resolve_limit(limit)?;
            let summary_model = summary_model.unwrap_or_else(|| config.llm.summary_model.clone());
            let relevance_model =
                relevance_model.unwrap_or_else(|| config.llm.relevance_model.clone());

            let analyzer = Analyzer::new(Arc::new(config));
            let record = analyzer
                .process(&url, limit, &summary_model, &relevance_model)
                .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("Failed to serialize report")?
            );
            Ok(())
        }
    }
}

async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    info!("threadlens web front end starting");

    let listener_addr = config.listen_addr();
    info!("Binding to {}", listener_addr);

    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        analyzer: Arc::new(Analyzer::new(config.clone())),
    });

    let app = create_router(state);

    let listener = TcpListener::bind(&listener_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listener_addr))?;
    info!("Server listening on http://{}", listener_addr);

    axum::serve(listener, app).await.map_err(|e| {
        error!("Server error: {}", e);
        e.into()
    })
}
