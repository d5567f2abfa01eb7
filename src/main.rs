use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bloodwork_analyzer::{
    build_orchestrator, config::Config, create_router, middleware,
    models::{DEFAULT_QUERY, DISCLAIMER},
    pipeline::AnalysisMode, AppState,
};

#[derive(Parser)]
#[command(name = "bloodwork-analyzer")]
#[command(about = "Professional Blood Test Report Analyzer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Bind host, overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a local PDF report without starting the server
    Analyze {
        /// Path to the blood test report
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = DEFAULT_QUERY)]
        query: String,

        /// comprehensive or medical_only
        #[arg(short, long, default_value = "comprehensive")]
        mode: String,
    },
}

fn init_tracing() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloodwork_analyzer=debug,tower_http=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Analyze { file, query, mode } => analyze(config, file, query, mode).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let orchestrator = build_orchestrator(&config)?;
    let state = AppState::new(Arc::new(orchestrator), config.upload.clone());
    let app = middleware::apply(create_router(state), &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST and PORT must form a valid socket address")?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn analyze(config: Config, file: PathBuf, query: String, mode: String) -> anyhow::Result<()> {
    if !file.is_file() {
        anyhow::bail!("No report found at {}", file.display());
    }
    let orchestrator = build_orchestrator(&config)?;
    let mode = AnalysisMode::resolve(&mode);
    info!(file = %file.display(), mode = %mode, "Running local analysis");

    let query = match query.trim() {
        "" => DEFAULT_QUERY,
        q => q,
    };

    match orchestrator.run(mode, query, &file).await {
        Ok(outcome) => {
            println!("{}\n\n{}", outcome.analysis, DISCLAIMER);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Local analysis failed");
            Err(e).context("Error running medical analysis")
        }
    }
}
