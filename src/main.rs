use std::env;
use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use studentsd::config::{Config, Mode, QueryArgs, ServeArgs};
use studentsd::store::SqliteStore;
use studentsd::{http, ipc};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDENTSD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "studentsd=debug,info"
        } else {
            "studentsd=info,warn"
        })
    });

    let format = env::var("STUDENTSD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // stdout carries the stdio protocol; logs always go to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing();

    match config.command.clone() {
        Some(Mode::Serve(args)) => serve(&config, args),
        Some(Mode::Stdio(args)) => stdio(&config, &args),
        None => stdio(&config, &QueryArgs::default()),
    }
}

fn stdio(config: &Config, args: &QueryArgs) -> anyhow::Result<()> {
    let mut state = ipc::AppState::new(args.defaults());
    if let Some(path) = &config.workspace {
        let store = SqliteStore::open(path)
            .with_context(|| format!("opening workspace {}", path.display()))?;
        info!(workspace = %path.display(), "workspace selected");
        state.store = Some(store);
        state.workspace = Some(path.clone());
    }

    let stdin = io::stdin();
    ipc::serve(&mut state, stdin.lock(), io::stdout())
}

fn serve(config: &Config, args: ServeArgs) -> anyhow::Result<()> {
    let workspace = config.serve_workspace();
    let store = SqliteStore::open(&workspace)
        .with_context(|| format!("opening workspace {}", workspace.display()))?;
    let app = http::router(Arc::new(store), args.query.defaults());

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(args.listen)
            .await
            .with_context(|| format!("binding {}", args.listen))?;
        info!(
            addr = %listener.local_addr()?,
            workspace = %workspace.display(),
            "serving student records"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("http server failed")
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
