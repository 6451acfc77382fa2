// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tagqd`: the HTTP API (§4.2) plus the Worker Supervisor (§4.3) that
//! dispatches jobs to a pool of `worker-child` processes — this same
//! binary, re-invoked with the hidden `worker-child` subcommand.

mod config;
mod error;
mod routes;
mod state;
mod worker_child;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tagq_engine::{CallbackClient, WorkerPool};
use tagq_storage::{Layout, StatusStore};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "tagqd")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and Worker Supervisor (the default).
    Serve,
    /// Run as a single worker-child, speaking NDJSON on stdin/stdout.
    /// Spawned by the pool; not intended to be invoked directly.
    #[command(hide = true)]
    WorkerChild {
        #[arg(long)]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::WorkerChild { root } => worker_child::run(root).await,
    }
}

async fn serve() -> std::io::Result<()> {
    let state_dir = config::state_dir();
    let layout = Layout::create(&state_dir).map_err(|e| std::io::Error::other(e.to_string()))?;
    let store = Arc::new(StatusStore::new(layout, config::lock_timeout()));

    let callback = config::callback_server().map(CallbackClient::new).map(Arc::new);

    let worker_exe = std::env::current_exe()?;
    let pool = WorkerPool::spawn(
        config::num_workers(),
        worker_exe,
        state_dir,
        store.clone(),
        callback.clone(),
    )
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))?;
    let pool = Arc::new(pool);

    let state = AppState {
        store: store.clone(),
        pool: pool.clone(),
        output_extension: Arc::from(config::tagger_output_extension().as_str()),
        processing_speed: config::tagger_processing_speed(),
    };

    tokio::spawn(tagq_engine::run_supervisor(
        store,
        pool,
        config::tagger_output_extension(),
        config::tagger_processing_speed(),
        config::poll_interval(),
    ));

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "tagqd listening");
    axum::serve(listener, routes::router(state)).await
}
