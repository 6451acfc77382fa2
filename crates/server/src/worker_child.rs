// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker-child main loop (§4.3, §9 "Global initialized tagger
//! state"): one process per pool slot, speaking `tagq-wire` NDJSON on
//! stdin/stdout with the parent's `WorkerPool`.

use std::path::PathBuf;

use tagq_core::JobId;
use tagq_engine::{CallbackClient, JobOutcome};
use tagq_storage::{Layout, StatusStore};
use tagq_tagger::{CommandTagger, StubTagger, Tagger};
use tagq_wire::{ChildRequest, ChildResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config;

/// Entry point for the hidden `worker-child --root <dir>` subcommand.
pub async fn run(root: PathBuf) -> std::io::Result<()> {
    let layout = Layout::create(&root).map_err(|e| std::io::Error::other(e.to_string()))?;
    let store = StatusStore::new(layout, config::lock_timeout());
    let callback = config::callback_server().map(CallbackClient::new);

    let mut tagger = build_tagger();
    if let Err(e) = tagger.initialize().await {
        tracing::error!(error = %e, "tagger initialization failed, worker-child exiting");
        std::process::exit(1);
    }

    let stdout = tokio::io::stdout();
    let mut out = stdout;
    write_response(&mut out, &ChildResponse::Ready).await?;

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let request = match ChildRequest::decode(&line) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "received malformed request, worker-child exiting");
                std::process::exit(1);
            }
        };

        let ChildRequest::Process { id, .. } = request;
        match process_one(tagger.as_ref(), &store, &id, callback.as_ref()).await {
            Ok(JobOutcome::Finished) => {
                write_response(&mut out, &ChildResponse::Done { id }).await?;
            }
            Ok(JobOutcome::Failed { timed_out }) => {
                let message = store.get_job(&id).message;
                write_response(&mut out, &ChildResponse::Failed { id, message, timed_out }).await?;
                if timed_out {
                    // A hung tagger call may have left threads or native
                    // state behind; recycle the whole process rather than
                    // trust it to serve another job cleanly.
                    std::process::exit(1);
                }
            }
            Err(e) => {
                tracing::error!(id = %id, error = %e, "job worker returned an engine error, worker-child exiting");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn process_one(
    tagger: &dyn Tagger,
    store: &StatusStore,
    id: &JobId,
    callback: Option<&CallbackClient>,
) -> Result<JobOutcome, tagq_engine::EngineError> {
    tagq_engine::run_job(tagger, store, id, callback).await
}

fn build_tagger() -> Box<dyn Tagger> {
    match config::tagger_command() {
        Some(command) => {
            Box::new(CommandTagger::new(command, config::tagger_output_extension(), config::tagger_processing_speed()))
        }
        None => Box::new(
            StubTagger::new()
                .with_output_extension(config::tagger_output_extension())
                .with_processing_speed(config::tagger_processing_speed()),
        ),
    }
}

async fn write_response(out: &mut tokio::io::Stdout, response: &ChildResponse) -> std::io::Result<()> {
    let line = response.encode().map_err(|e| std::io::Error::other(e.to_string()))?;
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
