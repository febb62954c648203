use crate::config::Config;
use crate::review::{self, DecisionSource, ReviewOutcome};
use crate::workspace::Workspace;
use crate::{generator, images, logi, logok, publish, video, voice};
use reqwest::Client;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' failed: {source:#}")]
    Stage {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("pipeline aborted by operator")]
    Aborted,
}

async fn stage<T, F>(name: &'static str, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    logi(format!("=== Stage: {} ===", name));
    match fut.await {
        Ok(value) => Ok(value),
        Err(source) => Err(PipelineError::Stage { stage: name, source }),
    }
}

/// Sequences the full run. Stages execute strictly one after another; the
/// first failure aborts the run with no retries and no rollback of earlier
/// stages' filesystem side effects.
pub async fn run(
    ws: &Workspace,
    cfg: &Config,
    client: &Client,
    decisions: &mut dyn DecisionSource,
) -> Result<(), PipelineError> {
    stage("reset", ws.reset()).await?;
    stage("generate", generator::run(ws, cfg, client)).await?;

    let outcome = stage("review", review::run(ws, cfg, client, decisions)).await?;
    if outcome == ReviewOutcome::Aborted {
        return Err(PipelineError::Aborted);
    }

    stage("voice", voice::run(ws, cfg, client)).await?;
    stage("images", images::run(ws, cfg, client)).await?;
    stage("video", video::run(ws)).await?;
    stage("publish", publish::run(ws, client)).await?;

    logok("Pipeline complete.");
    Ok(())
}
