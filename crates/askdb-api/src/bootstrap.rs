//! Startup wiring: build the gateways once and hand them to the pipeline.
use askdb_core::{AppConfig, ChatModel, PipelineError, PipelineRunner, PromptTemplates, SqlDatabase};
use askdb_db::PgDatabase;
use askdb_llm::GroqChatModel;
use askdb_stages::build_pipeline;
use std::sync::Arc;

use crate::{AppState, Metrics};

/// Connect to the database, build the model client and load the prompts.
/// Fails fast: nothing can be answered without all three.
pub async fn build_runner(config: &AppConfig) -> Result<PipelineRunner, PipelineError> {
    let prompts = Arc::new(PromptTemplates::load(config.prompts_path.as_deref())?);
    let model: Arc<dyn ChatModel> = Arc::new(GroqChatModel::new(&config.llm)?);
    let db: Arc<dyn SqlDatabase> = Arc::new(PgDatabase::connect(config.database.clone()).await?);

    let runner = build_pipeline(db, model, prompts);
    tracing::info!(pipeline = runner.pipeline_id(), "pipeline ready");
    Ok(runner)
}

pub async fn build_state(config: &AppConfig) -> Result<AppState, PipelineError> {
    let runner = build_runner(config).await?;
    let metrics = Metrics::new().map_err(|e| PipelineError::Unexpected(e.to_string()))?;
    Ok(AppState {
        runner: Arc::new(runner),
        metrics: Arc::new(metrics),
    })
}
