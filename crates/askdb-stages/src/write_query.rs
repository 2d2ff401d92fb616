use askdb_core::{
    generate_query_output, ChatModel, DatabaseError, ExecutionContext, PipelineError,
    PipelineState, PromptTemplates, SqlDatabase, Stage, StateUpdate,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Step 1: question + schema → SQL.
pub struct WriteQueryStage {
    db: Arc<dyn SqlDatabase>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<PromptTemplates>,
}

impl WriteQueryStage {
    pub fn new(
        db: Arc<dyn SqlDatabase>,
        model: Arc<dyn ChatModel>,
        prompts: Arc<PromptTemplates>,
    ) -> Self {
        Self { db, model, prompts }
    }
}

#[async_trait]
impl Stage for WriteQueryStage {
    fn id(&self) -> &'static str {
        "write_query"
    }

    fn deterministic(&self) -> bool {
        false
    }

    async fn run(
        &self,
        state: &PipelineState,
        ctx: &ExecutionContext,
    ) -> Result<StateUpdate, PipelineError> {
        // A schema lookup failure is ours, not a bad query from the caller.
        let table_info = self.db.describe_schema().await.map_err(|e| match e {
            DatabaseError::QueryExecution(msg) => {
                PipelineError::Unexpected(format!("schema description failed: {msg}"))
            }
            other => other.into(),
        })?;

        let prompt = self.prompts.render_query_prompt(
            self.db.dialect(),
            ctx.top_k,
            &table_info,
            &state.question,
        )?;

        let query = generate_query_output(self.model.as_ref(), &prompt).await?;
        tracing::info!(trace_id = %ctx.trace_id, %query, "query synthesized");

        Ok(StateUpdate::Query(query))
    }
}
