use askdb_core::{
    ExecutionContext, PipelineError, PipelineState, SqlDatabase, Stage, StateUpdate,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Step 2: run the synthesized SQL as-is. No retry, no repair.
pub struct ExecuteQueryStage {
    db: Arc<dyn SqlDatabase>,
}

impl ExecuteQueryStage {
    pub fn new(db: Arc<dyn SqlDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Stage for ExecuteQueryStage {
    fn id(&self) -> &'static str {
        "execute_query"
    }

    async fn run(
        &self,
        state: &PipelineState,
        ctx: &ExecutionContext,
    ) -> Result<StateUpdate, PipelineError> {
        let result = self.db.execute(&state.query).await?;
        tracing::debug!(trace_id = %ctx.trace_id, bytes = result.len(), "query executed");
        Ok(StateUpdate::Result(result))
    }
}
