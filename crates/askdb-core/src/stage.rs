//! Stage Trait: single contract for every pipeline step
use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::data_model::{PipelineState, StateUpdate};
use crate::error::PipelineError;

#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique stage id (ex: "write_query")
    fn id(&self) -> &'static str;

    /// Whether the same state always produces the same update (default: true).
    /// Stages that call the language model are not.
    fn deterministic(&self) -> bool {
        true
    }

    /// Read the state and produce exactly one update. Stages never mutate
    /// the state themselves; the runner applies the update.
    async fn run(
        &self,
        state: &PipelineState,
        ctx: &ExecutionContext,
    ) -> Result<StateUpdate, PipelineError>;
}
