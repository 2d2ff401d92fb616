use askdb_core::{
    ChatModel, ExecutionContext, PipelineError, PipelineState, PromptTemplates, Stage,
    StateUpdate,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Step 3: question + SQL + result → natural-language answer.
pub struct GenerateAnswerStage {
    model: Arc<dyn ChatModel>,
    prompts: Arc<PromptTemplates>,
}

impl GenerateAnswerStage {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Arc<PromptTemplates>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Stage for GenerateAnswerStage {
    fn id(&self) -> &'static str {
        "generate_answer"
    }

    fn deterministic(&self) -> bool {
        false
    }

    async fn run(
        &self,
        state: &PipelineState,
        _ctx: &ExecutionContext,
    ) -> Result<StateUpdate, PipelineError> {
        let prompt =
            self.prompts
                .render_answer_prompt(&state.question, &state.query, &state.result)?;
        let answer = self.model.generate_text(&prompt).await?;
        Ok(StateUpdate::Answer(answer))
    }
}
