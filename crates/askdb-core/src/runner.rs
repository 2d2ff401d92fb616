//! Pipeline Runner: folds the stages over a fresh state, collecting timings
use crate::context::ExecutionContext;
use crate::data_model::{PipelineState, StageTrace, StateUpdate};
use crate::error::PipelineError;
use crate::stage::Stage;
use std::time::Instant;

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");

        Self { stages, pipeline_id }
    }

    /// Run every stage once, in order, starting from a state holding only
    /// `question`. The first failure aborts the run; no partial state is
    /// returned.
    pub async fn run(
        &self,
        question: &str,
        ctx: &ExecutionContext,
    ) -> Result<(PipelineState, Vec<StageTrace>), PipelineError> {
        self.run_with(question, ctx, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_update` after each update is applied.
    pub async fn run_with<F>(
        &self,
        question: &str,
        ctx: &ExecutionContext,
        mut on_update: F,
    ) -> Result<(PipelineState, Vec<StageTrace>), PipelineError>
    where
        F: FnMut(&str, &StateUpdate) + Send,
    {
        let mut state = PipelineState::new(question);
        let mut traces = Vec::with_capacity(self.stages.len());

        tracing::info!(trace_id = %ctx.trace_id, pipeline = %self.pipeline_id, "pipeline started");

        for stage in &self.stages {
            let start = Instant::now();

            let update = stage.run(&state, ctx).await.map_err(|e| {
                tracing::warn!(
                    trace_id = %ctx.trace_id,
                    stage = stage.id(),
                    error = %e,
                    "stage failed"
                );
                e
            })?;

            let latency_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(
                trace_id = %ctx.trace_id,
                stage = stage.id(),
                field = update.field(),
                latency_ms,
                "stage complete"
            );

            state.apply(update.clone())?;
            on_update(stage.id(), &update);

            traces.push(StageTrace {
                id: stage.id().to_string(),
                deterministic: stage.deterministic(),
                latency_ms,
            });
        }

        tracing::info!(
            trace_id = %ctx.trace_id,
            total_ms = traces.iter().map(|t| t.latency_ms).sum::<u64>(),
            "pipeline finished"
        );

        Ok((state, traces))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Emit(&'static str, fn(&PipelineState) -> StateUpdate);

    #[async_trait]
    impl Stage for Emit {
        fn id(&self) -> &'static str {
            self.0
        }

        async fn run(
            &self,
            state: &PipelineState,
            _ctx: &ExecutionContext,
        ) -> Result<StateUpdate, PipelineError> {
            Ok((self.1)(state))
        }
    }

    struct Fail;

    #[async_trait]
    impl Stage for Fail {
        fn id(&self) -> &'static str {
            "fail"
        }

        async fn run(
            &self,
            _state: &PipelineState,
            _ctx: &ExecutionContext,
        ) -> Result<StateUpdate, PipelineError> {
            Err(PipelineError::ExecutionFailure("syntax error at or near \"FORM\"".into()))
        }
    }

    fn three_stages() -> Vec<Box<dyn Stage>> {
        vec![
            Box::new(Emit("write_query", |s| {
                StateUpdate::Query(format!("SELECT '{}'", s.question))
            })),
            Box::new(Emit("execute_query", |s| StateUpdate::Result(format!("[({},)]", s.query)))),
            Box::new(Emit("generate_answer", |s| StateUpdate::Answer(s.result.clone()))),
        ]
    }

    #[tokio::test]
    async fn test_stages_fold_left_to_right() {
        let runner = PipelineRunner::new(three_stages());
        assert_eq!(runner.pipeline_id(), "write_query→execute_query→generate_answer");

        let (state, traces) = runner.run("hi", &ExecutionContext::new()).await.unwrap();
        assert_eq!(state.query, "SELECT 'hi'");
        assert_eq!(state.result, "[(SELECT 'hi',)]");
        assert_eq!(state.answer, state.result);
        assert_eq!(
            traces.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["write_query", "execute_query", "generate_answer"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let mut stages = three_stages();
        stages[1] = Box::new(Fail);
        let runner = PipelineRunner::new(stages);

        let mut seen = Vec::new();
        let err = runner
            .run_with("hi", &ExecutionContext::new(), |id, _| seen.push(id.to_string()))
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(seen, vec!["write_query"]);
    }

    #[tokio::test]
    async fn test_misordered_stages_are_rejected() {
        let runner = PipelineRunner::new(vec![Box::new(Emit("answer_first", |_| {
            StateUpdate::Answer("too early".into())
        }))]);
        let err = runner.run("hi", &ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_rejected_update_is_not_reported() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Emit("write_query", |_| StateUpdate::Query("SELECT 1".into()))),
            Box::new(Emit("write_query_again", |_| StateUpdate::Query("SELECT 2".into()))),
        ];
        let runner = PipelineRunner::new(stages);

        let mut seen = Vec::new();
        let err = runner
            .run_with("hi", &ExecutionContext::new(), |id, update| {
                seen.push(format!("{id}: {}", update.value()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Unexpected(_)));
        assert_eq!(seen, vec!["write_query: SELECT 1"]);
    }
}
