//! Data Model: PipelineState, StateUpdate, structured output and wire types
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Per-request state threaded through the three stages.
///
/// Fields fill strictly in the order `question → query → result → answer`.
/// [`PipelineState::apply`] is the only way to advance it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub question: String,
    pub query: String,
    pub result: String,
    pub answer: String,
    #[serde(skip)]
    executed: bool,
}

/// Output of a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    Query(String),
    Result(String),
    Answer(String),
}

impl StateUpdate {
    /// Name of the state field this update writes.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Result(_) => "result",
            Self::Answer(_) => "answer",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Query(v) | Self::Result(v) | Self::Answer(v) => v,
        }
    }
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// True once the execute step has stored its result, even an empty one.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Apply a stage update, rejecting writes that skip or repeat a step.
    ///
    /// `result` may legitimately be empty (a query that matched no rows), so
    /// the answer step only requires that `query` is set and `answer` is not.
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), PipelineError> {
        match update {
            StateUpdate::Query(query) => {
                if !self.query.is_empty() {
                    return Err(out_of_order("query", "query already set"));
                }
                if query.trim().is_empty() {
                    return Err(out_of_order("query", "query is empty"));
                }
                self.query = query;
            }
            StateUpdate::Result(result) => {
                if self.query.is_empty() {
                    return Err(out_of_order("result", "query not yet synthesized"));
                }
                if self.is_executed() {
                    return Err(out_of_order("result", "result already set"));
                }
                self.result = result;
                self.executed = true;
            }
            StateUpdate::Answer(answer) => {
                if !self.is_executed() {
                    return Err(out_of_order("answer", "query not yet executed"));
                }
                if !self.answer.is_empty() {
                    return Err(out_of_order("answer", "answer already set"));
                }
                self.answer = answer;
            }
        }
        Ok(())
    }
}

fn out_of_order(field: &str, reason: &str) -> PipelineError {
    PipelineError::Unexpected(format!("cannot set {field}: {reason}"))
}

/// Typed contract for the model's SQL output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQueryOutput {
    /// Syntactically valid SQL query.
    pub query: String,
}

/// Timing record for one stage of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTrace {
    pub id: String,
    pub deterministic: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub sql_query: String,
    pub sql_result: String,
    pub answer: String,
}

impl From<PipelineState> for QueryResponse {
    fn from(state: PipelineState) -> Self {
        Self {
            question: state.question,
            sql_query: state.query,
            sql_result: state.result,
            answer: state.answer,
        }
    }
}
