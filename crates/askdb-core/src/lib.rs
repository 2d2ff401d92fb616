//! askdb Core: pipeline state, stage contract, runner, gateways and prompts.
//!
//! The pipeline answers a natural-language question in three fixed steps:
//!
//! ```text
//! question → write_query → execute_query → generate_answer → answer
//!               ↓               ↓                ↓
//!             query           result           answer
//! ```
//!
//! Nothing in this crate performs I/O. The database and the language model
//! are reached through the [`SqlDatabase`] and [`ChatModel`] traits, which
//! `askdb-db` and `askdb-llm` implement.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod runner;
pub mod stage;

pub use config::{AppConfig, DatabaseConfig, LlmConfig, ServerConfig};
pub use context::ExecutionContext;
pub use data_model::{
    PipelineState, QueryResponse, QuestionRequest, StageTrace, StateUpdate,
    StructuredQueryOutput,
};
pub use error::{DatabaseError, ModelError, PipelineError};
pub use gateway::{generate_query_output, ChatModel, OutputShape, SqlDatabase};
pub use prompt::{PromptTemplates, TemplatesFile};
pub use runner::PipelineRunner;
pub use stage::Stage;

/// Row cap substituted into the query prompt.
pub const DEFAULT_TOP_K: usize = 100;

/// Version reported by the health endpoint and the CLI.
pub const ASKDB_VERSION: &str = env!("CARGO_PKG_VERSION");
