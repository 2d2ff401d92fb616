//! In-memory gateways for exercising the pipeline without a database or a
//! model provider.
use askdb_core::{ChatModel, DatabaseError, ModelError, OutputShape, SqlDatabase};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

type Reply = Box<dyn Fn(&str) -> Result<String, ModelError> + Send + Sync>;

/// Database with a fixed schema description and canned results per SQL text.
/// Unknown SQL fails like a syntax error would.
pub struct FakeDatabase {
    schema: String,
    results: HashMap<String, Result<String, DatabaseError>>,
    executed: Mutex<Vec<String>>,
}

impl FakeDatabase {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            results: HashMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(mut self, sql: &str, result: &str) -> Self {
        self.results.insert(sql.to_string(), Ok(result.to_string()));
        self
    }

    pub fn with_error(mut self, sql: &str, err: DatabaseError) -> Self {
        self.results.insert(sql.to_string(), Err(err));
        self
    }

    /// Every SQL text passed to `execute`, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SqlDatabase for FakeDatabase {
    fn dialect(&self) -> &str {
        "postgresql"
    }

    async fn describe_schema(&self) -> Result<String, DatabaseError> {
        Ok(self.schema.clone())
    }

    async fn execute(&self, sql: &str) -> Result<String, DatabaseError> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        match self.results.get(sql) {
            Some(result) => result.clone(),
            None => Err(DatabaseError::QueryExecution(format!(
                "syntax error at or near \"{}\"",
                sql.split_whitespace().next().unwrap_or("")
            ))),
        }
    }
}

/// Model whose SQL and answer are computed from the prompt.
pub struct FakeModel {
    sql: Reply,
    answer: Reply,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new<Q, A>(sql: Q, answer: A) -> Self
    where
        Q: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
        A: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self {
            sql: Box::new(sql),
            answer: Box::new(answer),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `sql`, then `answer`.
    pub fn fixed(sql: &str, answer: &str) -> Self {
        let (sql, answer) = (sql.to_string(), answer.to_string());
        Self::new(move |_| Ok(sql.clone()), move |_| Ok(answer.clone()))
    }

    /// Every call fails as if the provider could not be reached.
    pub fn unreachable() -> Self {
        let down = |_: &str| -> Result<String, ModelError> {
            Err(ModelError::new("Groq API error: connection refused"))
        };
        Self::new(down, down)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn generate_structured(
        &self,
        prompt: &str,
        _shape: &OutputShape,
    ) -> Result<Value, ModelError> {
        self.record(prompt);
        let query = (self.sql)(prompt)?;
        Ok(json!({ "query": query }))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ModelError> {
        self.record(prompt);
        (self.answer)(prompt)
    }
}
