//! Gateways: the two external collaborators the pipeline consumes.
//!
//! Implementations are built once at startup and shared as
//! `Arc<dyn SqlDatabase>` / `Arc<dyn ChatModel>` across requests, so both
//! traits require `Send + Sync`.
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::data_model::StructuredQueryOutput;
use crate::error::{DatabaseError, ModelError};

#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Dialect name substituted into the query prompt (ex: "postgresql").
    fn dialect(&self) -> &str;

    /// Human-readable enumeration of tables and columns.
    async fn describe_schema(&self) -> Result<String, DatabaseError>;

    /// Run `sql` and return a deterministic textual rendering of the rows.
    async fn execute(&self, sql: &str) -> Result<String, DatabaseError>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Ask for a JSON value conforming to `shape`.
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: &OutputShape,
    ) -> Result<Value, ModelError>;

    /// Ask for free text.
    async fn generate_text(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Declared shape for structured model output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputShape {
    pub name: String,
    pub description: String,
    /// JSON Schema of the expected object.
    pub schema: Value,
}

impl OutputShape {
    /// Shape of [`StructuredQueryOutput`].
    pub fn query_output() -> Self {
        Self {
            name: "QueryOutput".to_string(),
            description: "Generated SQL query.".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Syntactically valid SQL query."
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

/// Ask the model for SQL and return the validated `query` field.
pub async fn generate_query_output(
    model: &dyn ChatModel,
    prompt: &str,
) -> Result<String, ModelError> {
    let value = model
        .generate_structured(prompt, &OutputShape::query_output())
        .await?;
    let output: StructuredQueryOutput = serde_json::from_value(value)
        .map_err(|e| ModelError::new(format!("malformed structured output: {e}")))?;

    let query = output.query.trim();
    if query.is_empty() {
        return Err(ModelError::new("structured output has an empty query"));
    }
    Ok(query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Value);

    #[async_trait]
    impl ChatModel for Canned {
        async fn generate_structured(
            &self,
            _prompt: &str,
            shape: &OutputShape,
        ) -> Result<Value, ModelError> {
            assert_eq!(shape.name, "QueryOutput");
            Ok(self.0.clone())
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let model = Canned(json!({ "query": "  SELECT 1\n" }));
        let query = generate_query_output(&model, "p").await.unwrap();
        assert_eq!(query, "SELECT 1");
    }

    #[tokio::test]
    async fn test_missing_query_field_is_model_error() {
        let model = Canned(json!({ "sql": "SELECT 1" }));
        let err = generate_query_output(&model, "p").await.unwrap_err();
        assert!(err.0.contains("malformed structured output"));
    }

    #[tokio::test]
    async fn test_empty_query_is_model_error() {
        let model = Canned(json!({ "query": "" }));
        assert!(generate_query_output(&model, "p").await.is_err());
    }

    #[test]
    fn test_query_output_shape_requires_query() {
        let shape = OutputShape::query_output();
        assert_eq!(shape.schema["required"][0], "query");
        assert_eq!(shape.schema["properties"]["query"]["type"], "string");
    }
}
