//! askdb Stages: the three steps of the question-answering pipeline.
//!
//! # Pipeline Flow
//!
//! ```text
//! question → write_query → execute_query → generate_answer → answer
//!               ↓               ↓                ↓
//!         model + schema     database          model
//! ```
//!
//! Every stage receives its gateways at construction, so the HTTP service
//! and the CLI drive the exact same pipeline.

mod execute_query;
mod generate_answer;
mod write_query;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use execute_query::ExecuteQueryStage;
pub use generate_answer::GenerateAnswerStage;
pub use write_query::WriteQueryStage;

use askdb_core::{ChatModel, PipelineRunner, PromptTemplates, SqlDatabase};
use std::sync::Arc;

/// The standard pipeline: `write_query → execute_query → generate_answer`.
pub fn build_pipeline(
    db: Arc<dyn SqlDatabase>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<PromptTemplates>,
) -> PipelineRunner {
    PipelineRunner::new(vec![
        Box::new(WriteQueryStage::new(db.clone(), model.clone(), prompts.clone())),
        Box::new(ExecuteQueryStage::new(db)),
        Box::new(GenerateAnswerStage::new(model, prompts)),
    ])
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeDatabase, FakeModel};
    use super::*;
    use askdb_core::{DatabaseError, ExecutionContext, PipelineError};

    const SCHEMA: &str = "CREATE TABLE \"products\" (\n\t\"id\" integer NOT NULL,\n\t\"TotalSales\" numeric\n)";
    const TOTAL_SQL: &str = r#"SELECT SUM("TotalSales") AS "TotalAmount" FROM products"#;

    fn pipeline(db: Arc<FakeDatabase>, model: Arc<FakeModel>) -> PipelineRunner {
        let prompts = Arc::new(PromptTemplates::new(None).unwrap());
        build_pipeline(db, model, prompts)
    }

    #[tokio::test]
    async fn test_total_sales_scenario() {
        let db = Arc::new(FakeDatabase::new(SCHEMA).with_result(TOTAL_SQL, "[(15342.75,)]"));
        let model = Arc::new(FakeModel::new(
            |_| Ok(TOTAL_SQL.to_string()),
            |prompt| {
                assert!(prompt.contains("SQL Result: [(15342.75,)]"));
                Ok("The total sales amount of products is 15342.75.".to_string())
            },
        ));
        let runner = pipeline(db.clone(), model.clone());
        assert_eq!(runner.len(), 3);

        let (state, traces) = runner
            .run("What is the total sales amount of products?", &ExecutionContext::new())
            .await
            .unwrap();

        assert!(state.query.contains("\"TotalSales\""));
        assert!(state.query.contains("SUM("));
        assert_eq!(state.result, "[(15342.75,)]");
        assert!(state.answer.contains("15342.75"));
        assert_eq!(traces.len(), 3);
        assert!(!traces[0].deterministic);
        assert!(traces[1].deterministic);
        assert_eq!(db.executed(), vec![TOTAL_SQL.to_string()]);
    }

    #[tokio::test]
    async fn test_query_prompt_carries_schema_dialect_and_row_cap() {
        let db = Arc::new(FakeDatabase::new(SCHEMA).with_result("SELECT 1", "[(1,)]"));
        let model = Arc::new(FakeModel::fixed("SELECT 1", "one"));
        pipeline(db, model.clone())
            .run("How many?", &ExecutionContext::new())
            .await
            .unwrap();

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("postgresql"));
        assert!(prompts[0].contains("at most 100 results"));
        assert!(prompts[0].contains(SCHEMA));
        assert!(prompts[0].ends_with("Question: How many?"));
        assert!(prompts[1].contains("SQL Query: SELECT 1"));
    }

    #[tokio::test]
    async fn test_invalid_sql_is_execution_failure() {
        let db = Arc::new(FakeDatabase::new(SCHEMA));
        let model = Arc::new(FakeModel::fixed("SELEC nonsense", "unused"));

        let err = pipeline(db, model.clone())
            .run("q", &ExecutionContext::new())
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "syntax error at or near \"SELEC\"");
        // The answer step never ran.
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_driver_message_is_kept_verbatim() {
        let msg = "ERROR: column \"TotalSale\" does not exist";
        let db = Arc::new(
            FakeDatabase::new(SCHEMA)
                .with_error("SELECT \"TotalSale\" FROM products", DatabaseError::QueryExecution(msg.into())),
        );
        let model = Arc::new(FakeModel::fixed("SELECT \"TotalSale\" FROM products", "unused"));

        let err = pipeline(db, model).run("q", &ExecutionContext::new()).await.unwrap_err();
        match err {
            PipelineError::ExecutionFailure(m) => assert_eq!(m, msg),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_model_is_model_error() {
        let db = Arc::new(FakeDatabase::new(SCHEMA));
        let model = Arc::new(FakeModel::unreachable());

        let err = pipeline(db.clone(), model).run("q", &ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)));
        assert!(!err.is_client_error());
        assert!(db.executed().is_empty());
    }

    #[tokio::test]
    async fn test_blank_sql_from_model_is_rejected_before_execution() {
        let db = Arc::new(FakeDatabase::new(SCHEMA));
        let model = Arc::new(FakeModel::fixed("   ", "unused"));

        let err = pipeline(db.clone(), model).run("q", &ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)));
        assert!(db.executed().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_connection_is_a_server_error() {
        let db = Arc::new(
            FakeDatabase::new(SCHEMA)
                .with_error("SELECT 1", DatabaseError::Connection("connection closed".into())),
        );
        let model = Arc::new(FakeModel::fixed("SELECT 1", "unused"));

        let err = pipeline(db, model).run("q", &ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Connection(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_concurrent_runs_keep_isolated_state() {
        let mut db = FakeDatabase::new(SCHEMA);
        for i in 0..16 {
            db = db.with_result(&format!("SELECT {i}"), &format!("[({i},)]"));
        }
        let db = Arc::new(db);
        // The SQL echoes the number asked about in the question.
        let model = Arc::new(FakeModel::new(
            |prompt| {
                let n = prompt.rsplit("number ").next().unwrap_or("").trim();
                Ok(format!("SELECT {n}"))
            },
            |prompt| {
                let result = prompt.rsplit("SQL Result: ").next().unwrap_or("");
                Ok(format!("answer {result}"))
            },
        ));
        let runner = Arc::new(pipeline(db, model));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let runner = runner.clone();
                tokio::spawn(async move {
                    runner
                        .run(&format!("Give me number {i}"), &ExecutionContext::new())
                        .await
                        .map(|(state, _)| (i, state))
                })
            })
            .collect();

        for handle in handles {
            let (i, state) = handle.await.unwrap().unwrap();
            assert_eq!(state.question, format!("Give me number {i}"));
            assert_eq!(state.query, format!("SELECT {i}"));
            assert_eq!(state.result, format!("[({i},)]"));
            assert_eq!(state.answer, format!("answer [({i},)]"));
        }
    }
}
