//! Prompt templates for the two model calls.
//!
//! Templates use Handlebars syntax. Built-in defaults are always present;
//! a prompts YAML file may override either of them:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   answer_prompt:
//!     description: Answer synthesis
//!     template: "Question: {{question}} ..."
//! ```

use handlebars::Handlebars;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;

pub const QUERY_PROMPT: &str = "query_prompt";
pub const ANSWER_PROMPT: &str = "answer_prompt";

const DEFAULT_QUERY_TEMPLATE: &str = r#"Given an input question, create a syntactically correct {{dialect}} query to run to help find the answer. Unless the user specifies in the question a specific number of examples they wish to obtain, always limit your query to at most {{top_k}} results. You can order the results by a relevant column to return the most interesting examples in the database.

Never query for all the columns from a specific table, only ask for the few relevant columns given the question.

Pay attention to use only the column names that you can see in the schema description. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.

Put the column names in " " in the query sentence, for example SELECT SUM("TotalSales") AS TotalAmount FROM products

Only use the following tables:
{{table_info}}

Question: {{input}}"#;

const DEFAULT_ANSWER_TEMPLATE: &str = "Given the following user question, corresponding SQL query, \
and SQL result, answer the user question.\n\n\
Question: {{question}}\n\
SQL Query: {{query}}\n\
SQL Result: {{result}}";

/// Prompts file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read prompts file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| PipelineError::Config(format!("failed to parse prompts YAML: {e}")))
    }

    /// The built-in query and answer templates.
    pub fn builtin() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            QUERY_PROMPT.to_string(),
            Template {
                description: "SQL synthesis from a question and the schema".to_string(),
                template: DEFAULT_QUERY_TEMPLATE.to_string(),
            },
        );
        templates.insert(
            ANSWER_PROMPT.to_string(),
            Template {
                description: "Answer synthesis from question, SQL and result".to_string(),
                template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            },
        );
        Self {
            version: "1.0".to_string(),
            templates,
        }
    }
}

/// Compiled prompt templates. Rendering is pure: identical inputs always
/// yield the identical prompt string.
pub struct PromptTemplates {
    handlebars: Handlebars<'static>,
}

impl PromptTemplates {
    /// Built-in defaults overlaid with any templates from `overrides`.
    pub fn new(overrides: Option<TemplatesFile>) -> Result<Self, PipelineError> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text; a missing variable is a bug, not an empty string.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        let mut file = TemplatesFile::builtin();
        if let Some(overrides) = overrides {
            file.templates.extend(overrides.templates);
        }

        for (name, template) in &file.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| PipelineError::Config(format!("invalid template {name}: {e}")))?;
        }

        Ok(Self { handlebars })
    }

    /// Defaults, optionally overridden from a prompts YAML file.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        match path {
            Some(path) => Self::new(Some(TemplatesFile::load(path)?)),
            None => Self::new(None),
        }
    }

    pub fn render_query_prompt(
        &self,
        dialect: &str,
        top_k: usize,
        table_info: &str,
        input: &str,
    ) -> Result<String, PipelineError> {
        self.render(
            QUERY_PROMPT,
            &json!({
                "dialect": dialect,
                "top_k": top_k,
                "table_info": table_info,
                "input": input,
            }),
        )
    }

    pub fn render_answer_prompt(
        &self,
        question: &str,
        query: &str,
        result: &str,
    ) -> Result<String, PipelineError> {
        self.render(
            ANSWER_PROMPT,
            &json!({
                "question": question,
                "query": query,
                "result": result,
            }),
        )
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, PipelineError> {
        self.handlebars
            .render(name, data)
            .map_err(|e| PipelineError::Config(format!("failed to render {name}: {e}")))
    }
}
