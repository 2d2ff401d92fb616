//! Chat-completions request bodies and response parsing.
use askdb_core::{ModelError, OutputShape};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

/// Body for a free-text completion.
pub fn text_request(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": 0
    })
}

/// Body forcing a single function call whose parameters are `shape`.
pub fn structured_request(model: &str, prompt: &str, shape: &OutputShape) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": 0,
        "tools": [{
            "type": "function",
            "function": {
                "name": shape.name,
                "description": shape.description,
                "parameters": shape.schema
            }
        }],
        "tool_choice": {
            "type": "function",
            "function": { "name": shape.name }
        }
    })
}

/// First choice's content.
pub fn parse_text(body: &str) -> Result<String, ModelError> {
    let message = first_message(body)?;
    message
        .content
        .ok_or_else(|| ModelError::new("response has no message content"))
}

/// Arguments of the call to `shape`, or JSON found in plain content when
/// the provider ignored the tool.
pub fn parse_structured(body: &str, shape: &OutputShape) -> Result<Value, ModelError> {
    let message = first_message(body)?;

    let call = message
        .tool_calls
        .iter()
        .flatten()
        .find(|c| c.function.name == shape.name);
    if let Some(call) = call {
        return serde_json::from_str(&call.function.arguments).map_err(|e| {
            ModelError::new(format!("malformed {} arguments: {e}", shape.name))
        });
    }

    let content = message
        .content
        .ok_or_else(|| ModelError::new(format!("response has no {} call", shape.name)))?;
    serde_json::from_str(&strip_markdown(strip_reasoning(&content)))
        .map_err(|e| ModelError::new(format!("response is not {} JSON: {e}", shape.name)))
}

fn first_message(body: &str) -> Result<Message, ModelError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::new(format!("failed to parse response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ModelError::new("response has no choices"))
}

/// Drop a leading `<think>…</think>` block emitted by reasoning models.
fn strip_reasoning(text: &str) -> &str {
    match text.find("</think>") {
        Some(end) => &text[end + "</think>".len()..],
        None => text,
    }
}

/// Strip markdown code fences (```json … ``` or ``` … ```).
fn strip_markdown(text: &str) -> String {
    let text = text.trim();
    if text.starts_with("```") {
        let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
        let end = text.rfind("```").filter(|&e| e >= start).unwrap_or(text.len());
        return text[start..end].trim().to_string();
    }
    text.to_string()
}
