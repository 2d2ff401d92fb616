//! Execution Context: read-only metadata shared by every stage of one run
use crate::DEFAULT_TOP_K;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub trace_id: String,
    /// Result-row cap the query prompt asks the model to respect.
    pub top_k: usize,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        let a = ExecutionContext::new();
        let b = ExecutionContext::new();
        assert_ne!(a.trace_id, b.trace_id);
        assert_eq!(a.top_k, 100);
    }
}
