//! Parameterized query statements
//!
//! Values never get spliced into query text; everything user-supplied
//! travels in the parameter map. The only text substitution anywhere
//! is the variable-length bound in path patterns, which the depth
//! assertion has already pinned to a small integer.

use serde_json::Value;
use std::collections::HashMap;

/// One parameterized statement bound for the graph database
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: HashMap<String, Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: HashMap::new(),
        }
    }

    /// Bind one named parameter
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}
