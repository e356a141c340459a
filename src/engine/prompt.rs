//! Prompt templates - `{key}` placeholders filled at render time
//!
//! Windows with a dynamic prompt carry a replacements map:
//! ```json
//! "prompt": "Stories in {1}",
//! "prompt_type": "dynamic",
//! "replacements": {"1": "@active_project.text"}
//! ```

use regex::Regex;
use std::collections::HashMap;

/// A prompt with `{key}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub template: String,
    /// Placeholder names in order of appearance
    pub params: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, regex::Error> {
        let template = template.into();
        let params = Self::extract_params(&template)?;
        Ok(Self { template, params })
    }

    fn extract_params(template: &str) -> Result<Vec<String>, regex::Error> {
        let re = Regex::new(r"\{(\w+)\}")?;
        Ok(re
            .captures_iter(template)
            .map(|cap| cap[1].to_string())
            .collect())
    }

    /// Substitute every placeholder that has a value
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for (key, value) in values {
            result = result.replace(&format!("{{{}}}", key), value);
        }
        result
    }
}

/// Dashes as long as the rendered prompt
pub fn underline(prompt: &str) -> String {
    "-".repeat(prompt.chars().count())
}
