use crate::llm::LlmError;
use crate::prompts::templates::NO_CATEGORY_EXPANSION;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Returned in place of SQL when the structured result has no usable `query`.
pub const NO_QUERY_FOUND: &str = "No query found in response";

// One entry in the model's stated reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub explanation: String,
    pub output: String,
}

// Structured output of the SQL generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default)]
    pub steps: Vec<ReasoningStep>,
    #[serde(default)]
    pub query: Option<String>,
}

impl GenerationResult {
    /// The final query, if present and not blank.
    pub fn sql(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    /// `response_format` payload requiring this shape from the service.
    pub fn response_format() -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "sql_generation",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "steps": {
                            "type": "array",
                            "description": "Short reasoning steps explaining the approach",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "explanation": {
                                        "type": "string",
                                        "description": "The reasoning behind this step."
                                    },
                                    "output": {
                                        "type": "string",
                                        "description": "The partial SQL produced at this step."
                                    }
                                },
                                "required": ["explanation", "output"],
                                "additionalProperties": false
                            }
                        },
                        "query": {
                            "type": "string",
                            "description": "The final SQL query"
                        }
                    },
                    "required": ["steps", "query"],
                    "additionalProperties": false
                }
            }
        })
    }
}

// Structured output of the category expansion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExpansion {
    pub query: String,
    #[serde(rename = "expandedQuery")]
    pub expanded_query: String,
    pub explanation: String,
}

impl CategoryExpansion {
    pub fn validate(self) -> Result<Self, LlmError> {
        if self.expanded_query.trim().is_empty() {
            return Err(LlmError::ResponseError(
                "Category expansion returned an empty expandedQuery".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn found_categories(&self) -> bool {
        self.expanded_query.trim() != NO_CATEGORY_EXPANSION
    }

    /// Note for the main system prompt, or `None` when no category was found.
    pub fn as_hint(&self) -> Option<String> {
        if !self.found_categories() {
            return None;
        }

        Some(format!(
            "The question refers to product categories by name. Use the dataset's category names exactly as below.\n\
             - Question with dataset category names: {}\n\
             - Mapping: {}",
            self.expanded_query.trim(),
            self.explanation.trim()
        ))
    }

    pub fn response_format() -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "category_expansion",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The original question"
                        },
                        "expandedQuery": {
                            "type": "string",
                            "description": "The question with category terms replaced by dataset category names"
                        },
                        "explanation": {
                            "type": "string",
                            "description": "How each category term was mapped"
                        }
                    },
                    "required": ["query", "expandedQuery", "explanation"],
                    "additionalProperties": false
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Sql,
    Refused,
    NoQuery,
    Rejected,
    ServiceError,
    PromptError,
}

// Record of one answered question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlQuery {
    pub question: String,
    pub answer: String,
    pub outcome: Outcome,
    pub steps: Vec<ReasoningStep>,
    pub category_hint: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub elapsed_ms: u64,
}
