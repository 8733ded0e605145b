pub mod examples;
pub mod templates;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub use examples::{get_examples, FewShotExample};
pub use templates::{render_category_prompt, render_system_prompt, render_user_prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message sent to the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub enum PromptError {
    TemplateError(String),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TemplateError(msg) => write!(f, "Prompt template error: {}", msg),
        }
    }
}

impl Error for PromptError {}

impl From<minijinja::Error> for PromptError {
    fn from(err: minijinja::Error) -> Self {
        PromptError::TemplateError(err.to_string())
    }
}

/// Builds the system and user messages for one question, in that order.
pub fn build_messages(
    schema: &str,
    examples: &[FewShotExample],
    category_hint: Option<&str>,
    dialect: &str,
    question: &str,
) -> Result<Vec<PromptMessage>, PromptError> {
    Ok(vec![
        PromptMessage::system(render_system_prompt(schema, examples, category_hint, dialect)?),
        PromptMessage::user(render_user_prompt(question)?),
    ])
}
