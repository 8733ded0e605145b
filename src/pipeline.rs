use crate::config::AppConfig;
use crate::db::category_translations::fetch_category_translations;
use crate::db::schema_loader::fetch_schema;
use crate::llm::models::{NlQuery, Outcome, ReasoningStep, NO_QUERY_FOUND};
use crate::llm::{LlmError, LlmManager};
use crate::prompts::templates::REFUSAL_MESSAGE;
use crate::prompts::{build_messages, get_examples};
use crate::sql_guard::{check_read_only, GuardViolation, READ_ONLY_VIOLATION};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Answers one natural-language question at a time against the configured
/// schema and reasoning service.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<AppConfig>,
    llm: Arc<LlmManager>,
}

struct Resolution {
    answer: String,
    outcome: Outcome,
    steps: Vec<ReasoningStep>,
    category_hint: Option<String>,
}

impl Resolution {
    fn failed(answer: String, outcome: Outcome, category_hint: Option<String>) -> Self {
        Self {
            answer,
            outcome,
            steps: Vec::new(),
            category_hint,
        }
    }
}

impl Pipeline {
    pub fn new(config: Arc<AppConfig>, llm: Arc<LlmManager>) -> Self {
        Self { config, llm }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the generated SQL, the refusal sentence, or an error sentence.
    /// Never fails and never returns an empty string.
    pub async fn answer_question(&self, question: &str) -> String {
        self.answer(question).await.answer
    }

    /// Like [`Pipeline::answer_question`] but keeps the reasoning steps and outcome.
    pub async fn answer(&self, question: &str) -> NlQuery {
        let created_at = chrono::Utc::now();
        let started = Instant::now();
        debug!("NL-query: {}", question);

        let resolution = self.resolve(question).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            outcome = ?resolution.outcome,
            elapsed_ms,
            "Answered question {:?}: {}",
            question,
            resolution.answer
        );

        NlQuery {
            question: question.to_string(),
            answer: resolution.answer,
            outcome: resolution.outcome,
            steps: resolution.steps,
            category_hint: resolution.category_hint,
            created_at,
            elapsed_ms,
        }
    }

    async fn resolve(&self, question: &str) -> Resolution {
        let schema = fetch_schema(self.config.paths.schema_path.clone()).await;

        let category_hint = match self.category_hint(question).await {
            Ok(hint) => hint,
            Err(e) => {
                error!("Category expansion failed: {}", e);
                return Resolution::failed(self.llm.error_message(&e), Outcome::ServiceError, None);
            }
        };

        let messages = match build_messages(
            &schema,
            &get_examples(),
            category_hint.as_deref(),
            &self.config.pipeline.dialect,
            question,
        ) {
            Ok(messages) => messages,
            Err(e) => {
                error!("Failed to render prompts: {}", e);
                return Resolution::failed(format!("Prompt error : {}", e), Outcome::PromptError, category_hint);
            }
        };

        let result = match self
            .llm
            .generate(&messages, self.config.pipeline.temperature)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("{}", self.llm.error_message(&e));
                return Resolution::failed(self.llm.error_message(&e), Outcome::ServiceError, category_hint);
            }
        };

        let (answer, outcome) = match result.sql().map(check_read_only) {
            None | Some(Err(GuardViolation::Empty)) => {
                warn!("Structured response carried no query");
                (NO_QUERY_FOUND.to_string(), Outcome::NoQuery)
            }
            Some(Ok(sql)) if sql == REFUSAL_MESSAGE => (sql, Outcome::Refused),
            Some(Ok(sql)) => (sql, Outcome::Sql),
            Some(Err(violation)) => {
                warn!("Rejected generated query ({}): {:?}", violation, result.query);
                (READ_ONLY_VIOLATION.to_string(), Outcome::Rejected)
            }
        };

        Resolution {
            answer,
            outcome,
            steps: result.steps,
            category_hint,
        }
    }

    async fn category_hint(&self, question: &str) -> Result<Option<String>, LlmError> {
        let pipeline = &self.config.pipeline;
        if !pipeline.expand_categories {
            return Ok(None);
        }

        let translations = fetch_category_translations(
            self.config.paths.db_path.clone(),
            pipeline.category_table.clone(),
        )
        .await;
        if translations.is_empty() {
            info!("No category translations available, skipping category expansion");
            return Ok(None);
        }

        let expansion = self
            .llm
            .expand_categories(question, &translations, pipeline.category_temperature)
            .await?;
        info!(
            "Category expansion: {:?} -> {:?}",
            expansion.query, expansion.expanded_query
        );

        Ok(expansion.as_hint())
    }
}
