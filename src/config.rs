use clap::{Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "openai" or "azure"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub api_version: Option<String>,
    pub deployment: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    pub schema_path: String,
    pub db_path: String,
    pub log_file: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    pub temperature: f32,
    pub category_temperature: f32,
    pub expand_categories: bool,
    pub category_table: String,
    /// SQL dialect named in the system prompt
    pub dialect: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub paths: PathsConfig,
    pub pipeline: PipelineConfig,
    pub web: WebConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model name (or Azure deployment model) to use
    #[arg(long)]
    pub model: Option<String>,

    /// Path to the mermaid schema description
    #[arg(long)]
    pub schema_path: Option<String>,

    /// Path to the reference database holding category translations
    #[arg(long)]
    pub db_path: Option<String>,

    /// Translate product category terms before generating SQL
    #[arg(long)]
    pub expand_categories: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate SQL for a single question and print it
    Ask {
        /// The natural-language question
        question: String,
    },
    /// Serve the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Conventional environment variables and the config keys they populate.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("LLM_BACKEND", "llm.backend"),
    ("OPENAI_API_KEY", "llm.api_key"),
    ("OPENAI_MODEL", "llm.model"),
    ("OPENAI_API_URL", "llm.api_url"),
    ("AZURE_OPENAI_ENDPOINT", "llm.azure_endpoint"),
    ("AZURE_OPENAI_API_VERSION", "llm.api_version"),
    ("AZURE_OPENAI_DEPLOYMENT", "llm.deployment"),
    ("SCHEMA_PATH", "paths.schema_path"),
    ("DB_PATH", "paths.db_path"),
    ("LOG_FILE", "paths.log_file"),
];

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::load(args.config.as_deref())?;

        // Override with command line args if provided
        if let Some(model) = &args.model {
            config.llm.model = model.clone();
        }
        if let Some(schema_path) = &args.schema_path {
            config.paths.schema_path = schema_path.clone();
        }
        if let Some(db_path) = &args.db_path {
            config.paths.db_path = db_path.clone();
        }
        if args.expand_categories {
            config.pipeline.expand_categories = true;
        }
        if let Command::Serve { host, port } = &args.command {
            if let Some(host) = host {
                config.web.host = host.clone();
            }
            if let Some(port) = port {
                config.web.port = *port;
            }
        }

        Ok(config)
    }

    /// Layers defaults, a TOML file, `NL_SQL__SECTION__KEY` variables and the
    /// conventional OpenAI/Azure variables, in increasing precedence.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = config_path {
            config_builder = config_builder.add_source(File::from(config_path));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/nl-sql/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("NL_SQL")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in ENV_OVERRIDES {
            config_builder = config_builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        config_builder.build()?.try_deserialize()
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                backend: "openai".to_string(),
                model: "gpt-4o".to_string(),
                api_key: None,
                api_url: None,
                azure_endpoint: None,
                api_version: None,
                deployment: None,
                timeout_secs: 60,
                max_retries: 2,
                retry_backoff_ms: 500,
            },
            paths: PathsConfig {
                schema_path: "db/schema.txt".to_string(),
                db_path: "db/olist.duckdb".to_string(),
                log_file: Some("logs/sql_generation.log".to_string()),
            },
            pipeline: PipelineConfig {
                temperature: 0.7,
                category_temperature: 0.3,
                expand_categories: false,
                category_table: "product_category_name_translation".to_string(),
                dialect: "SQLite".to_string(),
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
        }
    }
}
