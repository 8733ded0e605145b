use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use nl_sql::config::{AppConfig, CliArgs, Command};
use nl_sql::llm::LlmManager;
use nl_sql::pipeline::Pipeline;
use nl_sql::util::logging::init_tracing;
use nl_sql::web::{self, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up OPENAI_API_KEY and friends from a local .env
    dotenv::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Initialize logging
    init_tracing(config.paths.log_file.as_deref().map(Path::new));
    info!(
        "Loaded configuration (schema: {}, reference db: {})",
        config.paths.schema_path, config.paths.db_path
    );

    // Initialize LLM manager
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = match LlmManager::new(&config.llm) {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            error!("Failed to initialize LLM manager: {}", e);
            return Err(e.into());
        }
    };

    let config = Arc::new(config);
    let pipeline = Pipeline::new(Arc::clone(&config), llm_manager);

    match args.command {
        Command::Ask { question } => {
            let answer = pipeline.answer_question(&question).await;
            println!("{}", answer);
        }
        Command::Serve { .. } => {
            let app_state = Arc::new(AppState::new(Arc::clone(&config), pipeline));

            info!("Starting NL-SQL server on {}:{}", config.web.host, config.web.port);
            match web::run_server(config.web.clone(), app_state).await {
                Ok(_) => info!("Server stopped gracefully"),
                Err(e) => {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
