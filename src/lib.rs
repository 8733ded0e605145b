pub mod config;
pub mod db;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod sql_guard;
pub mod util;
pub mod web;

pub use pipeline::Pipeline;
