use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info};

/// Reads the schema description (mermaid ER text) used as prompt context.
///
/// The text is returned untouched. A missing or unreadable file is logged once
/// and yields an empty string so the request can continue without schema context.
pub fn load_schema(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();

    match fs::read_to_string(path) {
        Ok(schema) => {
            info!("Loaded schema from {} ({} bytes)", path.display(), schema.len());
            schema
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!("Schema file not found: {}", path.display());
            String::new()
        }
        Err(e) => {
            error!("Failed to read schema file {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Runs [`load_schema`] on the blocking pool.
pub async fn fetch_schema(path: String) -> String {
    match tokio::task::spawn_blocking(move || load_schema(&path)).await {
        Ok(schema) => schema,
        Err(e) => {
            error!("Schema read task failed: {}", e);
            String::new()
        }
    }
}
