use duckdb::{AccessMode, Config, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

/// English category name -> dataset-local category name.
pub type CategoryTranslationMap = BTreeMap<String, String>;

/// Reads the category translation table from the reference database.
///
/// The table holds `product_category_name` (local) and
/// `product_category_name_english`. The connection is opened read-only and
/// dropped before returning on every path. Any failure is logged and yields
/// an empty map.
pub fn load_category_translations(db_path: impl AsRef<Path>, table: &str) -> CategoryTranslationMap {
    let db_path = db_path.as_ref();

    match read_translations(db_path, table) {
        Ok(translations) => {
            info!(
                "Loaded {} category translations from {}.{}",
                translations.len(),
                db_path.display(),
                table
            );
            translations
        }
        Err(e) => {
            error!(
                "Failed to load category translations from {} (table {}): {}",
                db_path.display(),
                table,
                e
            );
            CategoryTranslationMap::new()
        }
    }
}

/// Runs [`load_category_translations`] on the blocking pool.
pub async fn fetch_category_translations(db_path: String, table: String) -> CategoryTranslationMap {
    match tokio::task::spawn_blocking(move || load_category_translations(&db_path, &table)).await {
        Ok(translations) => translations,
        Err(e) => {
            error!("Category translation lookup task failed: {}", e);
            CategoryTranslationMap::new()
        }
    }
}

fn read_translations(db_path: &Path, table: &str) -> Result<CategoryTranslationMap, duckdb::Error> {
    let config = Config::default().access_mode(AccessMode::ReadOnly)?;
    let conn = Connection::open_with_flags(db_path, config)?;

    let query = format!(
        "SELECT product_category_name, product_category_name_english FROM {}",
        quote_identifier(table)
    );
    debug!("Category translation query: {}", query);

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?, // local name
            row.get::<_, Option<String>>(1)?, // english name
        ))
    })?;

    let mut translations = CategoryTranslationMap::new();
    for row in rows {
        if let (Some(local), Some(english)) = row? {
            translations.insert(english, local);
        }
    }

    Ok(translations)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
