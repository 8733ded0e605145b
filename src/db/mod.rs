pub mod category_translations;
pub mod schema_loader;
