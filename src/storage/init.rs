//! Storage initialization
//!
//! Handles first-run setup and default data creation

use crate::config::paths::TallyPaths;
use crate::error::TallyError;
use crate::models::DefaultCategory;

use super::categories::CategoryData;
use super::file_io::write_json_atomic;

/// Initialize storage for a fresh installation
///
/// Creates the data directory and seeds the default categories
pub fn initialize_storage(paths: &TallyPaths) -> Result<(), TallyError> {
    paths.ensure_directories()?;

    if !paths.categories_file().exists() {
        create_default_categories(paths)?;
    }

    Ok(())
}

fn create_default_categories(paths: &TallyPaths) -> Result<(), TallyError> {
    let categories = DefaultCategory::all()
        .iter()
        .map(DefaultCategory::to_category)
        .collect();

    write_json_atomic(paths.categories_file(), &CategoryData { categories })
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &TallyPaths) -> bool {
    !paths.categories_file().exists()
}
