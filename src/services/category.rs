//! Category service
//!
//! Provides business logic for category management: creation with duplicate
//! detection, lookup by name or ID, and deletion that detaches transactions.

use chrono::Utc;

use crate::error::{TallyError, TallyResult};
use crate::models::{Category, CategoryFlow, CategoryId};
use crate::storage::Storage;

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    /// Create a new category service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new category
    pub fn create(
        &self,
        name: &str,
        flow: CategoryFlow,
        color: Option<&str>,
    ) -> TallyResult<Category> {
        let name = name.trim();

        // Check for duplicate name
        if self.storage.categories.get_by_name(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let category = match color {
            Some(color) => Category::with_color(name, flow, color),
            None => Category::new(name, flow),
        };

        category
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        Ok(category)
    }

    /// Get a category by ID
    pub fn get(&self, id: CategoryId) -> TallyResult<Option<Category>> {
        self.storage.categories.get(id)
    }

    /// Find a category by name or ID string
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Category>> {
        // Try by name first
        if let Some(category) = self.storage.categories.get_by_name(identifier)? {
            return Ok(Some(category));
        }

        // Try parsing as ID
        if let Ok(id) = identifier.trim().parse::<CategoryId>() {
            return self.storage.categories.get(id);
        }

        Ok(None)
    }

    /// Find a category or fail with a not-found error
    pub fn require(&self, identifier: &str) -> TallyResult<Category> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::category_not_found(identifier))
    }

    /// List all categories
    pub fn list(&self) -> TallyResult<Vec<Category>> {
        self.storage.categories.get_all()
    }

    /// Delete a category
    ///
    /// Transactions filed under it become uncategorized. Returns the deleted
    /// category and the number of transactions that were detached.
    pub fn delete(&self, id: CategoryId) -> TallyResult<(Category, usize)> {
        let category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        let transactions = self.storage.transactions.get_by_category(id)?;
        let detached = transactions.len();
        for mut txn in transactions {
            txn.category_id = None;
            txn.updated_at = Utc::now();
            self.storage.transactions.upsert(txn)?;
        }
        if detached > 0 {
            self.storage.transactions.save()?;
        }

        self.storage.categories.delete(id)?;
        self.storage.categories.save()?;

        Ok((category, detached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Expression, Frequency, OwnerId, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let category = service
            .create("  Rent ", CategoryFlow::Expense, Some("#EF4444"))
            .unwrap();
        assert_eq!(category.name, "Rent");
        assert_eq!(category.flow, CategoryFlow::Expense);
        assert_eq!(category.color.as_deref(), Some("#EF4444"));
    }

    #[test]
    fn test_create_duplicate_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        service.create("Rent", CategoryFlow::Expense, None).unwrap();
        let result = service.create("RENT", CategoryFlow::Expense, None);
        assert!(matches!(result, Err(TallyError::Duplicate { .. })));
    }

    #[test]
    fn test_create_invalid_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let result = service.create("", CategoryFlow::Income, None);
        assert!(matches!(result, Err(TallyError::Validation(_))));

        let result = service.create("Bonus", CategoryFlow::Income, Some("green"));
        assert!(matches!(result, Err(TallyError::Validation(_))));
        assert_eq!(storage.categories.count().unwrap(), 0);
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let category = service
            .create("Groceries", CategoryFlow::Expense, None)
            .unwrap();

        assert_eq!(service.find("groceries").unwrap().unwrap().id, category.id);
        assert_eq!(
            service.find(&category.id.as_uuid().to_string()).unwrap().unwrap().id,
            category.id
        );
        assert!(service.find("Fuel").unwrap().is_none());
        assert!(service.require("Fuel").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_detaches_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let category = service.create("Housing", CategoryFlow::Expense, None).unwrap();

        let mut txn = Transaction::new(
            OwnerId::new(),
            "Rent",
            Expression::new("-1200").unwrap(),
            Frequency::Month,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        txn.category_id = Some(category.id);
        let txn_id = txn.id;
        storage.transactions.upsert(txn).unwrap();

        let (deleted, detached) = service.delete(category.id).unwrap();
        assert_eq!(deleted.name, "Housing");
        assert_eq!(detached, 1);
        assert!(service.get(category.id).unwrap().is_none());
        assert!(storage
            .transactions
            .get(txn_id)
            .unwrap()
            .unwrap()
            .category_id
            .is_none());
    }
}
