//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json, and serves
//! as the evaluator's [`TransactionLookup`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{EvaluationError, TallyError};
use crate::models::{CategoryId, OwnerId, Transaction, TransactionId};
use crate::services::resolver::{ReferencedTransaction, TransactionLookup};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with a category index
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: category_id -> transaction_ids
    by_category: RwLock<HashMap<CategoryId, Vec<TransactionId>>>,
}

fn lock_error(e: impl std::fmt::Display) -> TallyError {
    TallyError::Storage(format!("Failed to acquire lock: {}", e))
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build the index
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        data.clear();
        by_category.clear();

        for txn in file_data.transactions {
            if let Some(cat_id) = txn.category_id {
                by_category.entry(cat_id).or_default().push(txn.id);
            }
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

        let file_data = TransactionData { transactions };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all transactions, oldest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(transactions)
    }

    /// Get all transactions of one owner, oldest first
    pub fn get_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Transaction>, TallyError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.belongs_to(owner_id))
            .collect())
    }

    /// Get transactions for a category
    pub fn get_by_category(&self, category_id: CategoryId) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        let by_category = self.by_category.read().map_err(lock_error)?;

        let ids = by_category.get(&category_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(transactions)
    }

    /// Transactions whose expression references `id`
    pub fn get_referencing(&self, id: TransactionId) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        let mut referencing: Vec<_> = data
            .values()
            .filter(|t| t.id != id && t.references(id))
            .cloned()
            .collect();
        referencing.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(referencing)
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        if let Some(old_cat) = data.get(&txn.id).and_then(|old| old.category_id) {
            if let Some(ids) = by_category.get_mut(&old_cat) {
                ids.retain(|&id| id != txn.id);
            }
        }

        if let Some(cat_id) = txn.category_id {
            by_category.entry(cat_id).or_default().push(txn.id);
        }

        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        match data.remove(&id) {
            Some(txn) => {
                if let Some(ids) = txn.category_id.and_then(|c| by_category.get_mut(&c)) {
                    ids.retain(|&tid| tid != id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count transactions
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}

#[async_trait]
impl TransactionLookup for TransactionRepository {
    /// Ids that are not uuids, unknown, or owned by someone else are omitted
    async fn find_by_ids_for_owner(
        &self,
        ids: &[String],
        owner_id: &OwnerId,
    ) -> Result<Vec<ReferencedTransaction>, EvaluationError> {
        let data = self
            .data
            .read()
            .map_err(|e| EvaluationError::Lookup(e.to_string()))?;

        Ok(ids
            .iter()
            .filter_map(|token| {
                let id = token.parse::<TransactionId>().ok()?;
                let txn = data.get(&id).filter(|t| t.belongs_to(owner_id))?;
                Some(ReferencedTransaction {
                    id: token.clone(),
                    expression: txn.expression.as_str().to_string(),
                })
            })
            .collect())
    }
}
