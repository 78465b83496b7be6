//! Transaction service
//!
//! Provides business logic for transaction management: CRUD with the
//! write-time reference checks, and evaluation of stored transactions and
//! ad-hoc expressions for the configured owner.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::error::{EvaluationError, TallyError, TallyResult};
use crate::models::{
    CategoryId, EvaluationResult, Expression, Frequency, OwnerId, Transaction, TransactionId,
};
use crate::storage::Storage;

use super::evaluator::{EvaluationRequest, TransactionEvaluator};
use super::resolver::{ReferencedTransaction, TransactionLookup, DEFAULT_MAX_REFERENCE_DEPTH};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
    owner_id: OwnerId,
    max_depth: usize,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by category
    pub category_id: Option<CategoryId>,
    /// Filter by frequency
    pub frequency: Option<Frequency>,
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by category
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Filter by frequency
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub description: String,
    pub expression: String,
    pub frequency: Frequency,
    pub date: NaiveDate,
    pub category_id: Option<CategoryId>,
    pub notes: Option<String>,
}

/// Changes to apply to an existing transaction; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub description: Option<String>,
    pub expression: Option<String>,
    pub frequency: Option<Frequency>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` clears the category
    pub category_id: Option<Option<CategoryId>>,
    pub notes: Option<String>,
}

/// A stored transaction together with its evaluation outcome
#[derive(Debug, Clone)]
pub struct EvaluatedTransaction {
    pub transaction: Transaction,
    pub result: Result<EvaluationResult, EvaluationError>,
}

/// Serves lookups from storage, except for one transaction that has not
/// been written yet
struct PendingLookup<'p> {
    storage: &'p Storage,
    pending: &'p Transaction,
}

#[async_trait]
impl TransactionLookup for PendingLookup<'_> {
    async fn find_by_ids_for_owner(
        &self,
        ids: &[String],
        owner_id: &OwnerId,
    ) -> Result<Vec<ReferencedTransaction>, EvaluationError> {
        let mut found = self
            .storage
            .transactions
            .find_by_ids_for_owner(ids, owner_id)
            .await?;

        let pending_token = |token: &String| {
            token.parse::<TransactionId>().ok() == Some(self.pending.id)
                && self.pending.belongs_to(owner_id)
        };
        found.retain(|txn| !pending_token(&txn.id));
        found.extend(ids.iter().filter(|id| pending_token(*id)).map(|id| {
            ReferencedTransaction {
                id: id.clone(),
                expression: self.pending.expression.as_str().to_string(),
            }
        }));
        Ok(found)
    }
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service acting for `owner_id`
    pub fn new(storage: &'a Storage, owner_id: OwnerId) -> Self {
        Self {
            storage,
            owner_id,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    /// Override the reference depth cap used for evaluation
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// An evaluator backed by stored transactions
    pub fn evaluator(&self) -> TransactionEvaluator<'a> {
        TransactionEvaluator::new(&self.storage.transactions).with_max_depth(self.max_depth)
    }

    /// Create a new transaction
    pub async fn create(&self, input: CreateTransactionInput) -> TallyResult<Transaction> {
        let expression = parse_expression(&input.expression)?;
        self.check_category(input.category_id)?;

        let mut txn = Transaction::new(
            self.owner_id,
            input.description.trim(),
            expression,
            input.frequency,
            input.date,
        );
        txn.category_id = input.category_id;
        if let Some(notes) = input.notes {
            txn.notes = notes;
        }

        self.check_and_store(&txn).await?;
        Ok(txn)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> TallyResult<Option<Transaction>> {
        Ok(self
            .storage
            .transactions
            .get(id)?
            .filter(|t| t.belongs_to(&self.owner_id)))
    }

    /// Find a transaction by full id, `txn-` id, or unique id prefix
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Transaction>> {
        let identifier = identifier.trim().trim_start_matches('$');
        if let Ok(id) = identifier.parse::<TransactionId>() {
            return self.get(id);
        }

        let prefix = identifier.strip_prefix(TransactionId::PREFIX).unwrap_or(identifier);
        if prefix.len() < 4 {
            return Ok(None);
        }

        let mut matches: Vec<_> = self
            .storage
            .transactions
            .get_by_owner(&self.owner_id)?
            .into_iter()
            .filter(|t| t.id.as_uuid().to_string().starts_with(prefix))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => Err(TallyError::Validation(format!(
                "Transaction id '{}' is ambiguous ({} matches)",
                identifier, n
            ))),
        }
    }

    /// Find a transaction or fail with a not-found error
    pub fn require(&self, identifier: &str) -> TallyResult<Transaction> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::transaction_not_found(identifier))
    }

    /// List the owner's transactions with optional filtering
    pub fn list(&self, filter: TransactionFilter) -> TallyResult<Vec<Transaction>> {
        let mut transactions = match filter.category_id {
            Some(category_id) => self.storage.transactions.get_by_category(category_id)?,
            None => self.storage.transactions.get_all()?,
        };

        transactions.retain(|t| t.belongs_to(&self.owner_id));
        if let Some(frequency) = filter.frequency {
            transactions.retain(|t| t.frequency == frequency);
        }
        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }

    /// Update an existing transaction
    pub async fn update(
        &self,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> TallyResult<Transaction> {
        let mut txn = self
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        if let Some(expression) = input.expression {
            txn.expression = parse_expression(&expression)?;
        }
        if let Some(frequency) = input.frequency {
            txn.frequency = frequency;
        }
        if let Some(date) = input.date {
            txn.date = date;
        }
        if let Some(category_id) = input.category_id {
            self.check_category(category_id)?;
            txn.category_id = category_id;
        }
        if let Some(notes) = input.notes {
            txn.notes = notes;
        }
        txn.updated_at = Utc::now();

        self.check_and_store(&txn).await?;
        Ok(txn)
    }

    /// Delete a transaction
    ///
    /// Refuses while other transactions reference it, unless `force` is set.
    pub fn delete(&self, id: TransactionId, force: bool) -> TallyResult<Transaction> {
        let txn = self
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        let referencing = self.storage.transactions.get_referencing(id)?;
        if !referencing.is_empty() && !force {
            let names: Vec<_> = referencing.iter().map(|t| t.description.as_str()).collect();
            return Err(TallyError::Validation(format!(
                "Transaction '{}' is referenced by: {} (use --force to delete anyway)",
                txn.description,
                names.join(", ")
            )));
        }

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;
        Ok(txn)
    }

    /// Evaluate one stored transaction
    pub async fn evaluate(&self, id: TransactionId) -> TallyResult<EvaluationResult> {
        let txn = self
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;
        Ok(self.evaluator().evaluate_transaction(&txn).await?)
    }

    /// Evaluate every transaction of the owner
    ///
    /// Failures are kept per transaction; deciding what a failure means for
    /// a batch is up to the caller.
    pub async fn evaluate_all(&self) -> TallyResult<Vec<EvaluatedTransaction>> {
        let evaluator = self.evaluator();
        let transactions = self.storage.transactions.get_by_owner(&self.owner_id)?;

        let mut evaluated = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let result = evaluator.evaluate_transaction(&transaction).await;
            evaluated.push(EvaluatedTransaction {
                transaction,
                result,
            });
        }
        Ok(evaluated)
    }

    /// Evaluate an unsaved expression against the owner's transactions
    pub async fn preview(
        &self,
        expression: &str,
        frequency: Frequency,
    ) -> TallyResult<EvaluationResult> {
        let expression = parse_expression(expression)?;
        let request = EvaluationRequest::new(expression.as_str(), frequency).for_owner(&self.owner_id);
        Ok(self.evaluator().evaluate(request).await?)
    }

    fn check_category(&self, category_id: Option<CategoryId>) -> TallyResult<()> {
        if let Some(cat_id) = category_id {
            self.storage
                .categories
                .get(cat_id)?
                .ok_or_else(|| TallyError::category_not_found(cat_id.to_string()))?;
        }
        Ok(())
    }

    /// Reject self references, invalid fields and expressions that do not
    /// evaluate (as if `txn` were already stored), then persist
    async fn check_and_store(&self, txn: &Transaction) -> TallyResult<()> {
        if txn.references_itself() {
            return Err(EvaluationError::SelfReference(txn.id.as_uuid().to_string()).into());
        }

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let lookup = PendingLookup {
            storage: self.storage,
            pending: txn,
        };
        TransactionEvaluator::new(&lookup)
            .with_max_depth(self.max_depth)
            .evaluate_transaction(txn)
            .await?;

        debug!(id = %txn.id, expression = %txn.expression, "Storing transaction");
        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        Ok(())
    }
}

fn parse_expression(value: &str) -> TallyResult<Expression> {
    Expression::new(value).map_err(|e| TallyError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Category, CategoryFlow, TransactionKind};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn input(description: &str, expression: &str) -> CreateTransactionInput {
        CreateTransactionInput {
            description: description.into(),
            expression: expression.into(),
            frequency: Frequency::Month,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            category_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_evaluate() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());

        let salary = service.create(input("Salary", "3000")).await.unwrap();
        let tithe = service
            .create(input("Tithe", &format!("{} * -0.1", salary.reference_token())))
            .await
            .unwrap();

        let result = service.evaluate(tithe.id).await.unwrap();
        assert_eq!(result.amount, -300.0);
        assert_eq!(result.kind, TransactionKind::Expense);
        assert_eq!(storage.transactions.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_reference() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());

        let missing = format!("${} + 1", TransactionId::new().as_uuid());
        let err = service.create(input("Broken", &missing)).await.unwrap_err();
        assert!(matches!(
            err.as_evaluation().map(|e| e.root_cause()),
            Some(EvaluationError::ReferenceNotFound(_))
        ));
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());

        let err = service.create(input("  ", "10")).await.unwrap_err();
        assert!(err.is_validation());

        let mut bad_category = input("Rent", "-1200");
        bad_category.category_id = Some(CategoryId::new());
        let err = service.create(bad_category).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_rejects_self_reference() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());
        let txn = service.create(input("Rent", "-1200")).await.unwrap();

        let update = UpdateTransactionInput {
            expression: Some(format!("{} * 2", txn.reference_token())),
            ..Default::default()
        };
        let err = service.update(txn.id, update).await.unwrap_err();
        assert!(matches!(
            err.as_evaluation(),
            Some(EvaluationError::SelfReference(_))
        ));

        let stored = service.get(txn.id).unwrap().unwrap();
        assert_eq!(stored.expression.as_str(), "-1200");
    }

    #[tokio::test]
    async fn test_update_rejects_cycles() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());
        let a = service.create(input("A", "10")).await.unwrap();
        let b = service
            .create(input("B", &format!("{} + 1", a.reference_token())))
            .await
            .unwrap();

        let update = UpdateTransactionInput {
            expression: Some(format!("{} * 2", b.reference_token())),
            ..Default::default()
        };
        let err = service.update(a.id, update).await.unwrap_err();
        assert!(err.as_evaluation().unwrap().is_circular());
    }

    #[tokio::test]
    async fn test_update_fields() {
        let (_temp_dir, storage) = create_test_storage();
        let category = Category::new("Housing", CategoryFlow::Expense);
        let category_id = category.id;
        storage.categories.upsert(category).unwrap();

        let service = TransactionService::new(&storage, OwnerId::new());
        let txn = service.create(input("Rent", "-1200")).await.unwrap();

        let update = UpdateTransactionInput {
            frequency: Some(Frequency::Year),
            category_id: Some(Some(category_id)),
            ..Default::default()
        };
        let updated = service.update(txn.id, update).await.unwrap();
        assert_eq!(updated.frequency, Frequency::Year);
        assert_eq!(updated.category_id, Some(category_id));

        let list = service
            .list(TransactionFilter::new().category(category_id))
            .unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_refuses_while_referenced() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());
        let salary = service.create(input("Salary", "3000")).await.unwrap();
        service
            .create(input("Savings", &format!("{} * 0.2", salary.reference_token())))
            .await
            .unwrap();

        let err = service.delete(salary.id, false).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Savings"));

        service.delete(salary.id, true).unwrap();
        assert!(service.get(salary.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_prefix() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());
        let txn = service.create(input("Rent", "-1200")).await.unwrap();
        let full = txn.id.as_uuid().to_string();

        assert_eq!(service.find(&full).unwrap().unwrap().id, txn.id);
        assert_eq!(service.find(&txn.id.to_string()).unwrap().unwrap().id, txn.id);
        assert_eq!(service.find(&format!("${}", full)).unwrap().unwrap().id, txn.id);
        assert!(service.find("zz").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_isolation() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = TransactionService::new(&storage, OwnerId::new());
        let bob = TransactionService::new(&storage, OwnerId::new());

        let rent = alice.create(input("Rent", "-1200")).await.unwrap();
        assert!(bob.get(rent.id).unwrap().is_none());
        assert!(bob.list(TransactionFilter::new()).unwrap().is_empty());

        let err = bob
            .preview(&format!("{} / 2", rent.reference_token()), Frequency::Month)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_evaluation().map(|e| e.root_cause()),
            Some(EvaluationError::ReferenceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_evaluate_all_keeps_failures() {
        let (_temp_dir, storage) = create_test_storage();
        let owner = OwnerId::new();
        let service = TransactionService::new(&storage, owner);
        service.create(input("Salary", "3000")).await.unwrap();

        // Written around the service, as an older data file might contain
        let broken = Transaction::new(
            owner,
            "Broken",
            Expression::new("1 / 0").unwrap(),
            Frequency::Month,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        storage.transactions.upsert(broken).unwrap();

        let evaluated = service.evaluate_all().await.unwrap();
        assert_eq!(evaluated.len(), 2);
        assert!(evaluated[0].result.is_ok());
        assert!(evaluated[1].result.as_ref().unwrap_err().is_non_numeric());
    }

    #[tokio::test]
    async fn test_preview() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage, OwnerId::new());

        let result = service.preview("100 * 52", Frequency::Year).await.unwrap();
        assert_eq!(result.amount, 5200.0);
        assert!((result.normalized_amount - 433.333_333_333).abs() < 1e-6);
    }
}
