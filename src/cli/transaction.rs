//! Transaction CLI commands
//!
//! Implements CLI commands for creating, listing, editing, deleting and
//! evaluating formula transactions.

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_amount, format_transaction_details, format_transaction_register};
use crate::error::TallyResult;
use crate::models::{CategoryId, Frequency};
use crate::services::{
    CategoryService, CreateTransactionInput, EvaluatedTransaction, TransactionFilter,
    UpdateTransactionInput,
};
use crate::storage::Storage;

use super::{parse_date, parse_frequency, transaction_service};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Description (e.g. "Rent")
        description: String,
        /// Amount formula; reference other transactions with $<id>
        #[arg(allow_hyphen_values = true)]
        expression: String,
        /// Recurrence frequency (daily, week, fortnight, month, ...)
        #[arg(short, long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
        /// Date of the first occurrence (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List transactions with their evaluated amounts
    List {
        /// Filter by category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by frequency
        #[arg(short, long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
        /// Number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show transaction details
    Show {
        /// Transaction ID (full, txn- prefixed, or a unique prefix)
        id: String,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New amount formula
        #[arg(short, long, allow_hyphen_values = true)]
        expression: Option<String>,
        /// New frequency
        #[arg(short, long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
        /// New first-occurrence date
        #[arg(short, long)]
        date: Option<String>,
        /// New category name or ID
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the category
        #[arg(long)]
        clear_category: bool,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
        /// Delete even if other transactions reference it
        #[arg(long)]
        force: bool,
    },

    /// Evaluate a stored transaction
    Eval {
        /// Transaction ID
        id: String,
    },
}

fn resolve_category(storage: &Storage, identifier: Option<&str>) -> TallyResult<Option<CategoryId>> {
    identifier
        .map(|name| CategoryService::new(storage).require(name).map(|c| c.id))
        .transpose()
}

/// Handle a transaction command
pub async fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> TallyResult<()> {
    let service = transaction_service(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        TransactionCommands::Add {
            description,
            expression,
            frequency,
            date,
            category,
            notes,
        } => {
            let date = match date {
                Some(d) => parse_date(&d, &settings.date_format)?,
                None => Local::now().date_naive(),
            };

            let txn = service
                .create(CreateTransactionInput {
                    description,
                    expression,
                    frequency: frequency.unwrap_or(settings.default_frequency),
                    date,
                    category_id: resolve_category(storage, category.as_deref())?,
                    notes,
                })
                .await?;
            let result = service.evaluate(txn.id).await?;

            println!("Created transaction: {}", txn.description);
            println!("  ID:        {}", txn.id);
            println!("  Reference: {}", txn.reference_token());
            println!(
                "  Amount:    {} ({})",
                format_amount(result.amount, currency),
                result.kind
            );
            println!(
                "  Monthly:   {}",
                txn.frequency.normalized_amount_display(result.amount)
            );
        }

        TransactionCommands::List {
            category,
            frequency,
            limit,
        } => {
            let mut filter = TransactionFilter::new();
            if let Some(cat_id) = resolve_category(storage, category.as_deref())? {
                filter = filter.category(cat_id);
            }
            if let Some(frequency) = frequency {
                filter = filter.frequency(frequency);
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }

            let evaluator = service.evaluator();
            let mut entries = Vec::new();
            for transaction in service.list(filter)? {
                let result = evaluator.evaluate_transaction(&transaction).await;
                entries.push(EvaluatedTransaction {
                    transaction,
                    result,
                });
            }

            print!("{}", format_transaction_register(&entries, currency));
        }

        TransactionCommands::Show { id } => {
            let txn = service.require(&id)?;
            let result = service.evaluator().evaluate_transaction(&txn).await;
            let category_name = match txn.category_id {
                Some(cat_id) => CategoryService::new(storage).get(cat_id)?.map(|c| c.name),
                None => None,
            };

            print!(
                "{}",
                format_transaction_details(&txn, &result, category_name.as_deref(), currency)
            );

            let referencing = storage.transactions.get_referencing(txn.id)?;
            if !referencing.is_empty() {
                println!("\nReferenced by:");
                for other in referencing {
                    println!("  {} {}", other.id, other.description);
                }
            }
        }

        TransactionCommands::Edit {
            id,
            description,
            expression,
            frequency,
            date,
            category,
            clear_category,
            notes,
        } => {
            let txn = service.require(&id)?;

            let category_id = if clear_category {
                Some(None)
            } else {
                resolve_category(storage, category.as_deref())?.map(Some)
            };
            let date = date
                .map(|d| parse_date(&d, &settings.date_format))
                .transpose()?;

            let updated = service
                .update(
                    txn.id,
                    UpdateTransactionInput {
                        description,
                        expression,
                        frequency,
                        date,
                        category_id,
                        notes,
                    },
                )
                .await?;

            println!("Updated transaction: {}", updated);
        }

        TransactionCommands::Delete { id, force } => {
            let txn = service.require(&id)?;
            let deleted = service.delete(txn.id, force)?;
            println!("Deleted transaction: {} ({})", deleted.description, deleted.id);
        }

        TransactionCommands::Eval { id } => {
            let txn = service.require(&id)?;
            let result = service.evaluate(txn.id).await?;

            println!("{} = {}", txn.expression, result.amount);
            println!("Type:    {}", result.kind);
            println!(
                "Monthly: {}",
                txn.frequency.normalized_amount_display(result.amount)
            );
        }
    }

    Ok(())
}
