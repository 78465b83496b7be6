//! Category CLI commands
//!
//! Implements CLI commands for category management.

use clap::Subcommand;

use crate::display::{format_category_details, format_category_list};
use crate::error::{TallyError, TallyResult};
use crate::models::CategoryFlow;
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories (organized by flow)
    List,

    /// Create a new category
    Create {
        /// Category name
        name: String,
        /// Flow: income, expense, or s&i
        #[arg(short, long, default_value = "expense")]
        flow: String,
        /// Display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
    },

    /// Show category details
    Show {
        /// Category name or ID
        category: String,
    },

    /// Delete a category; its transactions become uncategorized
    Delete {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> TallyResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List => {
            let categories = service.list()?;
            print!("{}", format_category_list(&categories));
        }

        CategoryCommands::Create { name, flow, color } => {
            let flow = flow
                .parse::<CategoryFlow>()
                .map_err(|e| TallyError::Validation(e.to_string()))?;
            let category = service.create(&name, flow, color.as_deref())?;

            println!("Created category: {}", category.name);
            println!("  Flow: {}", category.flow.label());
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Show { category } => {
            let cat = service.require(&category)?;
            let count = storage.transactions.get_by_category(cat.id)?.len();
            print!("{}", format_category_details(&cat, count));
        }

        CategoryCommands::Delete { category } => {
            let cat = service.require(&category)?;
            let (deleted, detached) = service.delete(cat.id)?;

            println!("Deleted category: {}", deleted.name);
            if detached > 0 {
                println!("  {} transaction(s) are now uncategorized", detached);
            }
        }
    }

    Ok(())
}
