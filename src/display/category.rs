//! Category display formatting
//!
//! Formats categories for terminal output, grouped by flow in a tree view.

use crate::models::{Category, CategoryFlow};

/// Format categories as a tree grouped by flow
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'tally init' to create default categories.\n"
            .to_string();
    }

    let mut output = String::new();
    let mut first = true;

    for flow in CategoryFlow::all() {
        let in_flow: Vec<_> = categories.iter().filter(|c| c.flow == *flow).collect();
        if in_flow.is_empty() {
            continue;
        }

        // Blank line between flows
        if !first {
            output.push('\n');
        }
        first = false;

        output.push_str(&format!("{}\n", flow.label()));
        for (i, category) in in_flow.iter().enumerate() {
            let prefix = if i == in_flow.len() - 1 {
                "└── "
            } else {
                "├── "
            };
            let color = category
                .color
                .as_deref()
                .map(|c| format!(" {}", c))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {}{}{}  {}\n",
                prefix, category.name, color, category.id
            ));
        }
    }

    output
}

/// Format category details
pub fn format_category_details(category: &Category, transaction_count: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Category: {}\n", category.name));
    output.push_str(&format!("  ID:           {}\n", category.id));
    output.push_str(&format!("  Flow:         {}\n", category.flow.label()));

    if let Some(color) = &category.color {
        output.push_str(&format!("  Color:        {}\n", color));
    }
    if !category.description.is_empty() {
        output.push_str(&format!("  Description:  {}\n", category.description));
    }
    output.push_str(&format!("  Transactions: {}\n", transaction_count));

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        category.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        category.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
