//! Classify command - map expense descriptions to tax categories.

use clap::Args;
use console::style;
use serde::Serialize;

use hoadon_core::{ExpenseCategory, classify};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Expense descriptions (e.g., "Tiền điện tháng 5")
    #[arg(required = true)]
    descriptions: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ClassifiedExpense<'a> {
    description: &'a str,
    category: ExpenseCategory,
    category_name: &'static str,
    is_deductible: bool,
}

pub async fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let classified: Vec<ClassifiedExpense<'_>> = args
        .descriptions
        .iter()
        .map(|description| {
            let c = classify(description);
            ClassifiedExpense {
                description: description.as_str(),
                category: c.category,
                category_name: c.category.name_vi(),
                is_deductible: c.is_deductible,
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    for expense in &classified {
        let deductible = if expense.is_deductible {
            style("deductible").green()
        } else {
            style("not deductible").yellow()
        };
        println!(
            "{}: {} ({}) - {}",
            expense.description, expense.category, expense.category_name, deductible
        );
    }

    Ok(())
}
