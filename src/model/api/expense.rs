use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{date::ApiDate, id::ApiId},
    common::finance::ExpenseCategory,
    db::expense::{Expense, NewExpense},
};

/// An expense, as submitted by an admin. Used for both creation and
/// full-document update.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSpec {
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: ApiDate,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ExpenseSpec> for NewExpense {
    fn from(spec: ExpenseSpec) -> Self {
        Self {
            description: spec.description.trim().to_string(),
            amount: spec.amount,
            category: spec.category,
            date: *spec.date,
            receipt_url: normalise(spec.receipt_url),
            notes: normalise(spec.notes),
        }
    }
}

/// An expense as listed to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDescription {
    pub id: ApiId,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: DateTime<Utc>,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

impl From<Expense> for ExpenseDescription {
    fn from(expense: Expense) -> Self {
        let core = expense.expense;
        Self {
            id: expense.id.into(),
            description: core.description,
            amount: core.amount,
            category: core.category,
            date: core.date,
            receipt_url: core.receipt_url,
            notes: core.notes,
        }
    }
}

/// Query filters for the expense listing. All optional and combinable.
#[derive(Debug, FromForm)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    #[field(name = "startDate")]
    pub start_date: Option<ApiDate>,
    #[field(name = "endDate")]
    pub end_date: Option<ApiDate>,
}

/// Trim an optional field, mapping whitespace-only values to `None`.
fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ExpenseSpec {
        pub fn example() -> Self {
            Self {
                description: "Aluguel do sítio".to_string(),
                amount: 1500.0,
                category: ExpenseCategory::Rent,
                date: "2025-01-10".parse().unwrap(),
                receipt_url: None,
                notes: None,
            }
        }

        pub fn example_food() -> Self {
            Self {
                description: "Compra da feira".to_string(),
                amount: 320.5,
                category: ExpenseCategory::Food,
                date: "2025-01-12".parse().unwrap(),
                receipt_url: Some("/uploads/receipts/receipt_1736640000000_1234.jpg".to_string()),
                notes: Some("Frutas e verduras".to_string()),
            }
        }
    }
}
