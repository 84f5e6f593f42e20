use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::finance::ExpenseCategory;
use crate::model::mongodb::Id;

/// Core expense data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCore {
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

/// An expense without an ID.
pub type NewExpense = ExpenseCore;

/// An expense from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub expense: ExpenseCore,
}

impl Deref for Expense {
    type Target = ExpenseCore;

    fn deref(&self) -> &Self::Target {
        &self.expense
    }
}

impl DerefMut for Expense {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.expense
    }
}
