use mongodb::bson::Bson;
use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How a registered attendee intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Full,
    Daily,
    Partial,
}

/// Where an attendee's payment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        }
    }
}

impl From<PaymentStatus> for Bson {
    fn from(status: PaymentStatus) -> Self {
        Bson::String(status.as_str().to_string())
    }
}

/// Budget category of a retreat expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Cooking,
    Rent,
    Cleaning,
    Materials,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Transport => "TRANSPORT",
            Self::Cooking => "COOKING",
            Self::Rent => "RENT",
            Self::Cleaning => "CLEANING",
            Self::Materials => "MATERIALS",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown expense category: {0}")]
pub struct UnknownExpenseCategory(String);

impl FromStr for ExpenseCategory {
    type Err = UnknownExpenseCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOOD" => Ok(Self::Food),
            "TRANSPORT" => Ok(Self::Transport),
            "COOKING" => Ok(Self::Cooking),
            "RENT" => Ok(Self::Rent),
            "CLEANING" => Ok(Self::Cleaning),
            "MATERIALS" => Ok(Self::Materials),
            "OTHER" => Ok(Self::Other),
            other => Err(UnknownExpenseCategory(other.to_string())),
        }
    }
}

impl From<ExpenseCategory> for Bson {
    fn from(category: ExpenseCategory) -> Self {
        Bson::String(category.as_str().to_string())
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for ExpenseCategory {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field.value.parse::<ExpenseCategory>().map_err(|err| {
            let error = ErrorKind::Custom(Box::new(err));
            error.into()
        })
    }
}
