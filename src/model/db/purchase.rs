use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A single line item on a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl PurchaseItem {
    /// Line total for this item.
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Core purchase data: an itemised shop receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCore {
    pub shop_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub items: Vec<PurchaseItem>,
    /// Sum of the item subtotals, stored so list queries avoid re-summing.
    pub total: f64,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

/// A purchase without an ID.
pub type NewPurchase = PurchaseCore;

/// A purchase from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub purchase: PurchaseCore,
}

impl Deref for Purchase {
    type Target = PurchaseCore;

    fn deref(&self) -> &Self::Target {
        &self.purchase
    }
}

impl DerefMut for Purchase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.purchase
    }
}
