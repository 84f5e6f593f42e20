use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{date::ApiDate, id::ApiId},
    db::purchase::{NewPurchase, Purchase, PurchaseItem},
    mongodb::Id,
};

/// One line item of a submitted purchase.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemSpec {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl From<PurchaseItemSpec> for PurchaseItem {
    fn from(spec: PurchaseItemSpec) -> Self {
        Self {
            name: spec.name.trim().to_string(),
            quantity: spec.quantity,
            unit_price: spec.unit_price,
        }
    }
}

impl From<PurchaseItem> for PurchaseItemSpec {
    fn from(item: PurchaseItem) -> Self {
        Self {
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// A purchase, as submitted by an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSpec {
    pub shop_id: Id,
    pub date: ApiDate,
    pub items: Vec<PurchaseItemSpec>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<PurchaseSpec> for NewPurchase {
    fn from(spec: PurchaseSpec) -> Self {
        let items: Vec<PurchaseItem> = spec.items.into_iter().map(PurchaseItem::from).collect();
        let total = items.iter().map(PurchaseItem::subtotal).sum();
        Self {
            shop_id: spec.shop_id,
            date: *spec.date,
            items,
            total,
            receipt_url: normalise(spec.receipt_url),
            notes: normalise(spec.notes),
        }
    }
}

/// A purchase as listed to admins, with its shop name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDescription {
    pub id: ApiId,
    pub shop_id: ApiId,
    pub shop_name: String,
    pub date: DateTime<Utc>,
    pub items: Vec<PurchaseItemSpec>,
    pub total: f64,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

impl PurchaseDescription {
    pub fn new(purchase: Purchase, shop_name: String) -> Self {
        let core = purchase.purchase;
        Self {
            id: purchase.id.into(),
            shop_id: core.shop_id.into(),
            shop_name,
            date: core.date,
            items: core.items.into_iter().map(PurchaseItemSpec::from).collect(),
            total: core.total,
            receipt_url: core.receipt_url,
            notes: core.notes,
        }
    }
}

/// Query filters for the purchase listing. All optional and combinable.
#[derive(Debug, FromForm)]
pub struct PurchaseFilter {
    #[field(name = "shopId")]
    pub shop_id: Option<Id>,
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


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_totals_the_items() {
        let purchase = NewPurchase::from(PurchaseSpec::example(Id::new()));
        assert_eq!(purchase.total, 4.0 * 22.5 + 10.0 * 8.9);
    }
}
