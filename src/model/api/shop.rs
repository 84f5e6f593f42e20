use serde::{Deserialize, Serialize};

use crate::model::{
    api::{id::ApiId, purchase::PurchaseDescription},
    db::shop::{NewShop, Shop},
};

/// A new shop, as submitted by an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopSpec {
    pub name: String,
}

impl From<ShopSpec> for NewShop {
    fn from(spec: ShopSpec) -> Self {
        Self {
            name: spec.name.trim().to_string(),
            is_active: true,
        }
    }
}

/// A partial shop update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// A shop as listed to admins, with its most recent purchases attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDescription {
    pub id: ApiId,
    pub name: String,
    pub is_active: bool,
    pub recent_purchases: Vec<PurchaseDescription>,
}

impl ShopDescription {
    pub fn new(shop: Shop, recent_purchases: Vec<PurchaseDescription>) -> Self {
        Self {
            id: shop.id.into(),
            name: shop.shop.name,
            is_active: shop.shop.is_active,
            recent_purchases,
        }
    }
}

/// Query parameters for the shop listing.
#[derive(Debug, FromForm)]
pub struct ShopsQuery {
    #[field(name = "includeInactive")]
    pub include_inactive: bool,
}
