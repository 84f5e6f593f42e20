use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core shop data: a place where retreat supplies are bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCore {
    pub name: String,
    pub is_active: bool,
}

/// A shop without an ID.
pub type NewShop = ShopCore;

/// A shop from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub shop: ShopCore,
}

impl Deref for Shop {
    type Target = ShopCore;

    fn deref(&self) -> &Self::Target {
        &self.shop
    }
}

impl DerefMut for Shop {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.shop
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ShopCore {
        pub fn example() -> Self {
            Self {
                name: "Mercado Central".to_string(),
                is_active: true,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Atacadão do Vale".to_string(),
                is_active: true,
            }
        }
    }
}
