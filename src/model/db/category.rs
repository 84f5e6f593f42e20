use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voting category data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCore {
    pub name: String,
    /// Position in the public listing, ascending.
    pub order: u32,
    /// Inactive categories are hidden from voters but kept for results.
    pub is_active: bool,
    /// Whether a device may append further groups after its first vote.
    pub allow_multiple_winners: bool,
}

/// A category without an ID.
pub type NewCategory = CategoryCore;

/// A voting category from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub category: CategoryCore,
}

impl Deref for Category {
    type Target = CategoryCore;

    fn deref(&self) -> &Self::Target {
        &self.category
    }
}

impl DerefMut for Category {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.category
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CategoryCore {
        pub fn example() -> Self {
            Self {
                name: "Mais Animado".to_string(),
                order: 1,
                is_active: true,
                allow_multiple_winners: false,
            }
        }

        pub fn example_multi() -> Self {
            Self {
                name: "Melhor Dupla".to_string(),
                order: 2,
                is_active: true,
                allow_multiple_winners: true,
            }
        }

        pub fn example_inactive() -> Self {
            Self {
                name: "Revelação 2024".to_string(),
                order: 3,
                is_active: false,
                allow_multiple_winners: false,
            }
        }
    }
}
