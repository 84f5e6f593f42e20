use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::category::{Category, NewCategory},
};

/// A new category, as submitted by an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub name: String,
    /// Display position. Resolved to max existing + 1 when absent.
    pub order: Option<u32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub allow_multiple_winners: bool,
}

fn default_active() -> bool {
    true
}

impl CategorySpec {
    /// Materialise a new category with its resolved order value.
    pub fn into_category(self, order: u32) -> NewCategory {
        NewCategory {
            name: self.name.trim().to_string(),
            order,
            is_active: self.is_active,
            allow_multiple_winners: self.allow_multiple_winners,
        }
    }
}

/// A partial category update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub is_active: Option<bool>,
    pub allow_multiple_winners: Option<bool>,
}

/// A category as listed to voters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: ApiId,
    pub name: String,
    pub order: u32,
    pub allow_multiple_winners: bool,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.into(),
            name: category.category.name,
            order: category.category.order,
            allow_multiple_winners: category.category.allow_multiple_winners,
        }
    }
}

/// A category as listed to admins, including the active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescription {
    pub id: ApiId,
    pub name: String,
    pub order: u32,
    pub is_active: bool,
    pub allow_multiple_winners: bool,
}

impl From<Category> for CategoryDescription {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.into(),
            name: category.category.name,
            order: category.category.order,
            is_active: category.category.is_active,
            allow_multiple_winners: category.category.allow_multiple_winners,
        }
    }
}

/// A bulk import of category names.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryImportRequest {
    pub names: Vec<String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub message: String,
    pub imported: u32,
    pub skipped: u32,
}

impl ImportReport {
    pub fn new(imported: u32, skipped: u32) -> Self {
        Self {
            message: format!("Imported {imported}, skipped {skipped}"),
            imported,
            skipped,
        }
    }
}
