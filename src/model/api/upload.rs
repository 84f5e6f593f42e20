use serde::{Deserialize, Serialize};

/// Where an uploaded receipt can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedReceipt {
    pub url: String,
}

impl UploadedReceipt {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}
