use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::finance::{PaymentStatus, PaymentType};
use crate::model::mongodb::Id;

/// Core registration data for one retreat attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationCore {
    pub name: String,
    /// Stored lowercased; uniqueness is enforced by an index.
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub emergency_contact: String,
    pub emergency_phone: String,
    pub medical_info: Option<String>,
    pub notes: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub payment_status: PaymentStatus,
    pub amount_paid: Option<f64>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub registered_at: DateTime<Utc>,
    #[serde(default, with = "opt_bson_datetime")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// A registration without an ID.
pub type NewRegistration = RegistrationCore;

/// A registration from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub registration: RegistrationCore,
}

impl Deref for Registration {
    type Target = RegistrationCore;

    fn deref(&self) -> &Self::Target {
        &self.registration
    }
}

impl DerefMut for Registration {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.registration
    }
}

/// BSON datetime serialisation for optional fields, which
/// `chrono_datetime_as_bson_datetime` does not cover.
mod opt_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(bson::DateTime::to_chrono))
    }
}
