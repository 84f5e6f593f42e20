use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{id::ApiId, phone::Phone},
    common::finance::{PaymentStatus, PaymentType},
    db::registration::{NewRegistration, Registration},
};

/// A submission of the public registration form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub phone: Phone,
    pub age: u32,
    pub emergency_contact: String,
    pub emergency_phone: Phone,
    #[serde(default)]
    pub medical_info: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RegistrationRequest {
    /// The wire name of the first empty required field, if any.
    pub fn first_empty_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.email.trim().is_empty() {
            Some("email")
        } else if self.emergency_contact.trim().is_empty() {
            Some("emergencyContact")
        } else {
            None
        }
    }
}

impl From<RegistrationRequest> for NewRegistration {
    fn from(request: RegistrationRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            // Lowercased so the unique email index is case-insensitive.
            email: request.email.trim().to_lowercase(),
            phone: request.phone.to_string(),
            age: request.age,
            emergency_contact: request.emergency_contact.trim().to_string(),
            emergency_phone: request.emergency_phone.to_string(),
            medical_info: normalise(request.medical_info),
            notes: normalise(request.notes),
            payment_type: None,
            payment_status: PaymentStatus::Pending,
            amount_paid: None,
            registered_at: Utc::now(),
            paid_at: None,
        }
    }
}

/// A registration as listed to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDescription {
    pub id: ApiId,
    pub name: String,
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
    pub registered_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<Registration> for RegistrationDescription {
    fn from(registration: Registration) -> Self {
        let core = registration.registration;
        Self {
            id: registration.id.into(),
            name: core.name,
            email: core.email,
            phone: core.phone,
            age: core.age,
            emergency_contact: core.emergency_contact,
            emergency_phone: core.emergency_phone,
            medical_info: core.medical_info,
            notes: core.notes,
            payment_type: core.payment_type,
            payment_status: core.payment_status,
            amount_paid: core.amount_paid,
            registered_at: core.registered_at,
            paid_at: core.paid_at,
        }
    }
}

/// An admin update to a registration's payment tracking.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub amount_paid: Option<f64>,
}

/// Trim an optional field, mapping whitespace-only values to `None`.
fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
