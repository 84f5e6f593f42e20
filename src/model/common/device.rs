use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use mongodb::bson::Bson;
use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An opaque client-generated token standing in for voter identity.
/// The server never interprets it beyond equality comparisons; the only
/// requirement is that it is non-empty.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

#[derive(Debug, Error)]
#[error("Device ID must not be empty")]
pub struct EmptyDeviceId;

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = EmptyDeviceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            Err(EmptyDeviceId)
        } else {
            Ok(Self(token.to_string()))
        }
    }
}

impl TryFrom<String> for DeviceId {
    type Error = EmptyDeviceId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl From<DeviceId> for Bson {
    fn from(id: DeviceId) -> Self {
        Bson::String(id.0)
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for DeviceId {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field.value.parse::<DeviceId>().map_err(|err| {
            let error = ErrorKind::Custom(Box::new(err));
            error.into()
        })
    }
}
