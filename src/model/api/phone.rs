use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use phonenumber::PhoneNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A contact phone number from a registration form.
///
/// Parsed with a BR default region, since attendees type numbers in national
/// format; re-serialised in international format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone {
    inner: PhoneNumber,
}

#[derive(Debug, Error)]
#[error("Invalid phone number: {0}")]
pub struct InvalidPhone(String);

impl Display for Phone {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl FromStr for Phone {
    type Err = InvalidPhone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        phonenumber::parse(Some(phonenumber::country::Id::BR), s)
            .map(|inner| Phone { inner })
            .map_err(|_| InvalidPhone(s.to_string()))
    }
}

impl TryFrom<String> for Phone {
    type Error = InvalidPhone;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_national_and_international_formats() {
        assert!("83 99988-7766".parse::<Phone>().is_ok());
        assert!("+55 83 99988-7766".parse::<Phone>().is_ok());
        assert!("not a phone".parse::<Phone>().is_err());
    }
}
