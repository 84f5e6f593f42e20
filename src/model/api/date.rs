use std::{ops::Deref, str::FromStr};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};
use serde::{Deserialize, Serialize};

/// A point in time accepted in either RFC 3339 form or plain `YYYY-MM-DD`
/// (taken as midnight UTC), matching what date pickers submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiDate(DateTime<Utc>);

impl Deref for ApiDate {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for ApiDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(datetime.with_timezone(&Utc)));
        }
        let date = s.parse::<NaiveDate>()?;
        // Midnight always exists.
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        Ok(Self(Utc.from_utc_datetime(&midnight)))
    }
}

impl TryFrom<String> for ApiDate {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ApiDate> for String {
    fn from(date: ApiDate) -> Self {
        date.0.to_rfc3339()
    }
}

impl From<ApiDate> for DateTime<Utc> {
    fn from(date: ApiDate) -> Self {
        date.0
    }
}

impl From<DateTime<Utc>> for ApiDate {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for ApiDate {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field.value.parse::<ApiDate>().map_err(|err| {
            let error = ErrorKind::Custom(Box::new(err));
            error.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_plain_dates_as_midnight_utc() {
        let date = "2025-01-15".parse::<ApiDate>().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 1, 15));
        assert_eq!((date.hour(), date.minute(), date.second()), (0, 0, 0));
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let date = "2025-01-15T18:30:00-03:00".parse::<ApiDate>().unwrap();
        assert_eq!(date.hour(), 21);
    }

    #[test]
    fn rejects_garbage() {
        assert!("15/01/2025".parse::<ApiDate>().is_err());
        assert!("yesterday".parse::<ApiDate>().is_err());
    }
}
