use std::io::Cursor;

use mongodb::error::Error as DbError;
use rocket::{
    http::{ContentType, Header, Status, StatusClass},
    response::Responder,
    serde::json::serde_json::json,
    Response,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The two ways a vote can collide with an existing ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DuplicateVote {
    /// The device already has a ballot in a single-winner category.
    #[error("You have already voted in this category")]
    Category,
    /// The submitted group equals the device's full voting history
    /// in a multi-winner category.
    #[error("You have already voted for this exact group in this category")]
    Group,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// Unknown category, participant, ballot, or other resource.
    #[error("{0}")]
    NotFound(String),
    /// The resource exists but is deactivated. Deliberately
    /// indistinguishable from `NotFound` on the wire.
    #[error("{0}")]
    Inactive(String),
    #[error("{0}")]
    Unauthorized(String),
    /// A write that collides with existing data, e.g. a duplicate
    /// registration email.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    DuplicateVote(#[from] DuplicateVote),
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::NotFound(_) | Self::Inactive(_) => Status::NotFound,
            Self::Conflict(_) | Self::DuplicateVote(_) => Status::Conflict,
            Self::Db(_) | Self::Io(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        // Internal details go to the log, not the client.
        let message = match status.class() {
            StatusClass::ServerError => {
                error!("{} response: {:?}", status.code, self);
                "Internal server error".to_string()
            }
            _ => {
                warn!("{} response: {}", status.code, self);
                self.to_string()
            }
        };
        let body = json!({ "error": message }).to_string();

        let mut response = Response::build();
        response
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body));
        if status == Status::Unauthorized {
            response.header(Header::new(
                "WWW-Authenticate",
                r#"Basic realm="Admin Area""#,
            ));
        }
        response.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(
            Error::Validation("Missing field".to_string()).status(),
            Status::BadRequest
        );
        assert_eq!(
            Error::NotFound("No such category".to_string()).status(),
            Status::NotFound
        );
        assert_eq!(
            Error::Inactive("Category is closed".to_string()).status(),
            Status::NotFound
        );
        assert_eq!(
            Error::DuplicateVote(DuplicateVote::Category).status(),
            Status::Conflict
        );
        assert_eq!(
            Error::Unauthorized("Admin credentials required".to_string()).status(),
            Status::Unauthorized
        );
    }

    #[test]
    fn duplicate_vote_messages_distinguish_the_reasons() {
        assert_eq!(
            DuplicateVote::Category.to_string(),
            "You have already voted in this category"
        );
        assert_eq!(
            DuplicateVote::Group.to_string(),
            "You have already voted for this exact group in this category"
        );
    }
}
