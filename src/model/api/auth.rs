use data_encoding::BASE64;
use mongodb::bson::doc;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::db::admin::Admin;
use crate::model::mongodb::Coll;

/// Body of a successful auth check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}

impl AuthStatus {
    pub fn ok() -> Self {
        Self {
            authenticated: true,
        }
    }
}

/// Proof that a request carried valid admin credentials.
///
/// There are no sessions, cookies or tokens anywhere in the API: every admin
/// request re-sends `Authorization: Basic base64(username:password)` and is
/// re-verified against the stored argon2 hash.
pub struct AdminAuth {
    username: String,
}

impl AdminAuth {
    /// The authenticated admin's username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminAuth {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = match req.headers().get_one("Authorization") {
            Some(header) => header,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Missing admin credentials".to_string()),
                ));
            }
        };

        let (username, password) = match decode_basic(header) {
            Some(credentials) => credentials,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Malformed Basic authorization header".to_string()),
                ));
            }
        };

        // Panics iff the `Database` is not managed, same as `Coll`'s guard.
        let admins = req.guard::<Coll<Admin>>().await.unwrap();
        match verify_credentials(&admins, &username, &password).await {
            Ok(admin) => Outcome::Success(AdminAuth {
                username: admin.admin.username,
            }),
            Err(err @ Error::Unauthorized(_)) => Outcome::Failure((Status::Unauthorized, err)),
            Err(err) => Outcome::Failure((Status::InternalServerError, err)),
        }
    }
}

/// Look up the admin by username and check the password against the stored
/// hash. Shared between the request guard and the login-check endpoint.
pub async fn verify_credentials(
    admins: &Coll<Admin>,
    username: &str,
    password: &str,
) -> Result<Admin> {
    let with_username = doc! {
        "username": username,
    };
    admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(password))
        .ok_or_else(|| {
            Error::Unauthorized(
                "No admin found with the provided username and password combination.".to_string(),
            )
        })
}

/// Split a `Basic <base64>` header into its username and password parts.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim().as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_basic_headers() {
        // "user:pass"
        let (username, password) = decode_basic("Basic dXNlcjpwYXNz").unwrap();
        assert_eq!(username, "user");
        assert_eq!(password, "pass");

        // Passwords may themselves contain colons: "user:pa:ss"
        let (username, password) = decode_basic("Basic dXNlcjpwYTpzcw==").unwrap();
        assert_eq!(username, "user");
        assert_eq!(password, "pa:ss");
    }

    #[test]
    fn rejects_malformed_basic_headers() {
        assert!(decode_basic("Bearer deadbeef").is_none());
        assert!(decode_basic("Basic !!!not-base64!!!").is_none());
        // "nocolon"
        assert!(decode_basic("Basic bm9jb2xvbg==").is_none());
    }
}
