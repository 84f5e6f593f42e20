use rocket::{Catcher, Route};

use crate::error::Error;

mod admin;
mod auth;
mod finance;
mod registration;
mod upload;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(voting::routes());
    routes.extend(admin::routes());
    routes.extend(registration::routes());
    routes.extend(finance::routes());
    routes.extend(upload::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized]
}

/// Failed request guards don't carry their error into the response, so admin
/// gate failures land here; the catcher restores the JSON error body and the
/// Basic challenge header.
#[catch(401)]
fn unauthorized() -> Error {
    Error::Unauthorized("Admin credentials required".to_string())
}
