use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            admin::AdminCredentials,
            auth::{verify_credentials, AdminAuth, AuthStatus},
        },
        db::admin::Admin,
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![check, authenticate]
}

/// Check the Basic credentials carried by the request. The admin UI calls
/// this on load to decide whether its stored credentials are still valid.
#[get("/auth/admin")]
async fn check(_auth: AdminAuth) -> Json<AuthStatus> {
    Json(AuthStatus::ok())
}

/// Check credentials from a JSON body instead of a header. Used by the admin
/// UI login form before it starts attaching the header itself.
#[post("/auth/admin", data = "<credentials>", format = "json")]
async fn authenticate(
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
) -> Result<Json<AuthStatus>> {
    verify_credentials(&admins, &credentials.username, &credentials.password).await?;
    Ok(Json(AuthStatus::ok()))
}
