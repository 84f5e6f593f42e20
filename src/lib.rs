#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing, StorageFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;

/// Assemble the server: configuration, database, receipt storage, request
/// logging, and all API routes and catchers.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(StorageFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Get a database client for testing.
#[cfg(test)]
pub async fn db_client() -> mongodb::Client {
    let db_uri = rocket::build()
        .figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to the database")
}

/// Get a fresh database name for testing.
#[cfg(test)]
pub fn database() -> String {
    config::get_database_name()
}

/// Construct a rocket instance against the given test database.
///
/// The database fairing is skipped so each test gets its own database:
/// indexes are created here directly, and tests that need an admin seed one
/// themselves.
#[cfg(test)]
pub async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create indexes");
    rocket::build()
        .attach(ConfigFairing)
        .attach(StorageFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage(client)
        .manage(db)
}
