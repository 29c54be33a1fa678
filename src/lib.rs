#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use mongodb::{error::Error as DbError, Client};
use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing, NotifierFairing};
use crate::logging::LoggerFairing;
use crate::model::mongodb::ensure_indexes_exist;
use crate::notify::Notifier;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;

#[cfg(test)]
mod testing;

pub use config::Config;

/// Build the production server: every dependency is loaded from the Rocket
/// figment by a fairing at ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(NotifierFairing)
        .attach(LoggerFairing)
}

/// Build a server around an existing database connection and notifier,
/// skipping the database and notifier fairings.
pub async fn rocket_for_db_and_notifier(
    db_client: Client,
    db_name: &str,
    notifier: Notifier,
) -> Result<Rocket<Build>, DbError> {
    let db = db_client.database(db_name);
    ensure_indexes_exist(&db).await?;

    Ok(rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(db_client)
        .manage(db)
        .manage(notifier))
}
