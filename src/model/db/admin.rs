use std::ops::{Deref, DerefMut};

use argon2::Config as ArgonConfig;
use mongodb::error::Error as DbError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::mongodb::{Coll, Id};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Hash the password into a new admin. Fails if the username is empty
    /// or the password is shorter than [`MIN_PASSWORD_LENGTH`].
    pub fn new(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() || password.len() < MIN_PASSWORD_LENGTH {
            return None;
        }

        // 16 bytes is recommended for password hashing.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &ArgonConfig::default()).ok()?;
        Some(Self {
            username: username.to_string(),
            password_hash,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Why the bootstrap admin could not be ensured.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(
        "bootstrap admin credentials are unacceptable: the username must not be empty \
         and the password needs at least 8 characters"
    )]
    Credentials,
}

/// Make sure someone can log in to a fresh deployment: if there are no
/// admins at all, create one with the configured credentials.
///
/// The credentials are checked even when admins already exist, so a bad
/// configuration is caught on the first start rather than the first empty
/// database.
pub async fn ensure_admin_exists(
    admins: &Coll<NewAdmin>,
    username: &str,
    password: &str,
) -> Result<(), BootstrapError> {
    let admin = NewAdmin::new(username, password).ok_or(BootstrapError::Credentials)?;
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }
    admins.insert_one(admin, None).await?;
    warn!("No admins found, created bootstrap admin '{username}'");
    Ok(())
}


#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_and_verifies() {
        let admin = NewAdmin::example();
        assert_ne!(admin.password_hash, EXAMPLE_PASSWORD);
        assert!(admin.verify_password(EXAMPLE_PASSWORD));
        assert!(!admin.verify_password("wrong password"));
    }

    #[test]
    fn rejects_weak_credentials() {
        assert!(NewAdmin::new("", "long enough password").is_none());
        assert!(NewAdmin::new("someone", "short").is_none());
    }

    #[rocket::async_test]
    async fn weak_bootstrap_credentials_stop_startup() {
        // Never connects: the credentials are refused first.
        let client = mongodb::Client::with_uri_str("mongodb://localhost:1")
            .await
            .unwrap();
        let admins = Coll::<NewAdmin>::from_db(&client.database("unused"));

        let result = ensure_admin_exists(&admins, "returning-officer", "short").await;
        assert!(matches!(result, Err(BootstrapError::Credentials)));
        let result = ensure_admin_exists(&admins, "", EXAMPLE_PASSWORD).await;
        assert!(matches!(result, Err(BootstrapError::Credentials)));
    }
}
