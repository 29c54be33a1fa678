use serde::{Deserialize, Serialize};

use crate::model::db::admin::NewAdmin;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = ();

    /// Convert [`AdminCredentials`] to a new admin by hashing the password.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        NewAdmin::new(&cred.username, &cred.password).ok_or(())
    }
}
