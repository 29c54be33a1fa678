use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson, DateTime as BsonDateTime,
    Document,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    common::{code::Code, national_id::NationalId, phone::Phone, zone::Zone},
    mongodb::Id,
};

/// Core associate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateCore {
    /// Unique natural key.
    pub national_id: NationalId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<Phone>,
    pub zone: Zone,
    /// Inactive associates can neither verify, vote nor be nominated.
    pub active: bool,
    /// The outstanding verification code, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_code: Option<PendingCode>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AssociateCore {
    /// Check a submitted code against the outstanding one.
    pub fn check_code(
        &self,
        code: &Code,
        secret: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), CodeRejection> {
        self.pending_code
            .as_ref()
            .ok_or(CodeRejection::NotFound)?
            .check(code, secret, now)
    }
}

/// An associate without an ID.
pub type NewAssociate = AssociateCore;

/// An associate from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Associate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub associate: AssociateCore,
}

impl Deref for Associate {
    type Target = AssociateCore;

    fn deref(&self) -> &Self::Target {
        &self.associate
    }
}

impl DerefMut for Associate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.associate
    }
}

/// A verification code awaiting use. Only the HMAC of the code is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCode {
    pub code_hmac: Vec<u8>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl PendingCode {
    pub fn new(code: &Code, secret: &[u8], expires_at: DateTime<Utc>) -> Self {
        Self {
            code_hmac: code.hmac(secret),
            expires_at,
        }
    }

    /// Query fragment matching a stored code equal to `code` that has not
    /// expired at `now`.
    pub fn filter(code: &Code, secret: &[u8], now: DateTime<Utc>) -> Document {
        doc! {
            "pending_code.code_hmac": to_bson(&code.hmac(secret)).expect("HMAC serialisation does not fail"),
            "pending_code.expires_at": { "$gte": BsonDateTime::from_chrono(now) },
        }
    }

    /// Expiry is checked first: an expired code is rejected even if correct.
    pub fn check(&self, code: &Code, secret: &[u8], now: DateTime<Utc>) -> Result<(), CodeRejection> {
        if now > self.expires_at {
            return Err(CodeRejection::Expired);
        }
        if !code.matches(secret, &self.code_hmac) {
            return Err(CodeRejection::Mismatch);
        }
        Ok(())
    }
}

impl From<&PendingCode> for Bson {
    fn from(pending: &PendingCode) -> Self {
        to_bson(pending).expect("Serialisation is infallible")
    }
}

/// Why a submitted verification code was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodeRejection {
    #[error("no verification code is pending for this associate")]
    NotFound,
    #[error("verification code has expired")]
    Expired,
    #[error("verification code is incorrect")]
    Mismatch,
}
