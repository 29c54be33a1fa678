use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    common::{national_id::NationalId, phone::Phone, zone::Zone},
    db::associate::{Associate, NewAssociate},
};

/// An admin's request to register a new associate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociateSpec {
    pub national_id: NationalId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<Phone>,
    pub zone: Zone,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl TryFrom<AssociateSpec> for NewAssociate {
    type Error = Error;

    fn try_from(spec: AssociateSpec) -> Result<Self, Self::Error> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(Error::bad_request("Associate name must not be empty"));
        }
        let email = spec.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        if let Some(ref email) = email {
            if !looks_like_email(email) {
                return Err(Error::bad_request(format!("Invalid email address '{email}'")));
            }
        }
        Ok(Self {
            national_id: spec.national_id,
            name: name.to_string(),
            email,
            phone: spec.phone,
            zone: spec.zone,
            active: spec.active,
            pending_code: None,
            created_at: Utc::now(),
        })
    }
}

/// Minimal shape check: something before and after a single `@`, and a dot
/// in the domain. Deliverability is the mail channel's problem.
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Body of `PUT /associates/<national_id>/active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveUpdate {
    pub active: bool,
}

/// Public answer to "can this person take part?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateStatus {
    pub national_id: NationalId,
    pub name: String,
    pub zone: Zone,
    pub active: bool,
    pub has_voted: bool,
    pub is_candidate: bool,
}

/// Full associate record for admins and for the associate themself.
/// Contact details are included, the pending code never is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateDescription {
    pub id: String,
    pub national_id: NationalId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<Phone>,
    pub zone: Zone,
    pub active: bool,
}

impl From<Associate> for AssociateDescription {
    fn from(associate: Associate) -> Self {
        Self {
            id: associate.id.to_string(),
            national_id: associate.associate.national_id,
            name: associate.associate.name,
            email: associate.associate.email,
            phone: associate.associate.phone,
            zone: associate.associate.zone,
            active: associate.associate.active,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AssociateSpec {
        pub fn example() -> Self {
            Self {
                national_id: "123456".parse().unwrap(),
                name: "Ana Torres".to_string(),
                email: Some("ana@example.org".to_string()),
                phone: Some(Phone::example()),
                zone: Zone::One,
                active: true,
            }
        }
    }
}
