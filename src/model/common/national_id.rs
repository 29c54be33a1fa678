use std::fmt::{self, Display};
use std::ops::Deref;
use std::str::FromStr;

use mongodb::bson::Bson;
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 15;

/// A national identity document number: the natural key of an associate.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NationalIdError {
    #[error("national ID must have between 4 and 15 digits, got {0}")]
    InvalidLength(usize),
    #[error("national ID must contain only digits, found '{0}'")]
    InvalidChar(char),
}

impl FromStr for NationalId {
    type Err = NationalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(c) = s.chars().find(|c| !c.is_ascii_digit()) {
            return Err(NationalIdError::InvalidChar(c));
        }
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&s.len()) {
            return Err(NationalIdError::InvalidLength(s.len()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for NationalId {
    type Error = NationalIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NationalId> for String {
    fn from(id: NationalId) -> Self {
        id.0
    }
}

impl From<NationalId> for Bson {
    fn from(id: NationalId) -> Self {
        Bson::String(id.0)
    }
}

impl Deref for NationalId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> FromParam<'a> for NationalId {
    type Error = NationalIdError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}
