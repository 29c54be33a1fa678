use std::fmt::Display;

use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{common::plancha::Violations, mongodb::is_duplicate_key};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("{1}")]
    Status(Status, String),
    /// A plancha failed validation; every violation is reported.
    #[error("Plancha is not valid: {0}")]
    Plancha(Violations),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Status(Status::Forbidden, message.into())
    }

    /// `what` names the missing thing, e.g. "Associate with national ID '123'".
    pub fn not_found(what: impl Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Status(Status::InternalServerError, message.into())
    }

    /// A write rejected by a unique index becomes `conflict`; any other
    /// database failure is kept as is.
    pub fn or_conflict(err: DbError, conflict: impl FnOnce() -> Self) -> Self {
        if is_duplicate_key(&err) {
            conflict()
        } else {
            Self::Db(err)
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) => Status::InternalServerError,
            Self::Status(status, _) => *status,
            Self::Plancha(_) => Status::BadRequest,
        }
    }
}

/// JSON body of every failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            violations: Vec::new(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let id = RequestId::of(req);
        let status = self.status();
        let body = if status.class() == StatusClass::ServerError {
            error!("req{id} failed: {self}");
            // Storage details stay in the log.
            match self {
                Self::Status(_, message) => ErrorBody::new(message),
                _ => ErrorBody::new("Internal server error"),
            }
        } else {
            warn!("req{id} rejected: {self}");
            match self {
                Self::Plancha(ref violations) => ErrorBody {
                    error: self.to_string(),
                    violations: violations.0.iter().map(ToString::to_string).collect(),
                },
                _ => ErrorBody::new(self.to_string()),
            }
        };
        (status, Json(body)).respond_to(req)
    }
}
