//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.
//! - Verification code hashes and other internals are never exposed.

pub mod admin;
pub mod associate;
pub mod auth;
pub mod candidate;
pub mod data;
pub mod plancha;
pub mod verification;
pub mod vote;

pub use data::{data, Data};
