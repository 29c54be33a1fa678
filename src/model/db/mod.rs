//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//!
//! Each record comes in two flavours: `NewX`, without an ID, ready for
//! insertion, and `X`, read back from the database with its `_id`.

pub mod admin;
pub mod associate;
pub mod candidate;
pub mod plancha;
pub mod vote;
