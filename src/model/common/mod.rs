//! Types shared between the DB and API representations.

pub mod code;
pub mod national_id;
pub mod phone;
pub mod plancha;
pub mod zone;
