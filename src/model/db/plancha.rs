use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::plancha::{Committee, PlanchaStatus, Slate},
    mongodb::Id,
};

/// Core plancha application data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanchaCore {
    pub committee: Committee,
    /// The associate who owns the application; unique per committee.
    pub leader_id: Id,
    #[serde(flatten)]
    pub slate: Slate,
    pub status: PlanchaStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl PlanchaCore {
    /// Start a new draft.
    pub fn draft(committee: Committee, leader_id: Id, slate: Slate) -> Self {
        let now = Utc::now();
        Self {
            committee,
            leader_id,
            slate,
            status: PlanchaStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A plancha application without an ID.
pub type NewPlancha = PlanchaCore;

/// A plancha application from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plancha {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub plancha: PlanchaCore,
}

impl Deref for Plancha {
    type Target = PlanchaCore;

    fn deref(&self) -> &Self::Target {
        &self.plancha
    }
}

impl DerefMut for Plancha {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.plancha
    }
}
