use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{national_id::NationalId, zone::Zone},
    db::associate::Associate,
    mongodb::Id,
};

/// Self-description shown to voters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub proposal: String,
    #[serde(default)]
    pub experience: String,
}

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Foreign key into the associates; unique.
    pub associate_id: Id,
    pub national_id: NationalId,
    pub name: String,
    /// Copied from the associate at nomination time.
    pub zone: Zone,
    pub profile: CandidateProfile,
    /// Reference to an already-hosted portrait.
    pub image: Option<String>,
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CandidateCore {
    /// Nominate the given associate.
    pub fn nominate(associate: &Associate, profile: CandidateProfile, image: Option<String>) -> Self {
        Self {
            associate_id: associate.id,
            national_id: associate.national_id.clone(),
            name: associate.name.clone(),
            zone: associate.zone,
            profile,
            image,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
