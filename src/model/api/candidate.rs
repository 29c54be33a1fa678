use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    common::{national_id::NationalId, zone::Zone},
    db::candidate::{Candidate, CandidateProfile},
};

/// Body of `POST /candidates`. The nominee is the signed-in associate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidacyRequest {
    pub proposal: String,
    #[serde(default)]
    pub experience: String,
    /// Reference to an already-hosted portrait.
    #[serde(default)]
    pub image: Option<String>,
}

impl CandidacyRequest {
    /// Split into a trimmed profile and image reference.
    pub fn into_parts(self) -> Result<(CandidateProfile, Option<String>), Error> {
        let proposal = self.proposal.trim();
        if proposal.is_empty() {
            return Err(Error::bad_request("Proposal must not be empty"));
        }
        let profile = CandidateProfile {
            proposal: proposal.to_string(),
            experience: self.experience.trim().to_string(),
        };
        let image = self.image.filter(|i| !i.trim().is_empty());
        Ok((profile, image))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: String,
    pub national_id: NationalId,
    pub name: String,
    pub zone: Zone,
    pub proposal: String,
    pub experience: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        let core = candidate.candidate;
        Self {
            id: candidate.id.to_string(),
            national_id: core.national_id,
            name: core.name,
            zone: core.zone,
            proposal: core.profile.proposal,
            experience: core.profile.experience,
            image: core.image,
            created_at: core.created_at,
        }
    }
}
