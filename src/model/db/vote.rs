use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    common::{national_id::NationalId, zone::Zone},
    db::{associate::Associate, candidate::Candidate},
    mongodb::Id,
};

/// Core vote data, as stored in the database. Votes are never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// Unique: one vote per voter.
    pub voter_id: NationalId,
    pub voter_zone: Zone,
    pub candidate_id: Id,
    /// Snapshot of the candidate at voting time.
    pub candidate_name: String,
    pub candidate_zone: Zone,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("voters in {voter_zone} cannot vote for candidates in {candidate_zone}")]
pub struct ZoneMismatch {
    pub voter_zone: Zone,
    pub candidate_zone: Zone,
}

impl VoteCore {
    /// Create a vote, which is only possible within a single zone.
    pub fn cast(voter: &Associate, candidate: &Candidate) -> Result<Self, ZoneMismatch> {
        if voter.zone != candidate.zone {
            return Err(ZoneMismatch {
                voter_zone: voter.zone,
                candidate_zone: candidate.zone,
            });
        }
        Ok(Self {
            voter_id: voter.national_id.clone(),
            voter_zone: voter.zone,
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
            candidate_zone: candidate.zone,
            cast_at: Utc::now(),
        })
    }
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

/// The votes for one candidate, as grouped by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVotes {
    #[serde(rename = "_id")]
    pub candidate_id: Id,
    pub candidate_name: String,
    pub candidate_zone: Zone,
    pub votes: u64,
}

impl CandidateVotes {
    /// Aggregation pipeline counting the votes matched by `filter`, one
    /// output document per candidate.
    pub fn pipeline(filter: Document) -> Vec<Document> {
        vec![
            doc! { "$match": filter },
            doc! {
                "$group": {
                    "_id": "$candidate_id",
                    "candidate_name": { "$first": "$candidate_name" },
                    "candidate_zone": { "$first": "$candidate_zone" },
                    "votes": { "$sum": 1 },
                }
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::{
        associate::NewAssociate,
        candidate::{CandidateProfile, NewCandidate},
    };

    fn candidate_in(zone: Zone) -> Candidate {
        let associate = Associate {
            id: Id::new(),
            associate: NewAssociate::example_in("999999", zone),
        };
        Candidate {
            id: Id::new(),
            candidate: NewCandidate::nominate(&associate, CandidateProfile::example(), None),
        }
    }

    #[test]
    fn same_zone_vote_snapshots_candidate() {
        let voter = Associate {
            id: Id::new(),
            associate: NewAssociate::example(),
        };
        let candidate = candidate_in(Zone::One);
        let vote = NewVote::cast(&voter, &candidate).unwrap();
        assert_eq!(&*vote.voter_id, "123456");
        assert_eq!(vote.candidate_id, candidate.id);
        assert_eq!(vote.candidate_name, "Associate 999999");
        assert_eq!(vote.voter_zone, vote.candidate_zone);
    }

    #[test]
    fn cross_zone_vote_is_refused() {
        let voter = Associate {
            id: Id::new(),
            associate: NewAssociate::example_in("123456", Zone::Two),
        };
        let candidate = candidate_in(Zone::Five);
        assert_eq!(
            NewVote::cast(&voter, &candidate),
            Err(ZoneMismatch {
                voter_zone: Zone::Two,
                candidate_zone: Zone::Five
            })
        );
    }

    #[test]
    fn pipeline_filters_before_grouping() {
        let pipeline = CandidateVotes::pipeline(doc! { "candidate_zone": Zone::Four });
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0],
            doc! { "$match": { "candidate_zone": "Zone 4" } }
        );
        assert_eq!(
            pipeline[1].get_document("$group").unwrap().get_str("_id"),
            Ok("$candidate_id")
        );
    }

    #[test]
    fn grouped_rows_deserialise() {
        let id = Id::new();
        let row: CandidateVotes = mongodb::bson::from_document(doc! {
            "_id": id,
            "candidate_name": "Uno",
            "candidate_zone": "Zone 1",
            "votes": 3_i32,
        })
        .unwrap();
        assert_eq!(row.candidate_id, id);
        assert_eq!(row.candidate_zone, Zone::One);
        assert_eq!(row.votes, 3);
    }
}
