use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{national_id::NationalId, zone::Zone},
    db::vote::{CandidateVotes, Vote},
};

/// Body of `POST /votes`. The voter is the signed-in associate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_id: String,
}

/// Proof of a recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub voter_id: NationalId,
    pub candidate_id: String,
    pub candidate_name: String,
    pub zone: Zone,
    pub cast_at: DateTime<Utc>,
}

impl From<Vote> for VoteReceipt {
    fn from(vote: Vote) -> Self {
        Self {
            voter_id: vote.vote.voter_id,
            candidate_id: vote.vote.candidate_id.to_string(),
            candidate_name: vote.vote.candidate_name,
            zone: vote.vote.candidate_zone,
            cast_at: vote.vote.cast_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCount {
    pub candidate_id: String,
    pub candidate_name: String,
    pub zone: Zone,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCount {
    pub zone: Zone,
    pub votes: u64,
}

/// Vote counts, per candidate and per zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u64,
    pub by_candidate: Vec<CandidateCount>,
    pub by_zone: Vec<ZoneCount>,
}

impl Tally {
    /// Combine per-candidate counts into a tally. Entries are ordered by
    /// count, highest first, with ties broken by name (candidates) or zone
    /// number (zones).
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = CandidateVotes>,
    {
        let mut zones: BTreeMap<Zone, u64> = BTreeMap::new();
        let mut total = 0;

        let mut by_candidate: Vec<CandidateCount> = counts
            .into_iter()
            .map(|row| {
                total += row.votes;
                *zones.entry(row.candidate_zone).or_default() += row.votes;
                CandidateCount {
                    candidate_id: row.candidate_id.to_string(),
                    candidate_name: row.candidate_name,
                    zone: row.candidate_zone,
                    votes: row.votes,
                }
            })
            .collect();
        by_candidate.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.candidate_name.cmp(&b.candidate_name))
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });

        let mut by_zone: Vec<ZoneCount> = zones
            .into_iter()
            .map(|(zone, votes)| ZoneCount { zone, votes })
            .collect();
        by_zone.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.zone.cmp(&b.zone)));

        Self {
            total,
            by_candidate,
            by_zone,
        }
    }

    pub fn votes_for(&self, candidate_id: &str) -> u64 {
        self.by_candidate
            .iter()
            .find(|c| c.candidate_id == candidate_id)
            .map_or(0, |c| c.votes)
    }
}
