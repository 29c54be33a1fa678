//! Plancha (slate) applications: a leader plus members running together
//! for one committee.

use std::fmt::{self, Display};

use mongodb::bson::{to_bson, Bson};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::national_id::NationalId;

mod rules;
pub use rules::{Violation, Violations};

/// The committees a plancha can run for.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Committee {
    /// Board of directors.
    Board,
    /// Oversight committee.
    Oversight,
    /// Appeals committee.
    Appeals,
}

/// How the seats of a committee are distributed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeatRule {
    /// Fixed numbers of principal and alternate seats.
    Split { principals: usize, alternates: usize },
    /// Undifferentiated seats.
    Flat { members: usize },
}

impl SeatRule {
    /// Total number of people on a complete slate, leader included.
    pub fn total(self) -> usize {
        match self {
            SeatRule::Split {
                principals,
                alternates,
            } => principals + alternates,
            SeatRule::Flat { members } => members,
        }
    }
}

impl Committee {
    pub const ALL: [Committee; 3] = [Committee::Board, Committee::Oversight, Committee::Appeals];

    pub fn seats(self) -> SeatRule {
        match self {
            Committee::Board => SeatRule::Split {
                principals: 5,
                alternates: 5,
            },
            Committee::Oversight => SeatRule::Split {
                principals: 3,
                alternates: 3,
            },
            Committee::Appeals => SeatRule::Flat { members: 3 },
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Committee::Board => "board",
            Committee::Oversight => "oversight",
            Committee::Appeals => "appeals",
        }
    }
}

impl Display for Committee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown committee '{0}', expected one of board, oversight, appeals")]
pub struct CommitteeParseError(String);

impl std::str::FromStr for Committee {
    type Err = CommitteeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Committee::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CommitteeParseError(s.to_string()))
    }
}

impl<'a> FromParam<'a> for Committee {
    type Error = CommitteeParseError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

impl From<Committee> for Bson {
    fn from(committee: Committee) -> Self {
        to_bson(&committee).expect("Serialisation is infallible")
    }
}

/// Seat designation of one person on a slate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Principal,
    /// "Suplente": stands in for a principal.
    Alternate,
    /// Seat in a committee without the principal/alternate distinction.
    Member,
}

impl Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberRole::Principal => "principal",
            MemberRole::Alternate => "alternate",
            MemberRole::Member => "member",
        })
    }
}

/// Documents every person on a slate must attach.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IdentityCopy,
    Resume,
    AcceptanceLetter,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::IdentityCopy,
        DocumentKind::Resume,
        DocumentKind::AcceptanceLetter,
    ];
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::IdentityCopy => "identity copy",
            DocumentKind::Resume => "resume",
            DocumentKind::AcceptanceLetter => "acceptance letter",
        })
    }
}

/// References to already-hosted files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documents {
    #[serde(default)]
    pub identity_copy: Option<String>,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub acceptance_letter: Option<String>,
}

impl Documents {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        let reference = match kind {
            DocumentKind::IdentityCopy => &self.identity_copy,
            DocumentKind::Resume => &self.resume,
            DocumentKind::AcceptanceLetter => &self.acceptance_letter,
        };
        reference.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// One person on a slate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanchaMember {
    pub national_id: NationalId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: MemberRole,
    #[serde(default)]
    pub documents: Documents,
}

/// The three declarations the leader must accept before submitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consents {
    #[serde(default)]
    pub accepts_statute: bool,
    #[serde(default)]
    pub accepts_data_processing: bool,
    #[serde(default)]
    pub declares_truthful: bool,
}

/// Identifies one of the [`Consents`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConsentKind {
    Statute,
    DataProcessing,
    Truthfulness,
}

impl Display for ConsentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsentKind::Statute => "acceptance of the statute",
            ConsentKind::DataProcessing => "consent to data processing",
            ConsentKind::Truthfulness => "declaration of truthfulness",
        })
    }
}

impl Consents {
    /// The declarations not yet accepted.
    pub fn missing(&self) -> Vec<ConsentKind> {
        [
            (self.accepts_statute, ConsentKind::Statute),
            (self.accepts_data_processing, ConsentKind::DataProcessing),
            (self.declares_truthful, ConsentKind::Truthfulness),
        ]
        .into_iter()
        .filter_map(|(given, kind)| (!given).then_some(kind))
        .collect()
    }
}

/// Application lifecycle. Validation only applies on the transition to
/// `Submitted`; drafts may be incomplete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanchaStatus {
    Draft,
    Submitted,
}

impl From<PlanchaStatus> for Bson {
    fn from(status: PlanchaStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// The people on an application and the leader's declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slate {
    pub leader: PlanchaMember,
    #[serde(default)]
    pub members: Vec<PlanchaMember>,
    #[serde(default)]
    pub consents: Consents,
}

impl Slate {
    /// Everyone on the slate, leader first.
    pub fn roster(&self) -> impl Iterator<Item = &PlanchaMember> {
        std::iter::once(&self.leader).chain(self.members.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.members.len()
    }
}
