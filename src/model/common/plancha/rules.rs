use std::collections::HashSet;
use std::fmt::{self, Display};

use thiserror::Error;

use super::{Committee, ConsentKind, DocumentKind, MemberRole, SeatRule, Slate};
use crate::model::common::national_id::NationalId;

/// A single reason a slate cannot be saved or submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{committee} slate holds at most {max} people, got {found}")]
    TooMany {
        committee: Committee,
        max: usize,
        found: usize,
    },
    #[error("{committee} slate needs exactly {expected} people, got {found}")]
    WrongSize {
        committee: Committee,
        expected: usize,
        found: usize,
    },
    #[error("{committee} slate needs exactly {expected} {role} seats, got {found}")]
    SeatSplit {
        committee: Committee,
        role: MemberRole,
        expected: usize,
        found: usize,
    },
    #[error("role {role} is not used by the {committee} committee ({national_id})")]
    RoleNotAllowed {
        committee: Committee,
        national_id: NationalId,
        role: MemberRole,
    },
    #[error("the leader must hold a principal seat")]
    LeaderNotPrincipal,
    #[error("position {position} must be {expected}, got {found}")]
    OutOfSequence {
        position: usize,
        expected: MemberRole,
        found: MemberRole,
    },
    #[error("{0} appears more than once on the slate")]
    DuplicateMember(NationalId),
    #[error("{0} has no name")]
    MissingName(NationalId),
    #[error("{national_id} is missing the {kind}")]
    MissingDocument {
        national_id: NationalId,
        kind: DocumentKind,
    },
    #[error("missing {0}")]
    MissingConsent(ConsentKind),
    #[error("{0} is not an active associate")]
    NotAnActiveAssociate(NationalId),
}

/// Every violation found on a slate, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Slate {
    /// Drafts only need to fit on the committee; everything else may still
    /// be missing.
    pub fn check_draft(&self, committee: Committee) -> Result<(), Violation> {
        let max = committee.seats().total();
        if self.len() > max {
            return Err(Violation::TooMany {
                committee,
                max,
                found: self.len(),
            });
        }
        Ok(())
    }

    /// Full validation, run when the leader submits the application.
    pub fn check_submission(&self, committee: Committee) -> Result<(), Violations> {
        let mut violations = Vec::new();
        let seats = committee.seats();

        if self.len() != seats.total() {
            violations.push(Violation::WrongSize {
                committee,
                expected: seats.total(),
                found: self.len(),
            });
        }

        match seats {
            SeatRule::Split {
                principals,
                alternates,
            } => {
                self.check_split(committee, principals, alternates, &mut violations);
                self.check_sequence(&mut violations);
            }
            SeatRule::Flat { .. } => {
                for member in self.roster().filter(|m| m.role != MemberRole::Member) {
                    violations.push(Violation::RoleNotAllowed {
                        committee,
                        national_id: member.national_id.clone(),
                        role: member.role,
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for member in self.roster() {
            if !seen.insert(&member.national_id) {
                violations.push(Violation::DuplicateMember(member.national_id.clone()));
            }
        }

        for member in self.roster() {
            if member.name.trim().is_empty() {
                violations.push(Violation::MissingName(member.national_id.clone()));
            }
            for kind in DocumentKind::ALL {
                if member.documents.get(kind).is_none() {
                    violations.push(Violation::MissingDocument {
                        national_id: member.national_id.clone(),
                        kind,
                    });
                }
            }
        }

        violations.extend(
            self.consents
                .missing()
                .into_iter()
                .map(Violation::MissingConsent),
        );

        Violations(violations).into_result()
    }

    fn check_split(
        &self,
        committee: Committee,
        principals: usize,
        alternates: usize,
        violations: &mut Vec<Violation>,
    ) {
        for (role, expected) in [
            (MemberRole::Principal, principals),
            (MemberRole::Alternate, alternates),
        ] {
            let found = self.roster().filter(|m| m.role == role).count();
            if found != expected {
                violations.push(Violation::SeatSplit {
                    committee,
                    role,
                    expected,
                    found,
                });
            }
        }
        for member in self.roster().filter(|m| m.role == MemberRole::Member) {
            violations.push(Violation::RoleNotAllowed {
                committee,
                national_id: member.national_id.clone(),
                role: member.role,
            });
        }
    }

    /// Split committees list principal, alternate, principal, ... with the
    /// leader in the first principal seat.
    fn check_sequence(&self, violations: &mut Vec<Violation>) {
        if self.leader.role != MemberRole::Principal {
            violations.push(Violation::LeaderNotPrincipal);
        }
        for (position, member) in self.roster().enumerate().skip(1) {
            let expected = if position % 2 == 0 {
                MemberRole::Principal
            } else {
                MemberRole::Alternate
            };
            if member.role != expected {
                violations.push(Violation::OutOfSequence {
                    position: position + 1,
                    expected,
                    found: member.role,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::examples::member;
    use super::super::Consents;
    use super::*;

    #[test]
    fn complete_slates_pass() {
        for committee in Committee::ALL {
            let slate = Slate::example(committee, 1000);
            assert_eq!(slate.len(), committee.seats().total());
            assert_eq!(slate.check_submission(committee), Ok(()));
        }
    }

    #[test]
    fn drafts_may_be_incomplete_but_bounded() {
        let mut slate = Slate::example(Committee::Board, 1000);
        slate.members.truncate(2);
        slate.consents = Consents::default();
        assert_eq!(slate.check_draft(Committee::Board), Ok(()));
        assert!(slate.check_submission(Committee::Board).is_err());

        let full = Slate::example(Committee::Board, 1000);
        assert_eq!(
            full.check_draft(Committee::Oversight),
            Err(Violation::TooMany {
                committee: Committee::Oversight,
                max: 6,
                found: 10
            })
        );
    }

    #[test]
    fn wrong_size_and_split_are_reported() {
        let mut slate = Slate::example(Committee::Oversight, 2000);
        slate.members.pop();
        let violations = slate.check_submission(Committee::Oversight).unwrap_err();
        assert!(violations.0.contains(&Violation::WrongSize {
            committee: Committee::Oversight,
            expected: 6,
            found: 5
        }));
        assert!(violations.0.contains(&Violation::SeatSplit {
            committee: Committee::Oversight,
            role: MemberRole::Alternate,
            expected: 3,
            found: 2
        }));
    }

    #[test]
    fn leader_must_be_principal() {
        let mut slate = Slate::example(Committee::Board, 3000);
        slate.leader.role = MemberRole::Alternate;
        slate.members[0].role = MemberRole::Principal;
        let violations = slate.check_submission(Committee::Board).unwrap_err();
        assert!(violations.0.contains(&Violation::LeaderNotPrincipal));
        assert!(violations.0.contains(&Violation::OutOfSequence {
            position: 2,
            expected: MemberRole::Alternate,
            found: MemberRole::Principal
        }));
        // The split itself is still 5 + 5.
        assert!(!violations
            .0
            .iter()
            .any(|v| matches!(v, Violation::SeatSplit { .. })));
    }

    #[test]
    fn alternation_is_enforced() {
        let mut slate = Slate::example(Committee::Board, 4000);
        // Swap positions 3 and 4: P A A P ...
        slate.members.swap(1, 2);
        let violations = slate.check_submission(Committee::Board).unwrap_err();
        assert_eq!(
            violations.0,
            vec![
                Violation::OutOfSequence {
                    position: 3,
                    expected: MemberRole::Principal,
                    found: MemberRole::Alternate
                },
                Violation::OutOfSequence {
                    position: 4,
                    expected: MemberRole::Alternate,
                    found: MemberRole::Principal
                },
            ]
        );
    }

    #[test]
    fn appeals_only_takes_members() {
        let mut slate = Slate::example(Committee::Appeals, 5000);
        slate.members[1].role = MemberRole::Principal;
        let violations = slate.check_submission(Committee::Appeals).unwrap_err();
        assert_eq!(
            violations.0,
            vec![Violation::RoleNotAllowed {
                committee: Committee::Appeals,
                national_id: "5002".parse().unwrap(),
                role: MemberRole::Principal
            }]
        );
    }

    #[test]
    fn member_role_not_allowed_in_split_committees() {
        let mut slate = Slate::example(Committee::Oversight, 6000);
        slate.members[4].role = MemberRole::Member;
        let violations = slate.check_submission(Committee::Oversight).unwrap_err();
        assert!(violations.0.contains(&Violation::RoleNotAllowed {
            committee: Committee::Oversight,
            national_id: "6005".parse().unwrap(),
            role: MemberRole::Member
        }));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut slate = Slate::example(Committee::Appeals, 7000);
        slate.members[1] = member("7000", MemberRole::Member);
        let violations = slate.check_submission(Committee::Appeals).unwrap_err();
        assert_eq!(
            violations.0,
            vec![Violation::DuplicateMember("7000".parse().unwrap())]
        );
    }

    #[test]
    fn documents_and_names_are_required() {
        let mut slate = Slate::example(Committee::Appeals, 8000);
        slate.members[0].documents.resume = None;
        slate.members[1].documents.identity_copy = Some("   ".to_string());
        slate.leader.name = String::new();
        let violations = slate.check_submission(Committee::Appeals).unwrap_err();
        assert_eq!(
            violations.0,
            vec![
                Violation::MissingName("8000".parse().unwrap()),
                Violation::MissingDocument {
                    national_id: "8001".parse().unwrap(),
                    kind: DocumentKind::Resume
                },
                Violation::MissingDocument {
                    national_id: "8002".parse().unwrap(),
                    kind: DocumentKind::IdentityCopy
                },
            ]
        );
    }

    #[test]
    fn all_consents_are_required() {
        let mut slate = Slate::example(Committee::Board, 9000);
        slate.consents.accepts_data_processing = false;
        let violations = slate.check_submission(Committee::Board).unwrap_err();
        assert_eq!(
            violations.0,
            vec![Violation::MissingConsent(ConsentKind::DataProcessing)]
        );
        assert_eq!(
            violations.to_string(),
            "missing consent to data processing"
        );
    }
}
