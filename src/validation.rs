//! Roster consistency checks.
//!
//! The engine assumes a consistent roster; these checks are what the
//! submission form runs before calling it.  All problems are reported
//! at once so the form can highlight every offending entry.

use crate::models::{AuthorPosition, Roster};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("more than one author holds the first author role")]
    DuplicateFirstAuthor,
    #[error("more than one author holds the corresponding author role")]
    DuplicateCorrespondingAuthor,
    #[error("author position {0} is assigned more than once")]
    DuplicatePosition(u8),
    #[error("paper position {0} is assigned more than once")]
    DuplicatePaperPosition(u32),
    #[error("paper positions start at 1")]
    InvalidPaperPosition,
    #[error("declared {field} is {declared} but the roster has {actual}")]
    CountMismatch {
        field: &'static str,
        declared: u32,
        actual: u32,
    },
}

/// Returns every rule the roster breaks; an empty list means valid.
pub fn validate_roster(roster: &Roster) -> Vec<RosterError> {
    let mut errors = Vec::new();

    if roster.authors().filter(|author| author.role.is_first()).count() > 1 {
        errors.push(RosterError::DuplicateFirstAuthor);
    }
    if roster
        .authors()
        .filter(|author| author.role.is_corresponding())
        .count()
        > 1
    {
        errors.push(RosterError::DuplicateCorrespondingAuthor);
    }

    let mut positions = HashSet::new();
    for rank in roster
        .authors()
        .filter_map(|author| author.position.and_then(AuthorPosition::rank))
    {
        if !positions.insert(rank) {
            errors.push(RosterError::DuplicatePosition(rank));
        }
    }

    let mut paper_positions = HashSet::new();
    for author in roster.authors() {
        if author.paper_position == 0 {
            errors.push(RosterError::InvalidPaperPosition);
        } else if !paper_positions.insert(author.paper_position) {
            errors.push(RosterError::DuplicatePaperPosition(author.paper_position));
        }
    }

    if let Some(counts) = roster.counts {
        let internal = roster.authors().filter(|author| author.is_internal()).count() as u32;
        let internal_co_authors = roster
            .co_authors
            .iter()
            .filter(|author| author.is_internal())
            .count() as u32;
        let checks = [
            ("total_authors", counts.total_authors, roster.len() as u32),
            ("internal_authors", counts.internal_authors, internal),
            (
                "internal_co_authors",
                counts.internal_co_authors,
                internal_co_authors,
            ),
        ];
        for (field, declared, actual) in checks {
            if declared != actual {
                errors.push(RosterError::CountMismatch {
                    field,
                    declared,
                    actual,
                });
            }
        }
    }

    errors
}

impl Roster {
    /// Fails with the first broken rule.
    pub fn validate(&self) -> Result<(), RosterError> {
        match validate_roster(self).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, AuthorRole, ExternalSubType, InternalSubType, RosterCounts};

    fn faculty(uid: &str, role: AuthorRole, paper_position: u32) -> Author {
        Author::internal(uid, InternalSubType::Faculty, role, paper_position)
    }

    #[test]
    fn consistent_roster_passes() {
        let mut roster = Roster::new(
            faculty("me", AuthorRole::First, 1),
            vec![
                faculty("you", AuthorRole::Corresponding, 2),
                Author::external("guest", ExternalSubType::Industry, AuthorRole::CoAuthor, 3),
            ],
        );
        roster.counts = Some(RosterCounts {
            total_authors: 3,
            internal_authors: 2,
            internal_co_authors: 1,
        });
        assert_eq!(roster.validate(), Ok(()));
    }

    #[test]
    fn combined_role_conflicts_with_first_and_corresponding() {
        let roster = Roster::new(
            faculty("me", AuthorRole::FirstAndCorresponding, 1),
            vec![
                faculty("a", AuthorRole::First, 2),
                Author::external("b", ExternalSubType::Academic, AuthorRole::Corresponding, 3),
            ],
        );
        let errors = validate_roster(&roster);
        assert!(errors.contains(&RosterError::DuplicateFirstAuthor));
        assert!(errors.contains(&RosterError::DuplicateCorrespondingAuthor));
    }

    #[test]
    fn detects_position_collisions() {
        let roster = Roster::new(
            faculty("me", AuthorRole::First, 1).at_position(AuthorPosition::Rank(2)),
            vec![
                faculty("a", AuthorRole::CoAuthor, 1).at_position(AuthorPosition::Rank(2)),
                faculty("b", AuthorRole::CoAuthor, 0).at_position(AuthorPosition::SixPlus),
                faculty("c", AuthorRole::CoAuthor, 7).at_position(AuthorPosition::SixPlus),
            ],
        );
        let errors = validate_roster(&roster);
        assert_eq!(
            errors,
            vec![
                RosterError::DuplicatePosition(2),
                RosterError::DuplicatePaperPosition(1),
                RosterError::InvalidPaperPosition,
            ]
        );
    }

    #[test]
    fn reports_count_mismatches() {
        let mut roster = Roster::new(faculty("me", AuthorRole::First, 1), Vec::new());
        roster.counts = Some(RosterCounts {
            total_authors: 2,
            internal_authors: 1,
            internal_co_authors: 1,
        });
        let errors = validate_roster(&roster);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "declared total_authors is 2 but the roster has 1"
        );
    }
}
