//! Apportionment of an incentive pool across a roster.
//!
//! Research papers choose between two mutually exclusive strategies,
//! role-based and position-based distribution.  Both produce one
//! [`AuthorShare`] per author in roster order; the engine applies the
//! shares to the pool.  Percentages are deliberately not normalised:
//! shares that belong to external or ineligible primary authors, and
//! the unused part of the co-author pool, are forfeited.

use crate::models::{Author, AuthorPosition, AuthorRole};
use crate::policy::{PositionPercentage, ResearchPaperPolicy, RolePercentage};
use tracing::warn;

/// Highest paper position that still qualifies for an incentive.
pub const MAX_ELIGIBLE_PAPER_POSITION: u32 = 5;

/// A percentage of the pool expressed as `numerator / denominator`
/// percent, so that `20 / 3` percent stays exact until the final floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    numerator: u64,
    denominator: u64,
}

impl Share {
    pub const ZERO: Share = Share {
        numerator: 0,
        denominator: 1,
    };
    pub const FULL: Share = Share {
        numerator: 100,
        denominator: 1,
    };

    pub fn percent(percent: u64) -> Self {
        Self {
            numerator: percent,
            denominator: 1,
        }
    }

    /// `percent` divided evenly between `ways` recipients.  Zero ways is
    /// treated as one.
    pub fn split(percent: u64, ways: usize) -> Self {
        Self {
            numerator: percent,
            denominator: ways.max(1) as u64,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// `floor(amount * share / 100)`.
    pub fn apply(&self, amount: u64) -> u64 {
        let scaled = u128::from(amount) * u128::from(self.numerator);
        let divisor = 100 * u128::from(self.denominator);
        u64::try_from(scaled / divisor).unwrap_or(u64::MAX)
    }
}

/// Incentive and points shares for one author.  They only differ for
/// role-based co-authors, whose points are divided among non-student
/// co-authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorShare {
    pub incentive: Share,
    pub points: Share,
}

impl AuthorShare {
    pub const ZERO: AuthorShare = AuthorShare {
        incentive: Share::ZERO,
        points: Share::ZERO,
    };

    pub fn uniform(share: Share) -> Self {
        Self {
            incentive: share,
            points: share,
        }
    }
}

/// Strategy used to apportion a research paper pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionStrategy {
    RoleBased,
    PositionBased,
}

/// Picks the strategy configured on the policy.  Missing or unknown
/// methods fall back to role-based distribution.
pub fn resolve_strategy(policy: &ResearchPaperPolicy) -> DistributionStrategy {
    let method = policy
        .distribution_method
        .as_deref()
        .map(|method| method.trim().to_ascii_lowercase().replace('-', "_"));
    match method.as_deref() {
        Some("position_based") | Some("position") => DistributionStrategy::PositionBased,
        _ => DistributionStrategy::RoleBased,
    }
}

/// Percentages used by role-based distribution once more than one
/// author is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleShareTable {
    pub first_and_corresponding: u64,
    pub first: u64,
    pub corresponding: u64,
    pub co_author_pool: u64,
}

impl Default for RoleShareTable {
    fn default() -> Self {
        Self {
            first_and_corresponding: 80,
            first: 40,
            corresponding: 40,
            co_author_pool: 20,
        }
    }
}

impl RoleShareTable {
    /// Applies policy overrides on top of the defaults.  A table that
    /// could hand out more than the whole pool is rejected.
    pub fn from_policy(percentages: &[RolePercentage]) -> Self {
        let mut table = Self::default();
        for entry in percentages {
            match entry.role {
                AuthorRole::FirstAndCorresponding => table.first_and_corresponding = entry.percentage,
                AuthorRole::First => table.first = entry.percentage,
                AuthorRole::Corresponding => table.corresponding = entry.percentage,
                AuthorRole::CoAuthor => table.co_author_pool = entry.percentage,
            }
        }
        // An overflowing sum is treated like any other total above 100
        let combined_total = table
            .first_and_corresponding
            .checked_add(table.co_author_pool);
        let split_total = table
            .first
            .checked_add(table.corresponding)
            .and_then(|total| total.checked_add(table.co_author_pool));
        match (combined_total, split_total) {
            (Some(combined), Some(split)) if combined <= 100 && split <= 100 => table,
            _ => {
                warn!(
                    ?combined_total,
                    ?split_total,
                    "role percentages exceed 100, using defaults"
                );
                Self::default()
            }
        }
    }

    fn primary(&self, role: AuthorRole) -> u64 {
        match role {
            AuthorRole::First => self.first,
            AuthorRole::Corresponding => self.corresponding,
            AuthorRole::FirstAndCorresponding => self.first_and_corresponding,
            AuthorRole::CoAuthor => 0,
        }
    }
}

/// Per-position percentages used by position-based distribution when
/// neither primary-role rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTable {
    percentages: [u64; 5],
}

impl Default for PositionTable {
    fn default() -> Self {
        Self {
            percentages: [40, 20, 15, 15, 10],
        }
    }
}

impl PositionTable {
    pub fn from_policy(entries: &[PositionPercentage]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let mut percentages = [0; 5];
        for entry in entries {
            if let Some(slot) = (entry.position as usize)
                .checked_sub(1)
                .and_then(|index| percentages.get_mut(index))
            {
                *slot = entry.percentage;
            }
        }
        let total = percentages
            .iter()
            .try_fold(0u64, |total, percent| total.checked_add(*percent));
        match total {
            Some(total) if total <= 100 => Self { percentages },
            _ => {
                warn!(?total, "position percentages exceed 100, using defaults");
                Self::default()
            }
        }
    }

    pub fn percent_for(&self, rank: u8) -> u64 {
        (rank as usize)
            .checked_sub(1)
            .and_then(|index| self.percentages.get(index))
            .copied()
            .unwrap_or(0)
    }
}

/// Indices of internal authors whose paper position is within the first
/// five.  External authors still occupy a position slot.
pub fn eligible_authors(authors: &[&Author]) -> Vec<usize> {
    authors
        .iter()
        .enumerate()
        .filter(|(_, author)| {
            author.is_internal()
                && (1..=MAX_ELIGIBLE_PAPER_POSITION).contains(&author.paper_position)
        })
        .map(|(index, _)| index)
        .collect()
}

/// Role-based shares for every author in `authors`.
pub fn role_based_shares(authors: &[&Author], table: &RoleShareTable) -> Vec<AuthorShare> {
    let mut shares = vec![AuthorShare::ZERO; authors.len()];
    let eligible = eligible_authors(authors);
    let role_of = |index: usize| authors[index].role;

    match eligible.as_slice() {
        [] => return shares,
        [only] => {
            shares[*only] = AuthorShare::uniform(Share::FULL);
            return shares;
        }
        _ => {}
    }

    let combined = eligible
        .iter()
        .copied()
        .find(|&index| role_of(index) == AuthorRole::FirstAndCorresponding);
    let has_first = eligible.iter().any(|&index| role_of(index) == AuthorRole::First);
    let has_corresponding = eligible
        .iter()
        .any(|&index| role_of(index) == AuthorRole::Corresponding);
    let distinct_primaries = has_first && has_corresponding;

    if eligible.len() == 2 && !distinct_primaries {
        // Primary roles held by external or ineligible authors still count here
        let roster_has_both = authors.iter().any(|author| author.role.is_first())
            && authors.iter().any(|author| author.role.is_corresponding());
        for &index in &eligible {
            let percent = if combined.is_some() || roster_has_both {
                50
            } else if role_of(index) == AuthorRole::First {
                60
            } else {
                40
            };
            shares[index] = AuthorShare::uniform(Share::percent(percent));
        }
        return shares;
    }

    let (primaries, co_authors): (Vec<usize>, Vec<usize>) = match combined {
        Some(holder) => (
            vec![holder],
            eligible.iter().copied().filter(|&index| index != holder).collect(),
        ),
        None => eligible
            .iter()
            .copied()
            .partition(|&index| role_of(index) != AuthorRole::CoAuthor),
    };

    for &index in &primaries {
        let role = if combined == Some(index) {
            AuthorRole::FirstAndCorresponding
        } else {
            role_of(index)
        };
        shares[index] = AuthorShare::uniform(Share::percent(table.primary(role)));
    }

    let non_students = co_authors
        .iter()
        .filter(|&&index| !authors[index].is_student())
        .count();
    for &index in &co_authors {
        let points = if authors[index].is_student() {
            Share::ZERO
        } else {
            Share::split(table.co_author_pool, non_students)
        };
        shares[index] = AuthorShare {
            incentive: Share::split(table.co_author_pool, co_authors.len()),
            points,
        };
    }

    shares
}

/// Position-based shares for every author in `authors`.
pub fn position_based_shares(authors: &[&Author], table: &PositionTable) -> Vec<AuthorShare> {
    let mut shares = vec![AuthorShare::ZERO; authors.len()];
    let mut holders: Vec<(usize, u8)> = authors
        .iter()
        .enumerate()
        .filter(|(_, author)| author.is_internal())
        .filter_map(|(index, author)| match author.position {
            Some(AuthorPosition::Rank(rank)) if (1..=5).contains(&rank) => Some((index, rank)),
            _ => None,
        })
        .collect();
    holders.sort_by_key(|&(_, rank)| rank);
    let is_corresponding = |index: usize| authors[index].role.is_corresponding();
    let mut assign = |index: usize, share: Share| shares[index] = AuthorShare::uniform(share);

    match holders.as_slice() {
        [] => {}
        [(only, _)] => assign(*only, Share::FULL),
        [(lead, _), (trail, _)] => {
            if is_corresponding(*trail) {
                assign(*lead, Share::percent(50));
                assign(*trail, Share::percent(50));
            } else {
                assign(*lead, Share::percent(60));
                assign(*trail, Share::percent(40));
            }
        }
        _ => {
            let first = holders
                .iter()
                .find(|&&(_, rank)| rank == 1)
                .map(|&(index, _)| index);
            let corresponding = holders
                .iter()
                .map(|&(index, _)| index)
                .find(|&index| Some(index) != first && is_corresponding(index));
            let total = holders.len();

            match (first, corresponding) {
                (Some(first), _) if is_corresponding(first) => {
                    assign(first, Share::percent(80));
                    for &(index, _) in holders.iter().filter(|&&(index, _)| index != first) {
                        assign(index, Share::split(20, total - 1));
                    }
                }
                (Some(first), Some(corresponding)) => {
                    assign(first, Share::percent(40));
                    assign(corresponding, Share::percent(40));
                    for &(index, _) in holders
                        .iter()
                        .filter(|&&(index, _)| index != first && index != corresponding)
                    {
                        assign(index, Share::split(20, total - 2));
                    }
                }
                _ => {
                    for &(index, rank) in &holders {
                        assign(index, Share::percent(table.percent_for(rank)));
                    }
                }
            }
        }
    }

    shares
}
