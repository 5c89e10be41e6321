//! Per-publication-type incentive calculators.
//!
//! Each publication family implements [`IncentiveCalculator`], which
//! turns a policy and publication metadata into a [`Pool`] and decides
//! how that pool is shared across the roster.  Calculators never fail:
//! a mismatched policy, a missing metric or an out-of-window date simply
//! produces an empty [`Apportionment`].

use crate::distribution::{
    position_based_shares, resolve_strategy, role_based_shares, AuthorShare,
    DistributionStrategy, PositionTable, RoleShareTable, Share,
};
use crate::models::{
    Author, BookDetails, BookIndexing, BookPublicationKind, ConferencePaperDetails,
    ConferenceSubType, IndexingCategory, Pool, Publication, PublicationScope, PublicationType,
    ResearchPaperDetails,
};
use crate::policy::{Bonus, BookPolicy, ConferencePolicy, Policy, ResearchPaperPolicy};
use chrono::NaiveDate;
use tracing::debug;

/// Minimum NAAS rating that qualifies for an incentive.
pub const MIN_NAAS_RATING: f64 = 6.0;
/// Impact factor a subsidiary-indexed journal must exceed.
pub const SUBSIDIARY_IMPACT_FACTOR_THRESHOLD: f64 = 20.0;

/// Knobs shared by all calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Research paper policies that took effect before this date are
    /// not honoured.
    pub research_policy_cutover: NaiveDate,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            research_policy_cutover: default_research_cutover(),
        }
    }
}

pub fn default_research_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// A pool plus one share per author, in roster order.
#[derive(Debug, Clone, PartialEq)]
pub struct Apportionment {
    pub pool: Pool,
    pub shares: Vec<AuthorShare>,
}

impl Apportionment {
    pub fn empty(authors: usize) -> Self {
        Self {
            pool: Pool::zero(),
            shares: vec![AuthorShare::ZERO; authors],
        }
    }
}

/// Calculates the pool and per-author shares for one publication type.
///
/// Calculators must be thread-safe (`Send + Sync`) because batch runs
/// invoke them concurrently.
pub trait IncentiveCalculator: Send + Sync {
    /// The publication type this calculator prices.
    fn publication_type(&self) -> PublicationType;

    /// `authors` lists the submitter first, followed by co-authors.
    fn apportion(
        &self,
        authors: &[&Author],
        policy: &Policy,
        publication: &Publication,
        settings: &EngineSettings,
    ) -> Apportionment;
}

/// Splits 100% evenly between the internal authors on the roster.
/// External authors are excluded before the split.
fn equal_shares(authors: &[&Author]) -> Vec<AuthorShare> {
    let internal = authors.iter().filter(|author| author.is_internal()).count();
    authors
        .iter()
        .map(|author| {
            if author.is_internal() {
                AuthorShare::uniform(Share::split(100, internal))
            } else {
                AuthorShare::ZERO
            }
        })
        .collect()
}

fn add_bonus(pool: &mut Pool, bonus: Option<Bonus>) {
    if let Some(bonus) = bonus {
        pool.incentive = pool.incentive.saturating_add(bonus.incentive_amount);
        pool.points = pool.points.saturating_add(bonus.points);
    }
}

/// Research papers: best single indexing category, apportioned by the
/// policy's distribution strategy.
pub struct ResearchPaperCalculator;

impl ResearchPaperCalculator {
    /// Every indexing claim that the policy prices.
    fn candidates(policy: &ResearchPaperPolicy, details: &ResearchPaperDetails) -> Vec<Pool> {
        let category_bonus = |category: &IndexingCategory| {
            policy
                .indexing_category_bonuses
                .iter()
                .find(|row| &row.category == category)
                .map(|row| Pool::new(row.incentive_amount, row.points, category.as_str()))
        };

        let mut candidates = Vec::new();
        for category in &details.indexing_categories {
            match category {
                IndexingCategory::Scopus => {
                    // Quartile row and SJR band compete as separate candidates
                    if let Some(quartile) = details.quartile {
                        candidates.extend(
                            policy
                                .quartile_incentives
                                .iter()
                                .find(|row| row.quartile == quartile)
                                .map(|row| {
                                    Pool::new(
                                        row.incentive_amount,
                                        row.points,
                                        format!("scopus {quartile:?}"),
                                    )
                                }),
                        );
                    }
                    if let Some(sjr) = details.sjr {
                        candidates.extend(
                            policy
                                .sjr_ranges
                                .iter()
                                .find(|range| range.min <= sjr && sjr <= range.max)
                                .map(|range| {
                                    Pool::new(
                                        range.incentive_amount,
                                        range.points,
                                        format!("scopus sjr {sjr}"),
                                    )
                                }),
                        );
                    }
                }
                IndexingCategory::NaasRating6Plus => {
                    if let Some(rating) = details.naas_rating.filter(|r| *r >= MIN_NAAS_RATING) {
                        candidates.extend(
                            policy
                                .naas_rating_incentives
                                .iter()
                                .find(|band| band.min_rating <= rating && rating <= band.max_rating)
                                .map(|band| {
                                    Pool::new(
                                        band.incentive_amount,
                                        band.points,
                                        format!("naas rating {rating}"),
                                    )
                                }),
                        );
                    }
                }
                IndexingCategory::SubsidiaryIfAbove20 => {
                    // Only journals above the impact factor threshold qualify
                    if details
                        .impact_factor
                        .is_some_and(|factor| factor > SUBSIDIARY_IMPACT_FACTOR_THRESHOLD)
                    {
                        candidates.extend(category_bonus(category));
                    }
                }
                IndexingCategory::ScieWos | IndexingCategory::Other(_) => {
                    candidates.extend(category_bonus(category));
                }
            }
        }
        candidates
    }

    /// The highest-amount candidate.  Overlapping indexing claims are
    /// never summed.
    pub fn select_pool(policy: &ResearchPaperPolicy, details: &ResearchPaperDetails) -> Pool {
        Self::candidates(policy, details)
            .into_iter()
            .fold(None::<Pool>, |best, candidate| match best {
                Some(best)
                    if (best.incentive, best.points) >= (candidate.incentive, candidate.points) =>
                {
                    Some(best)
                }
                _ => Some(candidate),
            })
            .filter(|pool| !pool.is_empty())
            .unwrap_or_default()
    }
}

impl IncentiveCalculator for ResearchPaperCalculator {
    fn publication_type(&self) -> PublicationType {
        PublicationType::ResearchPaper
    }

    fn apportion(
        &self,
        authors: &[&Author],
        policy: &Policy,
        publication: &Publication,
        settings: &EngineSettings,
    ) -> Apportionment {
        let (Policy::ResearchPaper(policy), Publication::ResearchPaper(details)) =
            (policy, publication)
        else {
            return Apportionment::empty(authors.len());
        };
        if !policy.is_honoured(details.publication_date, settings.research_policy_cutover) {
            debug!(
                publication_date = ?details.publication_date,
                effective_from = ?policy.effective_from,
                "research policy not honoured for publication date"
            );
            return Apportionment::empty(authors.len());
        }

        // Pick the best indexing claim, then split it by the policy's strategy
        let pool = Self::select_pool(policy, details);
        if pool.is_empty() {
            return Apportionment::empty(authors.len());
        }

        let strategy = resolve_strategy(policy);
        debug!(?strategy, basis = ?pool.basis, pool = pool.incentive, "research pool selected");
        let shares = match strategy {
            DistributionStrategy::RoleBased => {
                role_based_shares(authors, &RoleShareTable::from_policy(&policy.role_percentages))
            }
            DistributionStrategy::PositionBased => position_based_shares(
                authors,
                &PositionTable::from_policy(&policy.position_based_distribution),
            ),
        };
        Apportionment { pool, shares }
    }
}

/// Conference papers: four sub-types with their own pool and split rules.
pub struct ConferencePaperCalculator;

impl ConferencePaperCalculator {
    fn scopus_pool(policy: &ConferencePolicy, details: &ConferencePaperDetails) -> Pool {
        let Some(row) = details.proceedings_quartile.and_then(|quartile| {
            policy
                .quartile_incentives
                .iter()
                .find(|row| row.quartile == quartile)
        }) else {
            return Pool::zero();
        };
        let mut pool = Pool::new(
            row.incentive_amount,
            row.points,
            format!("scopus proceedings {:?}", row.quartile),
        );
        if details.scope == Some(PublicationScope::International) {
            add_bonus(&mut pool, policy.international_bonus);
        }
        if details.best_paper_award {
            add_bonus(&mut pool, policy.best_paper_award_bonus);
        }
        pool
    }
}

impl IncentiveCalculator for ConferencePaperCalculator {
    fn publication_type(&self) -> PublicationType {
        PublicationType::ConferencePaper
    }

    fn apportion(
        &self,
        authors: &[&Author],
        policy: &Policy,
        publication: &Publication,
        _settings: &EngineSettings,
    ) -> Apportionment {
        let (Policy::ConferencePaper(policy), Publication::ConferencePaper(details)) =
            (policy, publication)
        else {
            return Apportionment::empty(authors.len());
        };
        if policy.sub_type.is_some_and(|bound| bound != details.sub_type) {
            debug!(sub_type = ?details.sub_type, "conference policy bound to another sub-type");
            return Apportionment::empty(authors.len());
        }

        let flat = || {
            Pool::new(
                policy.flat_incentive_amount,
                policy.flat_points,
                format!("{:?}", details.sub_type),
            )
        };
        let (pool, shares) = match details.sub_type {
            ConferenceSubType::ScopusIndexedProceedings => {
                let pool = Self::scopus_pool(policy, details);
                let table = RoleShareTable::from_policy(&policy.role_percentages);
                (pool, role_based_shares(authors, &table))
            }
            ConferenceSubType::PaperNotIndexed => {
                if details.is_presenter == Some(false) {
                    debug!("submitter did not present, conference pool forfeited");
                    return Apportionment::empty(authors.len());
                }
                (flat(), equal_shares(authors))
            }
            ConferenceSubType::KeynoteInvitedTalk | ConferenceSubType::OrganizerCoordinator => {
                let mut shares = vec![AuthorShare::ZERO; authors.len()];
                if let Some(presenter) = shares.first_mut() {
                    *presenter = AuthorShare::uniform(Share::FULL);
                }
                (flat(), shares)
            }
        };

        if pool.is_empty() {
            return Apportionment::empty(authors.len());
        }
        Apportionment { pool, shares }
    }
}

/// Books and book chapters: base amount plus bonuses, split evenly with
/// no role hierarchy.  One type serves both families, distinguished by
/// the publication type it was registered for.
pub struct BookCalculator {
    pub publication_type: PublicationType,
}

impl BookCalculator {
    pub fn book() -> Self {
        Self {
            publication_type: PublicationType::Book,
        }
    }

    pub fn chapter() -> Self {
        Self {
            publication_type: PublicationType::BookChapter,
        }
    }

    pub fn pool(policy: &BookPolicy, details: &BookDetails) -> Pool {
        let mut pool = match details.publication_kind {
            BookPublicationKind::Authored => Pool::new(
                policy.authored_incentive_amount,
                policy.authored_points,
                "authored",
            ),
            BookPublicationKind::Edited => {
                Pool::new(policy.edited_incentive_amount, policy.edited_points, "edited")
            }
        };
        let indexing_bonus = match details.indexing {
            Some(BookIndexing::ScopusIndexed) => policy.indexing_bonuses.scopus_indexed,
            Some(BookIndexing::SgtPublicationHouse) => {
                policy.indexing_bonuses.sgt_publication_house
            }
            None => None,
        };
        add_bonus(&mut pool, indexing_bonus);
        if details.scope == Some(PublicationScope::International) {
            add_bonus(&mut pool, policy.international_bonus);
        }
        pool
    }
}

impl IncentiveCalculator for BookCalculator {
    fn publication_type(&self) -> PublicationType {
        self.publication_type
    }

    fn apportion(
        &self,
        authors: &[&Author],
        policy: &Policy,
        publication: &Publication,
        _settings: &EngineSettings,
    ) -> Apportionment {
        let (policy, details) = match (policy, publication) {
            (Policy::Book(policy), Publication::Book(details))
            | (Policy::BookChapter(policy), Publication::BookChapter(details)) => (policy, details),
            _ => return Apportionment::empty(authors.len()),
        };
        let pool = Self::pool(policy, details);
        if pool.is_empty() {
            return Apportionment::empty(authors.len());
        }
        Apportionment {
            pool,
            shares: equal_shares(authors),
        }
    }
}
