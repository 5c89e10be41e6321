//! Incentive computation engine.
//!
//! The `engine` module turns a roster, a policy and publication
//! metadata into a [`CalculationResult`].  Pool and share decisions are
//! delegated to the [`IncentiveCalculator`] registered for the
//! publication type; the engine applies the shares, enforces the
//! category rules (external authors earn nothing, students earn no
//! points) and guarantees that floor rounding never pays out more than
//! the pool.  Batches of independent requests are evaluated in parallel
//! with [`rayon`].

use crate::calculators::{
    BookCalculator, ConferencePaperCalculator, EngineSettings, IncentiveCalculator,
    ResearchPaperCalculator,
};
use crate::distribution::AuthorShare;
use crate::models::{
    Author, AuthorAward, AuthorCategory, CalculationRequest, CalculationResult, Pool,
    Publication, PublicationType, Roster,
};
use crate::policy::Policy;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Stateless calculator front end.  Holds only settings and the
/// calculator registry, so one instance can be shared across threads.
#[derive(Clone)]
pub struct IncentiveEngine {
    settings: EngineSettings,
    calculators: HashMap<PublicationType, Arc<dyn IncentiveCalculator>>,
}

impl Default for IncentiveEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl IncentiveEngine {
    /// Builds an engine with the four built-in calculators registered.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            calculators: HashMap::new(),
        }
        .with_calculator(Arc::new(ResearchPaperCalculator))
        .with_calculator(Arc::new(ConferencePaperCalculator))
        .with_calculator(Arc::new(BookCalculator::book()))
        .with_calculator(Arc::new(BookCalculator::chapter()))
    }

    /// Registers `calculator`, replacing any previous one for the same
    /// publication type.
    pub fn with_calculator(mut self, calculator: Arc<dyn IncentiveCalculator>) -> Self {
        self.calculators
            .insert(calculator.publication_type(), calculator);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Computes every author's award.  Never fails: a missing policy or
    /// an unregistered publication type yields zero for everyone.
    pub fn calculate(
        &self,
        roster: &Roster,
        policy: Option<&Policy>,
        publication: &Publication,
    ) -> CalculationResult {
        let authors: Vec<&Author> = roster.authors().collect();
        let Some(policy) = policy else {
            debug!(publication_type = %publication.publication_type(), "no policy supplied");
            return CalculationResult::zero(authors);
        };
        let Some(calculator) = self.calculators.get(&publication.publication_type()) else {
            debug!(publication_type = %publication.publication_type(), "no calculator registered");
            return CalculationResult::zero(authors);
        };

        let apportionment = calculator.apportion(&authors, policy, publication, &self.settings);
        let awards = settle(&authors, &apportionment.pool, &apportionment.shares);
        let result = CalculationResult::new(apportionment.pool, awards);
        debug!(
            publication_type = %publication.publication_type(),
            pool = result.pool.incentive,
            total_incentive = result.total_incentive,
            total_points = result.total_points,
            "calculation complete"
        );
        result
    }

    /// Evaluates independent requests in parallel, returning results in
    /// request order.
    pub fn run_batch(&self, requests: Vec<CalculationRequest>) -> Vec<CalculationResult> {
        requests
            .into_par_iter()
            .map(|request| self.calculate(&request.roster, request.policy.as_ref(), &request.publication))
            .collect()
    }
}

/// Calculates with the default settings and calculators.
pub fn calculate(roster: &Roster, policy: Option<&Policy>, publication: &Publication) -> CalculationResult {
    IncentiveEngine::default().calculate(roster, policy, publication)
}

/// Turns shares into awards.  External authors are short-circuited to
/// zero, students keep their incentive but earn no points, and each
/// award is clamped to what is left of the pool.
fn settle(authors: &[&Author], pool: &Pool, shares: &[AuthorShare]) -> Vec<AuthorAward> {
    let mut remaining_incentive = pool.incentive;
    let mut remaining_points = pool.points;

    authors
        .iter()
        .enumerate()
        .map(|(index, author)| {
            let share = shares.get(index).copied().unwrap_or(AuthorShare::ZERO);
            // Apply the share, then the category rules
            let (incentive, points) = match author.category() {
                AuthorCategory::External => (0, 0),
                AuthorCategory::Internal => {
                    let incentive = share.incentive.apply(pool.incentive);
                    let points = if author.is_student() {
                        0
                    } else {
                        share.points.apply(pool.points)
                    };
                    (incentive, points)
                }
            };
            // Never hand out more than is left of the pool
            let incentive = incentive.min(remaining_incentive);
            let points = points.min(remaining_points);
            remaining_incentive -= incentive;
            remaining_points -= points;
            AuthorAward {
                author: author.key(),
                incentive,
                points,
            }
        })
        .collect()
}
