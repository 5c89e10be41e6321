//! Incentive policy records and lookup.
//!
//! The `policy` module defines the effective-dated policy tables that
//! price each publication type, the [`PolicyLookup`] trait through
//! which front ends fetch the record in force, and an in-memory
//! [`PolicyStore`] that can be hydrated from versioned JSON files.

use crate::models::{
    AuthorRole, CalculationRequest, ConferenceSubType, IndexingCategory, Publication,
    PublicationType, Quartile,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

fn default_active() -> bool {
    true
}

/// An amount and points pair added on top of a base pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    pub incentive_amount: u64,
    #[serde(default)]
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuartileIncentive {
    pub quartile: Quartile,
    pub incentive_amount: u64,
    pub points: u64,
}

/// Inclusive SJR band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SjrRange {
    pub min: f64,
    pub max: f64,
    pub incentive_amount: u64,
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBonus {
    pub category: IndexingCategory,
    pub incentive_amount: u64,
    pub points: u64,
}

/// Inclusive NAAS rating band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaasRatingIncentive {
    pub min_rating: f64,
    pub max_rating: f64,
    pub incentive_amount: u64,
    pub points: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePercentage {
    pub role: AuthorRole,
    pub percentage: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPercentage {
    pub position: u8,
    pub percentage: u64,
}

/// Validity window of a policy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyWindow {
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub active: bool,
}

impl PolicyWindow {
    /// Whether `date` falls inside `[effective_from, effective_to]`.  A
    /// missing bound is open.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.effective_from.map_or(true, |from| date >= from)
            && self.effective_to.map_or(true, |to| date <= to)
    }
}

/// Research paper policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPaperPolicy {
    /// `role_based` or `position_based`; anything else falls back to
    /// role-based distribution.
    #[serde(default)]
    pub distribution_method: Option<String>,
    #[serde(default)]
    pub quartile_incentives: Vec<QuartileIncentive>,
    #[serde(default)]
    pub sjr_ranges: Vec<SjrRange>,
    #[serde(default)]
    pub indexing_category_bonuses: Vec<CategoryBonus>,
    #[serde(default)]
    pub naas_rating_incentives: Vec<NaasRatingIncentive>,
    #[serde(default)]
    pub role_percentages: Vec<RolePercentage>,
    #[serde(default)]
    pub position_based_distribution: Vec<PositionPercentage>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Default for ResearchPaperPolicy {
    fn default() -> Self {
        Self {
            distribution_method: None,
            quartile_incentives: Vec::new(),
            sjr_ranges: Vec::new(),
            indexing_category_bonuses: Vec::new(),
            naas_rating_incentives: Vec::new(),
            role_percentages: Vec::new(),
            position_based_distribution: Vec::new(),
            effective_from: None,
            effective_to: None,
            active: true,
        }
    }
}

impl ResearchPaperPolicy {
    /// A research paper policy only counts when it took effect on or
    /// after `cutover` and the publication date lies inside its window.
    pub fn is_honoured(&self, publication_date: Option<NaiveDate>, cutover: NaiveDate) -> bool {
        let (Some(date), Some(from)) = (publication_date, self.effective_from) else {
            return false;
        };
        from >= cutover && self.window().contains(date)
    }

    pub fn window(&self) -> PolicyWindow {
        PolicyWindow {
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            active: self.active,
        }
    }
}

/// Conference paper policy.  Records are usually bound to one sub-type;
/// a record without `sub_type` applies to every sub-type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferencePolicy {
    #[serde(default)]
    pub sub_type: Option<ConferenceSubType>,
    #[serde(default)]
    pub quartile_incentives: Vec<QuartileIncentive>,
    #[serde(default)]
    pub flat_incentive_amount: u64,
    #[serde(default)]
    pub flat_points: u64,
    #[serde(default)]
    pub international_bonus: Option<Bonus>,
    #[serde(default)]
    pub best_paper_award_bonus: Option<Bonus>,
    #[serde(default)]
    pub role_percentages: Vec<RolePercentage>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Default for ConferencePolicy {
    fn default() -> Self {
        Self {
            sub_type: None,
            quartile_incentives: Vec::new(),
            flat_incentive_amount: 0,
            flat_points: 0,
            international_bonus: None,
            best_paper_award_bonus: None,
            role_percentages: Vec::new(),
            effective_from: None,
            effective_to: None,
            active: true,
        }
    }
}

impl ConferencePolicy {
    pub fn window(&self) -> PolicyWindow {
        PolicyWindow {
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookIndexingBonuses {
    pub scopus_indexed: Option<Bonus>,
    pub sgt_publication_house: Option<Bonus>,
}

/// Book and book chapter policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPolicy {
    #[serde(default)]
    pub authored_incentive_amount: u64,
    #[serde(default)]
    pub authored_points: u64,
    #[serde(default)]
    pub edited_incentive_amount: u64,
    #[serde(default)]
    pub edited_points: u64,
    #[serde(default)]
    pub indexing_bonuses: BookIndexingBonuses,
    #[serde(default)]
    pub international_bonus: Option<Bonus>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Default for BookPolicy {
    fn default() -> Self {
        Self {
            authored_incentive_amount: 0,
            authored_points: 0,
            edited_incentive_amount: 0,
            edited_points: 0,
            indexing_bonuses: BookIndexingBonuses::default(),
            international_bonus: None,
            effective_from: None,
            effective_to: None,
            active: true,
        }
    }
}

impl BookPolicy {
    pub fn window(&self) -> PolicyWindow {
        PolicyWindow {
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            active: self.active,
        }
    }
}

/// A policy record, tagged by the publication type it prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "publication_type", rename_all = "snake_case")]
pub enum Policy {
    ResearchPaper(ResearchPaperPolicy),
    ConferencePaper(ConferencePolicy),
    Book(BookPolicy),
    BookChapter(BookPolicy),
}

impl Policy {
    pub fn publication_type(&self) -> PublicationType {
        match self {
            Policy::ResearchPaper(_) => PublicationType::ResearchPaper,
            Policy::ConferencePaper(_) => PublicationType::ConferencePaper,
            Policy::Book(_) => PublicationType::Book,
            Policy::BookChapter(_) => PublicationType::BookChapter,
        }
    }

    pub fn window(&self) -> PolicyWindow {
        match self {
            Policy::ResearchPaper(policy) => policy.window(),
            Policy::ConferencePaper(policy) => policy.window(),
            Policy::Book(policy) | Policy::BookChapter(policy) => policy.window(),
        }
    }

    fn conference_sub_type(&self) -> Option<ConferenceSubType> {
        match self {
            Policy::ConferencePaper(policy) => policy.sub_type,
            _ => None,
        }
    }
}

/// What a policy lookup is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    pub publication_type: PublicationType,
    pub conference_sub_type: Option<ConferenceSubType>,
}

impl PolicyKey {
    pub fn for_publication(publication: &Publication) -> Self {
        let conference_sub_type = match publication {
            Publication::ConferencePaper(details) => Some(details.sub_type),
            _ => None,
        };
        Self {
            publication_type: publication.publication_type(),
            conference_sub_type,
        }
    }

    /// Exact sub-type matches rank above generic conference records.
    fn match_rank(&self, policy: &Policy) -> Option<u8> {
        if policy.publication_type() != self.publication_type {
            return None;
        }
        match (self.conference_sub_type, policy.conference_sub_type()) {
            (_, None) => Some(0),
            (Some(wanted), Some(bound)) if wanted == bound => Some(1),
            _ => None,
        }
    }
}

/// Source of active policy records.  The portal backend plays this role
/// in production; [`PolicyStore`] is the in-process implementation.
pub trait PolicyLookup: Send + Sync {
    /// Returns the record in force for `key`.  With a date, only records
    /// whose window contains it are considered.
    fn find(&self, key: &PolicyKey, on: Option<NaiveDate>) -> Option<Policy>;
}

/// Errors raised while loading policy files.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// In-memory collection of policy records.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    policies: Vec<Policy>,
}

impl PolicyStore {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies }
    }

    pub fn from_dir(path: &Path) -> Result<Self, PolicyLoadError> {
        load_policies_from_dir(path).map(Self::new)
    }

    pub fn insert(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }
}

impl PolicyLookup for PolicyStore {
    fn find(&self, key: &PolicyKey, on: Option<NaiveDate>) -> Option<Policy> {
        self.policies
            .iter()
            .filter(|policy| policy.window().active)
            .filter_map(|policy| key.match_rank(policy).map(|rank| (rank, policy)))
            .filter(|(_, policy)| on.map_or(true, |date| policy.window().contains(date)))
            .max_by_key(|(rank, policy)| (*rank, policy.window().effective_from))
            .map(|(_, policy)| policy.clone())
    }
}

/// Fills in `request.policy` from `lookup` when the caller did not send
/// one.  Returns whether a policy is now attached.
pub fn attach_policy(request: &mut CalculationRequest, lookup: &dyn PolicyLookup) -> bool {
    if request.policy.is_none() {
        let key = PolicyKey::for_publication(&request.publication);
        request.policy = lookup.find(&key, request.publication.publication_date());
        if request.policy.is_none() {
            debug!(publication_type = %key.publication_type, "no active policy found");
        }
    }
    request.policy.is_some()
}

/// Load all policy records from a directory.
///
/// Every `.json` file is parsed as a single [`Policy`].  Files that fail
/// to parse are skipped with a warning so one bad record does not take
/// the whole table down.  A missing directory yields an empty list.
pub fn load_policies_from_dir(path: &Path) -> Result<Vec<Policy>, PolicyLoadError> {
    let io_err = |source| PolicyLoadError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut policies = Vec::new();
    if !path.is_dir() {
        warn!(path = %path.display(), "policy directory not found");
        return Ok(policies);
    }
    let mut entries = std::fs::read_dir(path)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(|entry| entry.path());
    for entry in entries {
        let file = entry.path();
        if !file.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file).map_err(io_err)?;
        match serde_json::from_str::<Policy>(&data) {
            Ok(policy) => policies.push(policy),
            Err(err) => warn!(file = %file.display(), error = %err, "failed to parse policy"),
        }
    }
    debug!(count = policies.len(), "loaded policies");
    Ok(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConferencePaperDetails, ResearchPaperDetails};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn research(from: NaiveDate, to: Option<NaiveDate>) -> Policy {
        Policy::ResearchPaper(ResearchPaperPolicy {
            effective_from: Some(from),
            effective_to: to,
            ..ResearchPaperPolicy::default()
        })
    }

    #[test]
    fn research_policy_parses_from_json() {
        let policy: Policy = serde_json::from_value(json!({
            "publication_type": "research_paper",
            "distribution_method": "position_based",
            "quartile_incentives": [{"quartile": "Q1", "incentive_amount": 50000, "points": 50}],
            "effective_from": "2025-04-01"
        }))
        .expect("policy parses");

        match policy {
            Policy::ResearchPaper(research) => {
                assert_eq!(research.quartile_incentives.len(), 1);
                assert_eq!(research.distribution_method.as_deref(), Some("position_based"));
                assert!(research.active);
                assert_eq!(research.effective_to, None);
            }
            other => panic!("expected research policy, got {other:?}"),
        }
    }

    #[test]
    fn honoured_only_after_cutover_and_inside_window() {
        let cutover = date(2025, 1, 1);
        let policy = ResearchPaperPolicy {
            effective_from: Some(date(2025, 4, 1)),
            effective_to: Some(date(2026, 3, 31)),
            ..ResearchPaperPolicy::default()
        };
        assert!(policy.is_honoured(Some(date(2025, 4, 1)), cutover));
        assert!(policy.is_honoured(Some(date(2026, 3, 31)), cutover));
        assert!(!policy.is_honoured(Some(date(2025, 3, 31)), cutover));
        assert!(!policy.is_honoured(Some(date(2026, 4, 1)), cutover));
        assert!(!policy.is_honoured(None, cutover));

        let stale = ResearchPaperPolicy {
            effective_from: Some(date(2024, 1, 1)),
            ..ResearchPaperPolicy::default()
        };
        assert!(!stale.is_honoured(Some(date(2025, 6, 1)), cutover));
    }

    #[test]
    fn store_prefers_latest_record_covering_the_date() {
        let store = PolicyStore::new(vec![
            research(date(2025, 1, 1), Some(date(2025, 12, 31))),
            research(date(2026, 1, 1), None),
        ]);
        let key = PolicyKey::for_publication(&Publication::ResearchPaper(
            ResearchPaperDetails::default(),
        ));

        let found = store.find(&key, Some(date(2025, 7, 1))).expect("policy found");
        assert_eq!(found.window().effective_from, Some(date(2025, 1, 1)));

        let latest = store.find(&key, None).expect("latest policy found");
        assert_eq!(latest.window().effective_from, Some(date(2026, 1, 1)));

        assert!(store.find(&key, Some(date(2024, 7, 1))).is_none());
    }

    #[test]
    fn store_matches_conference_sub_type_before_generic_records() {
        let generic = ConferencePolicy {
            flat_incentive_amount: 1000,
            ..ConferencePolicy::default()
        };
        let keynote = ConferencePolicy {
            sub_type: Some(ConferenceSubType::KeynoteInvitedTalk),
            flat_incentive_amount: 7000,
            ..ConferencePolicy::default()
        };
        let store = PolicyStore::new(vec![
            Policy::ConferencePaper(generic),
            Policy::ConferencePaper(keynote),
        ]);
        let publication = Publication::ConferencePaper(ConferencePaperDetails {
            sub_type: ConferenceSubType::KeynoteInvitedTalk,
            proceedings_quartile: None,
            scope: None,
            is_presenter: None,
            best_paper_award: false,
        });

        match store.find(&PolicyKey::for_publication(&publication), None) {
            Some(Policy::ConferencePaper(policy)) => assert_eq!(policy.flat_incentive_amount, 7000),
            other => panic!("expected keynote policy, got {other:?}"),
        }
    }

    #[test]
    fn inactive_records_are_ignored() {
        let mut inactive = ResearchPaperPolicy {
            effective_from: Some(date(2025, 1, 1)),
            ..ResearchPaperPolicy::default()
        };
        inactive.active = false;
        let store = PolicyStore::new(vec![Policy::ResearchPaper(inactive)]);
        let key = PolicyKey {
            publication_type: PublicationType::ResearchPaper,
            conference_sub_type: None,
        };
        assert!(store.find(&key, None).is_none());
    }

    #[test]
    fn loader_skips_unparsable_files() {
        let dir = std::env::temp_dir().join(format!("incentive-policies-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        std::fs::write(
            dir.join("book_2025.json"),
            r#"{"publication_type": "book", "authored_incentive_amount": 30000, "authored_points": 30}"#,
        )
        .expect("write policy");
        std::fs::write(dir.join("broken.json"), "{not json").expect("write broken file");
        std::fs::write(dir.join("notes.txt"), "ignored").expect("write notes");

        let policies = load_policies_from_dir(&dir).expect("directory loads");
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].publication_type(), PublicationType::Book);
    }

    #[test]
    fn missing_directory_yields_no_policies() {
        let policies = load_policies_from_dir(Path::new("/definitely/not/here"))
            .expect("missing directory is not an error");
        assert!(policies.is_empty());
    }
}
