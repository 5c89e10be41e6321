//! Data models for the Incentive Engine.
//!
//! The `models` module defines the serialisable types describing a
//! research contribution: its authors, the roster they form, the
//! publication metadata entered on the submission form, and the
//! per-author results produced by the engine.  Every type derives
//! `Serialize` and `Deserialize` so that requests and results can be
//! exchanged as JSON with the portal front end.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::Policy;

/// Whether an author belongs to the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorCategory {
    Internal,
    External,
}

/// Sub-type of an internal author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalSubType {
    Faculty,
    Student,
}

/// Sub-type of an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSubType {
    Academic,
    Industry,
    InternationalAuthor,
}

/// Flattened view over [`InternalSubType`] and [`ExternalSubType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorSubType {
    Faculty,
    Student,
    Academic,
    Industry,
    InternationalAuthor,
}

/// Who the author is.  Internal authors are referenced by their portal
/// user id; external collaborators are described by free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum AuthorIdentity {
    Internal {
        uid: String,
        sub_type: InternalSubType,
    },
    External {
        name: String,
        email: Option<String>,
        affiliation: Option<String>,
        designation: Option<String>,
        sub_type: ExternalSubType,
    },
}

/// Authorship role used by role-based distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    First,
    Corresponding,
    FirstAndCorresponding,
    #[default]
    CoAuthor,
}

impl AuthorRole {
    /// True for `First` and `FirstAndCorresponding`.
    pub fn is_first(self) -> bool {
        matches!(self, AuthorRole::First | AuthorRole::FirstAndCorresponding)
    }

    /// True for `Corresponding` and `FirstAndCorresponding`.
    pub fn is_corresponding(self) -> bool {
        matches!(
            self,
            AuthorRole::Corresponding | AuthorRole::FirstAndCorresponding
        )
    }
}

/// Author position used by position-based distribution: a rank between
/// one and five, or the catch-all `"6+"` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PositionRepr", into = "PositionRepr")]
pub enum AuthorPosition {
    Rank(u8),
    SixPlus,
}

impl AuthorPosition {
    /// The numeric rank for positions one to five.
    pub fn rank(self) -> Option<u8> {
        match self {
            AuthorPosition::Rank(rank) => Some(rank),
            AuthorPosition::SixPlus => None,
        }
    }
}

impl fmt::Display for AuthorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorPosition::Rank(rank) => write!(f, "{rank}"),
            AuthorPosition::SixPlus => f.write_str("6+"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Rank(u64),
    Label(String),
}

impl TryFrom<PositionRepr> for AuthorPosition {
    type Error = String;

    fn try_from(value: PositionRepr) -> Result<Self, Self::Error> {
        let rank = match value {
            PositionRepr::Rank(rank) => rank,
            PositionRepr::Label(label) => {
                let label = label.trim();
                if label == "6+" {
                    return Ok(AuthorPosition::SixPlus);
                }
                label
                    .parse::<u64>()
                    .map_err(|_| format!("invalid author position '{label}'"))?
            }
        };
        match rank {
            0 => Err("author position must be at least 1".to_string()),
            1..=5 => Ok(AuthorPosition::Rank(rank as u8)),
            _ => Ok(AuthorPosition::SixPlus),
        }
    }
}

impl From<AuthorPosition> for PositionRepr {
    fn from(value: AuthorPosition) -> Self {
        match value {
            AuthorPosition::Rank(rank) => PositionRepr::Rank(u64::from(rank)),
            AuthorPosition::SixPlus => PositionRepr::Label("6+".to_string()),
        }
    }
}

/// Stable identity of an author inside a [`CalculationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorKey(pub String);

impl fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorKey {
    fn from(value: &str) -> Self {
        AuthorKey(value.to_string())
    }
}

/// One contributor to a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(flatten)]
    pub identity: AuthorIdentity,
    #[serde(default)]
    pub role: AuthorRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AuthorPosition>,
    /// 1-based rank in the full ordered author list.  Supplied by the
    /// form (including manual reordering) and treated as authoritative.
    pub paper_position: u32,
}

impl Author {
    pub fn internal(
        uid: impl Into<String>,
        sub_type: InternalSubType,
        role: AuthorRole,
        paper_position: u32,
    ) -> Self {
        Self {
            identity: AuthorIdentity::Internal {
                uid: uid.into(),
                sub_type,
            },
            role,
            position: None,
            paper_position,
        }
    }

    pub fn external(
        name: impl Into<String>,
        sub_type: ExternalSubType,
        role: AuthorRole,
        paper_position: u32,
    ) -> Self {
        Self {
            identity: AuthorIdentity::External {
                name: name.into(),
                email: None,
                affiliation: None,
                designation: None,
                sub_type,
            },
            role,
            position: None,
            paper_position,
        }
    }

    /// Sets the position used by position-based distribution.
    pub fn at_position(mut self, position: AuthorPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn category(&self) -> AuthorCategory {
        match self.identity {
            AuthorIdentity::Internal { .. } => AuthorCategory::Internal,
            AuthorIdentity::External { .. } => AuthorCategory::External,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.category() == AuthorCategory::Internal
    }

    pub fn sub_type(&self) -> AuthorSubType {
        match &self.identity {
            AuthorIdentity::Internal { sub_type, .. } => match sub_type {
                InternalSubType::Faculty => AuthorSubType::Faculty,
                InternalSubType::Student => AuthorSubType::Student,
            },
            AuthorIdentity::External { sub_type, .. } => match sub_type {
                ExternalSubType::Academic => AuthorSubType::Academic,
                ExternalSubType::Industry => AuthorSubType::Industry,
                ExternalSubType::InternationalAuthor => AuthorSubType::InternationalAuthor,
            },
        }
    }

    pub fn is_student(&self) -> bool {
        self.sub_type() == AuthorSubType::Student
    }

    /// Internal authors are keyed by uid; external authors by email when
    /// one was entered, otherwise by name.
    pub fn key(&self) -> AuthorKey {
        match &self.identity {
            AuthorIdentity::Internal { uid, .. } => AuthorKey(uid.clone()),
            AuthorIdentity::External { name, email, .. } => AuthorKey(
                email
                    .as_ref()
                    .filter(|email| !email.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| name.clone()),
            ),
        }
    }
}

/// Author totals declared by the submission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterCounts {
    pub total_authors: u32,
    pub internal_authors: u32,
    pub internal_co_authors: u32,
}

/// The submitting user plus every co-author of the publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub submitter: Author,
    #[serde(default)]
    pub co_authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<RosterCounts>,
}

impl Roster {
    pub fn new(submitter: Author, co_authors: Vec<Author>) -> Self {
        Self {
            submitter,
            co_authors,
            counts: None,
        }
    }

    /// All authors, submitter first.
    pub fn authors(&self) -> impl Iterator<Item = &Author> {
        std::iter::once(&self.submitter).chain(self.co_authors.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.co_authors.len()
    }

    /// A roster always contains the submitter.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Publication families handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationType {
    ResearchPaper,
    ConferencePaper,
    Book,
    BookChapter,
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PublicationType::ResearchPaper => "research_paper",
            PublicationType::ConferencePaper => "conference_paper",
            PublicationType::Book => "book",
            PublicationType::BookChapter => "book_chapter",
        };
        f.write_str(label)
    }
}

/// Journal quartile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
}

/// Indexing category claimed for a research paper.  Categories outside
/// the named ones are flat categories priced by the policy's bonus table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndexingCategory {
    Scopus,
    ScieWos,
    NaasRating6Plus,
    SubsidiaryIfAbove20,
    Other(String),
}

impl IndexingCategory {
    pub fn as_str(&self) -> &str {
        match self {
            IndexingCategory::Scopus => "scopus",
            IndexingCategory::ScieWos => "scie_wos",
            IndexingCategory::NaasRating6Plus => "naas_rating_6_plus",
            IndexingCategory::SubsidiaryIfAbove20 => "subsidiary_if_above_20",
            IndexingCategory::Other(other) => other,
        }
    }
}

impl From<String> for IndexingCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "scopus" => IndexingCategory::Scopus,
            "scie_wos" | "scie" | "wos" => IndexingCategory::ScieWos,
            "naas_rating_6_plus" => IndexingCategory::NaasRating6Plus,
            "subsidiary_if_above_20" => IndexingCategory::SubsidiaryIfAbove20,
            other => IndexingCategory::Other(other.to_string()),
        }
    }
}

impl From<IndexingCategory> for String {
    fn from(value: IndexingCategory) -> Self {
        value.as_str().to_string()
    }
}

/// National or international reach of a conference or book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationScope {
    National,
    International,
}

/// Research paper metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPaperDetails {
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub indexing_categories: Vec<IndexingCategory>,
    pub quartile: Option<Quartile>,
    pub sjr: Option<f64>,
    pub impact_factor: Option<f64>,
    pub naas_rating: Option<f64>,
}

/// Conference contribution sub-types.  Conference policies are keyed by
/// sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConferenceSubType {
    ScopusIndexedProceedings,
    PaperNotIndexed,
    KeynoteInvitedTalk,
    OrganizerCoordinator,
}

/// Conference paper metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferencePaperDetails {
    pub sub_type: ConferenceSubType,
    pub proceedings_quartile: Option<Quartile>,
    pub scope: Option<PublicationScope>,
    /// `Some(false)` only when the form recorded the submitter as a
    /// non-presenter.
    pub is_presenter: Option<bool>,
    #[serde(default)]
    pub best_paper_award: bool,
}

/// Whether the book (or the volume holding a chapter) was authored or
/// edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookPublicationKind {
    Authored,
    Edited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookIndexing {
    ScopusIndexed,
    SgtPublicationHouse,
}

/// Book and book chapter metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub publication_kind: BookPublicationKind,
    pub indexing: Option<BookIndexing>,
    pub scope: Option<PublicationScope>,
}

/// Publication metadata tagged by publication type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "publication_type", rename_all = "snake_case")]
pub enum Publication {
    ResearchPaper(ResearchPaperDetails),
    ConferencePaper(ConferencePaperDetails),
    Book(BookDetails),
    BookChapter(BookDetails),
}

impl Publication {
    pub fn publication_type(&self) -> PublicationType {
        match self {
            Publication::ResearchPaper(_) => PublicationType::ResearchPaper,
            Publication::ConferencePaper(_) => PublicationType::ConferencePaper,
            Publication::Book(_) => PublicationType::Book,
            Publication::BookChapter(_) => PublicationType::BookChapter,
        }
    }

    pub fn publication_date(&self) -> Option<NaiveDate> {
        match self {
            Publication::ResearchPaper(details) => details.publication_date,
            _ => None,
        }
    }
}

/// Input to the engine: one roster, its publication metadata and the
/// policy record in force.  When `policy` is omitted, front ends resolve
/// it through a [`crate::policy::PolicyLookup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub roster: Roster,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    pub publication: Publication,
}

/// Total incentive and points computed from the policy before
/// apportionment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub incentive: u64,
    pub points: u64,
    /// Human readable label for the rule that produced the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

impl Pool {
    pub fn new(incentive: u64, points: u64, basis: impl Into<String>) -> Self {
        Self {
            incentive,
            points,
            basis: Some(basis.into()),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.incentive == 0
    }
}

/// Incentive and points awarded to a single author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorAward {
    pub author: AuthorKey,
    pub incentive: u64,
    pub points: u64,
}

/// The result of a calculation for a whole roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub pool: Pool,
    /// One entry per author in roster order (submitter first).
    pub awards: Vec<AuthorAward>,
    pub total_incentive: u64,
    pub total_points: u64,
}

impl CalculationResult {
    pub fn new(pool: Pool, awards: Vec<AuthorAward>) -> Self {
        let total_incentive = awards.iter().map(|award| award.incentive).sum();
        let total_points = awards.iter().map(|award| award.points).sum();
        Self {
            pool,
            awards,
            total_incentive,
            total_points,
        }
    }

    /// A result awarding nothing to any author.
    pub fn zero<'a>(authors: impl IntoIterator<Item = &'a Author>) -> Self {
        let awards = authors
            .into_iter()
            .map(|author| AuthorAward {
                author: author.key(),
                incentive: 0,
                points: 0,
            })
            .collect();
        Self::new(Pool::zero(), awards)
    }

    pub fn award_for(&self, key: &AuthorKey) -> Option<&AuthorAward> {
        self.awards.iter().find(|award| &award.author == key)
    }
}
