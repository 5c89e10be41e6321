//! Property tests over randomly generated rosters and policies.

use chrono::NaiveDate;
use incentive_engine::models::{
    Author, AuthorPosition, AuthorRole, BookDetails, BookIndexing, BookPublicationKind,
    ConferencePaperDetails, ConferenceSubType, ExternalSubType, IndexingCategory, InternalSubType,
    Publication, PublicationScope, Quartile, ResearchPaperDetails, Roster,
};
use incentive_engine::policy::{
    Bonus, BookIndexingBonuses, BookPolicy, ConferencePolicy, Policy, QuartileIncentive,
    ResearchPaperPolicy,
};
use incentive_engine::IncentiveEngine;
use proptest::prelude::*;

// -- Strategy helpers --

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn arb_role() -> impl Strategy<Value = AuthorRole> {
    prop_oneof![
        Just(AuthorRole::First),
        Just(AuthorRole::Corresponding),
        Just(AuthorRole::FirstAndCorresponding),
        Just(AuthorRole::CoAuthor),
    ]
}

fn arb_position() -> impl Strategy<Value = Option<AuthorPosition>> {
    prop_oneof![
        Just(None),
        (1u8..=5).prop_map(|rank| Some(AuthorPosition::Rank(rank))),
        Just(Some(AuthorPosition::SixPlus)),
    ]
}

/// Author identity without a paper position; the roster strategy
/// numbers authors afterwards.
#[derive(Debug, Clone)]
enum Kind {
    Faculty,
    Student,
    External(ExternalSubType),
}

fn arb_kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Faculty),
        Just(Kind::Student),
        Just(Kind::External(ExternalSubType::Academic)),
        Just(Kind::External(ExternalSubType::Industry)),
        Just(Kind::External(ExternalSubType::InternationalAuthor)),
    ]
}

fn build_author(
    index: usize,
    kind: Kind,
    role: AuthorRole,
    position: Option<AuthorPosition>,
) -> Author {
    let paper_position = index as u32 + 1;
    let author = match kind {
        Kind::Faculty => Author::internal(
            format!("fac-{index}"),
            InternalSubType::Faculty,
            role,
            paper_position,
        ),
        Kind::Student => Author::internal(
            format!("stu-{index}"),
            InternalSubType::Student,
            role,
            paper_position,
        ),
        Kind::External(sub_type) => {
            Author::external(format!("ext-{index}"), sub_type, role, paper_position)
        }
    };
    match position {
        Some(position) => author.at_position(position),
        None => author,
    }
}

fn arb_roster() -> impl Strategy<Value = Roster> {
    prop::collection::vec((arb_kind(), arb_role(), arb_position()), 1..9).prop_map(|entries| {
        let mut authors: Vec<Author> = entries
            .into_iter()
            .enumerate()
            .map(|(index, (kind, role, position))| build_author(index, kind, role, position))
            .collect();
        let submitter = authors.remove(0);
        Roster::new(submitter, authors)
    })
}

/// One internal faculty submitter at position one, followed only by
/// external collaborators.
fn arb_single_internal_roster() -> impl Strategy<Value = Roster> {
    (
        arb_role(),
        prop::collection::vec(
            (
                prop_oneof![
                    Just(ExternalSubType::Academic),
                    Just(ExternalSubType::Industry),
                    Just(ExternalSubType::InternationalAuthor),
                ],
                arb_role(),
            ),
            0..6,
        ),
    )
        .prop_map(|(role, externals)| {
            let submitter = Author::internal("me", InternalSubType::Faculty, role, 1)
                .at_position(AuthorPosition::Rank(1));
            let co_authors = externals
                .into_iter()
                .enumerate()
                .map(|(index, (sub_type, role))| {
                    Author::external(format!("ext-{index}"), sub_type, role, index as u32 + 2)
                })
                .collect();
            Roster::new(submitter, co_authors)
        })
}

fn arb_amount() -> impl Strategy<Value = (u64, u64)> {
    (1u64..=200_000, 0u64..=100)
}

/// A policy and publication pair that always prices to a non-empty pool.
fn arb_priced_case() -> impl Strategy<Value = (Policy, Publication)> {
    let research = (arb_amount(), any::<bool>()).prop_map(|((amount, points), by_position)| {
        let policy = Policy::ResearchPaper(ResearchPaperPolicy {
            distribution_method: by_position.then(|| "position_based".to_string()),
            quartile_incentives: vec![QuartileIncentive {
                quartile: Quartile::Q2,
                incentive_amount: amount,
                points,
            }],
            effective_from: Some(date(2025, 1, 1)),
            ..ResearchPaperPolicy::default()
        });
        let publication = Publication::ResearchPaper(ResearchPaperDetails {
            publication_date: Some(date(2025, 8, 1)),
            indexing_categories: vec![IndexingCategory::Scopus],
            quartile: Some(Quartile::Q2),
            ..ResearchPaperDetails::default()
        });
        (policy, publication)
    });

    let conference = (
        arb_amount(),
        prop_oneof![
            Just(ConferenceSubType::ScopusIndexedProceedings),
            Just(ConferenceSubType::PaperNotIndexed),
            Just(ConferenceSubType::KeynoteInvitedTalk),
            Just(ConferenceSubType::OrganizerCoordinator),
        ],
        any::<bool>(),
    )
        .prop_map(|((amount, points), sub_type, best_paper_award)| {
            let policy = Policy::ConferencePaper(ConferencePolicy {
                sub_type: Some(sub_type),
                quartile_incentives: vec![QuartileIncentive {
                    quartile: Quartile::Q1,
                    incentive_amount: amount,
                    points,
                }],
                flat_incentive_amount: amount,
                flat_points: points,
                best_paper_award_bonus: Some(Bonus {
                    incentive_amount: 1_000,
                    points: 1,
                }),
                ..ConferencePolicy::default()
            });
            let publication = Publication::ConferencePaper(ConferencePaperDetails {
                sub_type,
                proceedings_quartile: Some(Quartile::Q1),
                scope: Some(PublicationScope::National),
                is_presenter: Some(true),
                best_paper_award,
            });
            (policy, publication)
        });

    let book = (arb_amount(), any::<bool>(), any::<bool>()).prop_map(
        |((amount, points), chapter, international)| {
            let policy = BookPolicy {
                authored_incentive_amount: amount,
                authored_points: points,
                indexing_bonuses: BookIndexingBonuses {
                    scopus_indexed: Some(Bonus {
                        incentive_amount: 2_500,
                        points: 2,
                    }),
                    sgt_publication_house: None,
                },
                international_bonus: Some(Bonus {
                    incentive_amount: 1_500,
                    points: 0,
                }),
                ..BookPolicy::default()
            };
            let details = BookDetails {
                publication_kind: BookPublicationKind::Authored,
                indexing: Some(BookIndexing::ScopusIndexed),
                scope: international.then_some(PublicationScope::International),
            };
            if chapter {
                (Policy::BookChapter(policy), Publication::BookChapter(details))
            } else {
                (Policy::Book(policy), Publication::Book(details))
            }
        },
    );

    prop_oneof![research, conference, book]
}

proptest! {
    /// Floor rounding and forfeited shares may leave money unpaid, but
    /// awards never exceed the pool.
    #[test]
    fn awards_never_exceed_the_pool(roster in arb_roster(), (policy, publication) in arb_priced_case()) {
        let result = IncentiveEngine::default().calculate(&roster, Some(&policy), &publication);
        prop_assert!(result.total_incentive <= result.pool.incentive);
        prop_assert!(result.total_points <= result.pool.points);
        prop_assert_eq!(result.awards.len(), roster.len());
    }

    #[test]
    fn external_authors_earn_nothing(roster in arb_roster(), (policy, publication) in arb_priced_case()) {
        let result = IncentiveEngine::default().calculate(&roster, Some(&policy), &publication);
        for (author, award) in roster.authors().zip(&result.awards) {
            if !author.is_internal() {
                prop_assert_eq!((award.incentive, award.points), (0, 0));
            }
        }
    }

    #[test]
    fn students_earn_no_points(roster in arb_roster(), (policy, publication) in arb_priced_case()) {
        let result = IncentiveEngine::default().calculate(&roster, Some(&policy), &publication);
        for (author, award) in roster.authors().zip(&result.awards) {
            if author.is_student() {
                prop_assert_eq!(award.points, 0);
            }
        }
    }

    #[test]
    fn lone_internal_author_takes_the_whole_pool(
        roster in arb_single_internal_roster(),
        (policy, publication) in arb_priced_case()
    ) {
        let result = IncentiveEngine::default().calculate(&roster, Some(&policy), &publication);
        prop_assert!(!result.pool.is_empty());
        let submitter = &result.awards[0];
        prop_assert_eq!(submitter.incentive, result.pool.incentive);
        prop_assert_eq!(submitter.points, result.pool.points);
    }

    #[test]
    fn missing_policy_pays_nothing(roster in arb_roster(), (_, publication) in arb_priced_case()) {
        let result = IncentiveEngine::default().calculate(&roster, None, &publication);
        prop_assert_eq!(result.total_incentive, 0);
        prop_assert_eq!(result.total_points, 0);
    }
}
