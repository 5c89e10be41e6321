//! Incentive Engine library crate.
//!
//! This crate computes the monetary incentive and academic points owed
//! to each author of a research contribution (research paper,
//! conference paper, book or book chapter) under the institution's
//! policy tables.  Applications may call
//! [`engine::IncentiveEngine::calculate`] directly or embed the HTTP API
//! via [`api::build_router`].

pub mod api;
pub mod calculators;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod models;
pub mod policy;
pub mod telemetry;
pub mod validation;

pub use calculators::EngineSettings;
pub use engine::{calculate, IncentiveEngine};
pub use models::{
    Author, AuthorAward, AuthorKey, CalculationRequest, CalculationResult, Pool, Publication,
    Roster,
};
pub use policy::{Policy, PolicyLookup, PolicyStore};
