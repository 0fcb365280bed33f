//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! underwriting engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built applicants, clocks and configurations
//! - `builders`: Builder for applicant records with sensible defaults
//! - `assertions`: Custom assertion helpers for decisions and scores
//! - `generators`: Property-based applicant generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
