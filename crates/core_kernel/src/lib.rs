//! Core Kernel - Foundational types shared by the underwriting crates
//!
//! This crate provides the small set of building blocks every other crate uses:
//! - Strongly-typed identifiers for decisions and evaluation runs
//! - A clock abstraction so evaluations stay reproducible under test

pub mod identifiers;
pub mod clock;

pub use identifiers::{DecisionId, BatchId};
pub use clock::{Clock, SystemClock, FixedClock};
