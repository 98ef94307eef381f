//! Boolean condition tree evaluated against either the per-variant
//! statistics engine or a sample-annotation row, with short-circuiting
//! `And`/`Or` composition and per-subcondition rejection-reason tracking.

pub mod condition;
pub mod env;
mod error;

pub use condition::{And, Condition, Evaluation, GreaterThan, InIdentifierList, InRange, LessThan, Not, Or, SampleNotExcluded, SnpIdMatches, Trivial};
pub use env::{ConditionEnv, SampleRowEnv};
pub use error::FilterError;
