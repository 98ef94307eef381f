//! Name-addressable per-SNP statistics: built-in statistics computed from
//! the current variant, user-defined arithmetic over those, and the
//! engine that evaluates and memoises both against a stream of variants.

pub mod arithmetic;
pub mod basics;
pub mod builtin;
pub mod engine;
pub mod hwe;
pub mod information;
pub mod likelihood;
pub mod value;
mod error;

pub use arithmetic::DerivedStatistic;
pub use builtin::{all as all_builtin_statistics, IDENTIFICATION_NAMES};
pub use basics::BasicSummary;
pub use engine::{Statistic, StatisticsEngine};
pub use error::StatisticsError;
pub use information::InformationVariant;
pub use value::{format_significant, Value};
