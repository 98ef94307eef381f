//! The main streaming driver (C7): reads variants from a [`gqc_io::SourceChain`],
//! runs each through the [`statistics::StatisticsEngine`] and a [`filter::Condition`]
//! tree, and routes it to the kept/excluded [`gqc_io::SinkChain`]s and the
//! per-sample accumulator, before deriving and routing final sample statistics.

pub mod driver;
pub mod stats_sink;
mod error;

pub use driver::{Driver, DriverConfig, DriverOutput, SampleOutcome};
pub use error::PipelineError;
pub use stats_sink::{StatsSink, TextStatsSink};
