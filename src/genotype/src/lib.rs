//! Core data model for streaming genotype-imputation QC: the per-variant
//! genotype-probability record, the sample annotation table, and the
//! per-sample accumulator that derives sample-level statistics from it.

pub mod allele;
pub mod chromosome;
pub mod triple;
pub mod variant;
pub mod sample_row;
pub mod accumulator;
mod error;

pub use allele::Allele;
pub use chromosome::Chromosome;
pub use triple::GenotypeTriple;
pub use variant::{Variant, VariantRecord, BorrowedVariant, Identification, TripleStorage};
pub use sample_row::{ColumnKind, SampleRow, SampleTable};
pub use accumulator::{SampleAccumulator, SampleStats};
pub use error::GenotypeError;
