use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenotypeError {
    #[error("Sample index {index} is out of range (record carries {n_samples} samples)")]
    IndexOutOfRange{index: usize, n_samples: usize},

    #[error("filter_out_samples_by_index requires a sorted index set, but {0} appeared after {1}")]
    UnsortedIndexSet(usize, usize),

    #[error("Sample count mismatch: expected {expected}, got {got}")]
    SampleCountMismatch{expected: usize, got: usize},

    #[error("Genotype triple ({aa}, {ab}, {bb}) is invalid: components must lie in [0,1] and sum to at most 1 (within tolerance)")]
    InvalidTriple{aa: f64, ab: f64, bb: f64},

    #[error("Sample annotation row does not carry the mandatory id_1/id_2/missing columns")]
    MalformedSampleRow,

    #[error("Sample table schema mismatch between source and sink: {0}")]
    SchemaMismatch(String),
}
