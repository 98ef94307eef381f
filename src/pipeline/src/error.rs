use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("the source chain's sample count ({source}) does not match the sample-annotation table's ({table})")]
    SampleCountMismatch{source: usize, table: usize},

    #[error("input index {input} has no corresponding output index in the filename mapper")]
    NoOutputForInput{input: usize},

    #[error("failed to create '{0}'")]
    OpenFile(PathBuf, #[source] std::io::Error),
}
