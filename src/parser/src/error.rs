use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("'--input' and '--output' must be given the same number of times ({inputs} vs {outputs})")]
    Cardinality{inputs: usize, outputs: usize},

    #[error("at least one '--input'/'--output' pair is required")]
    MissingInputs,

    #[error("{0} already exists. Use --force to overwrite.")]
    CannotOverwrite(String),

    #[error("conflicting options: {0}")]
    UsageConflict(String),

    #[error("invalid range '{0}': expected 'LOW-HIGH'")]
    InvalidRange(String),
}
