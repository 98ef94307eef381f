use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Pattern '{0}' contains more than one wildcard character")]
    WildcardMismatch(String),

    #[error("Output template '{output}' disagrees with input pattern '{input}' on wildcard presence")]
    WildcardPresenceMismatch{input: String, output: String},

    #[error("Pattern '{0}' matched no filesystem entry")]
    NoMatch(String),

    #[error("Input list has {inputs} entries but output list has {outputs}")]
    Cardinality{inputs: usize, outputs: usize},

    #[error("Requested input index {0} is out of range")]
    InputIndexOutOfRange(usize),

    #[error("Requested output index {0} is out of range")]
    OutputIndexOutOfRange(usize),

    #[error("Failed to open '{0}': {1}")]
    OpenFile(PathBuf, #[source] std::io::Error),

    #[error("Source chain is exhausted")]
    ChainExhausted,

    #[error("Source chain has no children")]
    EmptyChain,

    #[error("Child sources disagree on sample count: {first} vs {other}")]
    SampleCountMismatch{first: usize, other: usize},

    #[error("Malformed row in '{path}' at line {line}: {reason}")]
    MalformedRow{path: PathBuf, line: usize, reason: String},

    #[error("Identifier-list file '{0}' could not be opened")]
    IdentifierListMissing(PathBuf),
}
