use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("malformed condition spec \"{0}\"")]
    MalformedSpec(String),

    #[error("condition spec \"{0}\" requires an inclusive [a,b] or exclusive (a,b) range")]
    MalformedRange(String),

    #[error("condition only evaluates against a sample row, not a variant")]
    NotASampleCondition,

    #[error("condition only evaluates against a variant, not a sample row")]
    NotAVariantCondition,
}
