use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatisticsError {
    #[error("Statistic '{0}' is registered more than once")]
    DuplicateStatistic(String),

    #[error("No statistic named '{0}' is registered")]
    StatisticNotFound(String),

    #[error("Domain error while evaluating a statistic: {0}")]
    DomainError(String),

    #[error("Statistic '{0}' does not support that accessor type")]
    TypeMismatch(String),

    #[error("No variant has been processed yet")]
    NoCurrentVariant,

    #[error("Arithmetic expression '{0}' is malformed")]
    MalformedArithmetic(String),
}
