use genotype::SampleRow;
use located_error::prelude::*;
use statistics::{StatisticsEngine, Value};

use crate::error::FilterError;

/// Abstracts over what a condition is evaluated against: the per-variant
/// statistics engine, or a single sample-annotation row. Conditions are
/// written once against this trait and apply to either environment.
pub trait ConditionEnv {
    /// # Errors
    /// Whatever the concrete environment's lookup raises (an unknown
    /// statistic name, an unknown column name, ...).
    fn lookup(&self, name: &str) -> anyhow::Result<Value>;
}

impl ConditionEnv for StatisticsEngine {
    fn lookup(&self, name: &str) -> anyhow::Result<Value> {
        self.value_of(name)
    }
}

/// A [`ConditionEnv`] over one row of a sample annotation table, addressed
/// by column name; numeric-looking fields parse as [`Value::Number`], all
/// others stay [`Value::Text`].
pub struct SampleRowEnv<'a> {
    columns: &'a [String],
    row: &'a SampleRow,
}

impl<'a> SampleRowEnv<'a> {
    #[must_use]
    pub fn new(columns: &'a [String], row: &'a SampleRow) -> Self {
        Self{columns, row}
    }
}

impl ConditionEnv for SampleRowEnv<'_> {
    fn lookup(&self, name: &str) -> anyhow::Result<Value> {
        let index = self.columns.iter().position(|c| c == name)
            .ok_or_else(|| FilterError::MalformedSpec(format!("no such sample column '{name}'")))
            .loc("While looking up a sample-row field")?;
        let raw = self.row.get(index)
            .ok_or_else(|| FilterError::MalformedSpec(format!("sample row is missing column '{name}'")))
            .loc("While looking up a sample-row field")?;
        Ok(match raw.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        })
    }
}
