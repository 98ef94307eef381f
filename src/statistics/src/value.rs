use located_error::prelude::*;

use crate::error::StatisticsError;

/// A statistic's evaluated value: either of the two typed accessors the
/// statistics engine exposes (`double`, `string`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// # Errors
    /// `TypeMismatch` if this value is [`Value::Text`].
    pub fn as_f64(&self) -> anyhow::Result<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => Err(StatisticsError::TypeMismatch(s.clone())).loc("While reading a statistic as a number"),
        }
    }

    #[must_use]
    pub fn display(&self, significant_digits: usize) -> String {
        match self {
            Self::Number(n) => format_significant(*n, significant_digits),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Format `value` to `digits` significant figures, the convention the
/// statistics output file uses for every numeric column.
#[must_use]
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{value}");
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_significant_digits() {
        assert_eq!(format_significant(0.0065_8432, 5), "0.0065843");
        assert_eq!(format_significant(123.456_78, 5), "123.46");
    }

    #[test]
    fn numeric_accessor_rejects_text() {
        assert!(Value::Text("chr1".into()).as_f64().is_err());
        assert_eq!(Value::Number(1.5).as_f64().unwrap(), 1.5);
    }
}
