use located_error::prelude::*;

use crate::env::ConditionEnv;

/// The outcome of evaluating a condition: whether it was satisfied, and
/// (when it was not) the description of every subcondition that failed
/// and was actually evaluated before the compound condition short-circuited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub satisfied: bool,
    pub failed: Vec<String>,
}

impl Evaluation {
    #[must_use]
    fn pass() -> Self {
        Self{satisfied: true, failed: Vec::new()}
    }

    fn fail(reason: String) -> Self {
        Self{satisfied: false, failed: vec![reason]}
    }
}

/// A boolean predicate over a [`ConditionEnv`] (a variant's statistics, or
/// a sample row), composable with [`And`], [`Or`] and [`Not`].
pub trait Condition {
    /// # Errors
    /// Whatever the environment's lookup raises for names this condition
    /// references.
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation>;

    fn describe(&self) -> String;
}

/// Always satisfied; the default when no filter is configured.
pub struct Trivial;

impl Condition for Trivial {
    fn evaluate(&self, _env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        Ok(Evaluation::pass())
    }

    fn describe(&self) -> String {
        "trivial".to_string()
    }
}

/// `value in [lower, upper]`, both bounds inclusive once shifted down by
/// `epsilon` (the original tool's "subtract epsilon from every threshold"
/// quirk, preserved here and defaulting to `0.0`).
pub struct InRange {
    name: String,
    lower: f64,
    upper: f64,
    inclusive: bool,
    epsilon: f64,
}

impl InRange {
    #[must_use]
    pub fn inclusive(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self{name: name.into(), lower, upper, inclusive: true, epsilon: 0.0}
    }

    #[must_use]
    pub fn exclusive(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self{name: name.into(), lower, upper, inclusive: false, epsilon: 0.0}
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Condition for InRange {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let value = env.lookup(&self.name).with_loc(|| format!("While evaluating {}", self.describe()))?.as_f64()?;
        let lower = self.lower - self.epsilon;
        let upper = self.upper - self.epsilon;
        let satisfied = if self.inclusive {
            value >= lower && value <= upper
        } else {
            value > lower && value < upper
        };
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        let (open, close) = if self.inclusive { ('[', ']') } else { ('(', ')') };
        format!("{} in {open}{},{}{close}", self.name, self.lower, self.upper)
    }
}

/// `value > lower`, shifted down by `epsilon`.
pub struct GreaterThan {
    name: String,
    lower: f64,
    epsilon: f64,
}

impl GreaterThan {
    #[must_use]
    pub fn new(name: impl Into<String>, lower: f64) -> Self {
        Self{name: name.into(), lower, epsilon: 0.0}
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Condition for GreaterThan {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let value = env.lookup(&self.name).with_loc(|| format!("While evaluating {}", self.describe()))?.as_f64()?;
        let satisfied = value > self.lower - self.epsilon;
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        format!("{} > {}", self.name, self.lower)
    }
}

/// `value < upper`, shifted down by `epsilon`.
pub struct LessThan {
    name: String,
    upper: f64,
    epsilon: f64,
}

impl LessThan {
    #[must_use]
    pub fn new(name: impl Into<String>, upper: f64) -> Self {
        Self{name: name.into(), upper, epsilon: 0.0}
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Condition for LessThan {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let value = env.lookup(&self.name).with_loc(|| format!("While evaluating {}", self.describe()))?.as_f64()?;
        let satisfied = value < self.upper - self.epsilon;
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        format!("{} < {}", self.name, self.upper)
    }
}

/// Satisfied when the candidate's SNP-id, RS-id, or position (rendered as
/// a decimal string) appears in a fixed identifier set, loaded eagerly at
/// construction time.
pub struct InIdentifierList {
    ids: std::collections::HashSet<String>,
}

impl InIdentifierList {
    #[must_use]
    pub fn new(ids: std::collections::HashSet<String>) -> Self {
        Self{ids}
    }
}

impl Condition for InIdentifierList {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let snp_id = env.lookup("SNPID").with_loc(|| format!("While evaluating {}", self.describe()))?.display(17);
        let rs_id = env.lookup("RSID").with_loc(|| format!("While evaluating {}", self.describe()))?.display(17);
        let position = env.lookup("position").with_loc(|| format!("While evaluating {}", self.describe()))?;
        let position = decimal_string(&position);

        let satisfied = self.ids.contains(&snp_id) || self.ids.contains(&rs_id) || self.ids.contains(&position);
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        format!("in-list({} entries)", self.ids.len())
    }
}

/// Render a statistic value the way an identifier-list membership test
/// compares against it: whole numbers (positions) without a decimal point.
fn decimal_string(value: &statistics::Value) -> String {
    match value {
        statistics::Value::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
        other => other.display(17),
    }
}

/// Satisfied when the SNP identifier matches a single-`*`-wildcard prefix/
/// suffix expression, e.g. `"rs1*23"`.
pub struct SnpIdMatches {
    expression: String,
    prefix: String,
    suffix: String,
}

impl SnpIdMatches {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let (prefix, suffix) = match expression.find('*') {
            Some(pos) => (expression[..pos].to_string(), expression[pos + 1..].to_string()),
            None => (expression.clone(), String::new()),
        };
        Self{expression, prefix, suffix}
    }
}

impl Condition for SnpIdMatches {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let value = env.lookup("SNPID").with_loc(|| format!("While evaluating {}", self.describe()))?;
        let snp_id = value.display(17);
        let satisfied = snp_id.starts_with(&self.prefix) && snp_id.ends_with(&self.suffix)
            && snp_id.len() >= self.prefix.len() + self.suffix.len();
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        format!("SNPID-matches({})", self.expression)
    }
}

/// Satisfied when neither `id_1` nor `id_2` of a sample row appears in a
/// fixed identifier set, loaded eagerly at construction time. The sample-row
/// equivalent of [`InIdentifierList`], which only ever looks up SNP-level
/// fields.
pub struct SampleNotExcluded {
    ids: std::collections::HashSet<String>,
}

impl SampleNotExcluded {
    #[must_use]
    pub fn new(ids: std::collections::HashSet<String>) -> Self {
        Self{ids}
    }
}

impl Condition for SampleNotExcluded {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let id1 = env.lookup("id_1").with_loc(|| format!("While evaluating {}", self.describe()))?.display(17);
        let id2 = env.lookup("id_2").with_loc(|| format!("While evaluating {}", self.describe()))?.display(17);
        let satisfied = !self.ids.contains(&id1) && !self.ids.contains(&id2);
        Ok(if satisfied { Evaluation::pass() } else { Evaluation::fail(self.describe()) })
    }

    fn describe(&self) -> String {
        format!("sample-not-excluded({} entries)", self.ids.len())
    }
}

/// Conjunction: satisfied only if every child is; short-circuits (and
/// reports only) at the first unsatisfied child.
pub struct And(pub Vec<Box<dyn Condition>>);

impl Condition for And {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        for child in &self.0 {
            let result = child.evaluate(env)?;
            if !result.satisfied {
                return Ok(result);
            }
        }
        Ok(Evaluation::pass())
    }

    fn describe(&self) -> String {
        self.0.iter().map(|c| c.describe()).collect::<Vec<_>>().join(" && ")
    }
}

/// Disjunction: satisfied if any child is; short-circuits at the first
/// satisfied child, accumulating the failure reasons of every child tried
/// before it.
pub struct Or(pub Vec<Box<dyn Condition>>);

impl Condition for Or {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let mut failed = Vec::new();
        for child in &self.0 {
            let result = child.evaluate(env)?;
            if result.satisfied {
                return Ok(Evaluation::pass());
            }
            failed.extend(result.failed);
        }
        Ok(Evaluation{satisfied: false, failed})
    }

    fn describe(&self) -> String {
        self.0.iter().map(|c| c.describe()).collect::<Vec<_>>().join(" || ")
    }
}

/// Negation of a single child condition.
pub struct Not(pub Box<dyn Condition>);

impl Condition for Not {
    fn evaluate(&self, env: &dyn ConditionEnv) -> anyhow::Result<Evaluation> {
        let result = self.0.evaluate(env)?;
        Ok(if result.satisfied {
            Evaluation::fail(format!("!{}", self.0.describe()))
        } else {
            Evaluation::pass()
        })
    }

    fn describe(&self) -> String {
        format!("!({})", self.0.describe())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use genotype::{Allele, Chromosome, Identification, VariantRecord};
    use statistics::StatisticsEngine;

    use super::*;

    fn engine_with(snp_id: &str) -> StatisticsEngine {
        let mut engine = StatisticsEngine::new();
        for b in statistics::all_builtin_statistics() {
            engine.register(b).unwrap();
        }
        let mut v = VariantRecord::new(2);
        v.id = Identification::new(snp_id, "rs1", Chromosome::Autosome(1), 1, Allele::A, Allele::G);
        engine.process(&v);
        engine
    }

    #[test]
    fn trivial_always_passes() {
        let engine = engine_with("snp");
        assert!(Trivial.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn range_respects_inclusivity() {
        let engine = engine_with("snp");
        let cond = InRange::inclusive("position", 1.0, 1.0);
        assert!(cond.evaluate(&engine).unwrap().satisfied);
        let cond = InRange::exclusive("position", 1.0, 1.0);
        assert!(!cond.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn and_short_circuits_on_first_failure() {
        let engine = engine_with("snp");
        let cond = And(vec![
            Box::new(GreaterThan::new("position", 100.0)), // fails first
            Box::new(Trivial),
        ]);
        let result = cond.evaluate(&engine).unwrap();
        assert!(!result.satisfied);
        assert_eq!(result.failed.len(), 1);
    }

    #[test]
    fn or_collects_reasons_until_a_pass() {
        let engine = engine_with("snp");
        let cond = Or(vec![
            Box::new(GreaterThan::new("position", 100.0)),
            Box::new(LessThan::new("position", 100.0)),
        ]);
        let result = cond.evaluate(&engine).unwrap();
        assert!(result.satisfied);
    }

    #[test]
    fn or_reports_every_failure_when_none_pass() {
        let engine = engine_with("snp");
        let cond = Or(vec![
            Box::new(GreaterThan::new("position", 100.0)),
            Box::new(LessThan::new("position", 1.0)),
        ]);
        let result = cond.evaluate(&engine).unwrap();
        assert!(!result.satisfied);
        assert_eq!(result.failed.len(), 2);
    }

    #[test]
    fn not_inverts() {
        let engine = engine_with("snp");
        let cond = Not(Box::new(GreaterThan::new("position", 100.0)));
        assert!(cond.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn snp_id_matches_wildcard_prefix_and_suffix() {
        let engine = engine_with("rs100923");
        let cond = SnpIdMatches::new("rs1*23");
        assert!(cond.evaluate(&engine).unwrap().satisfied);
        let cond = SnpIdMatches::new("rs9*");
        assert!(!cond.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn identifier_list_checks_membership() {
        let engine = engine_with("snp-keep");
        let mut ids = HashSet::new();
        ids.insert("snp-keep".to_string());
        let cond = InIdentifierList::new(ids);
        assert!(cond.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn identifier_list_matches_position_as_a_decimal_string() {
        let engine = engine_with("snp-other");
        let mut ids = HashSet::new();
        ids.insert("1".to_string());
        let cond = InIdentifierList::new(ids);
        assert!(cond.evaluate(&engine).unwrap().satisfied);
    }

    #[test]
    fn sample_not_excluded_checks_either_id_column() {
        use genotype::SampleRow;
        use crate::env::SampleRowEnv;

        let columns = vec!["id_1".to_string(), "id_2".to_string(), "missing".to_string()];
        let mut ids = HashSet::new();
        ids.insert("S2".to_string());

        let cond = SampleNotExcluded::new(ids);

        let row = SampleRow::new(vec!["S1".into(), "S1".into(), "0".into()]);
        let env = SampleRowEnv::new(&columns, &row);
        assert!(cond.evaluate(&env).unwrap().satisfied);

        let row = SampleRow::new(vec!["S2".into(), "S2".into(), "0".into()]);
        let env = SampleRowEnv::new(&columns, &row);
        assert!(!cond.evaluate(&env).unwrap().satisfied);
    }
}
