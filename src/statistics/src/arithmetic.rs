use located_error::prelude::*;

use crate::{
    engine::{Statistic, StatisticsEngine},
    error::StatisticsError,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op { Div, Mul, Add, Sub }

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(f64),
    Reference(String),
    BinOp(Op, Box<Expr>, Box<Expr>),
}

/// Split order preserved from the original statistic-arithmetic evaluator:
/// the expression is scanned left to right for a `/`, then (if none) a
/// `*`, then a `+`, then a `-`; the first operator found anywhere in the
/// string splits the expression there, regardless of where it sits
/// relative to other operators. This is not conventional operator
/// precedence - `"1+2/3"` parses as `(1+2)/3`, because `/` is searched
/// for first across the whole string.
const SPLIT_ORDER: [(char, Op); 4] = [('/', Op::Div), ('*', Op::Mul), ('+', Op::Add), ('-', Op::Sub)];

fn parse(expr: &str) -> anyhow::Result<Expr> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(StatisticsError::MalformedArithmetic("empty sub-expression".into())).loc("While parsing a statistic expression");
    }

    for (ch, op) in SPLIT_ORDER {
        if let Some(idx) = trimmed.find(ch) {
            let (left, right) = trimmed.split_at(idx);
            let right = &right[ch.len_utf8()..];
            let left_expr = parse(left)?;
            let right_expr = parse(right)?;
            return Ok(Expr::BinOp(op, Box::new(left_expr), Box::new(right_expr)));
        }
    }

    parse_atom(trimmed)
}

fn parse_atom(token: &str) -> anyhow::Result<Expr> {
    if let Ok(n) = token.parse::<f64>() {
        return Ok(Expr::Literal(n));
    }
    Ok(Expr::Reference(token.to_string()))
}

fn eval(expr: &Expr, engine: &StatisticsEngine) -> anyhow::Result<f64> {
    match expr {
        Expr::Literal(n) => Ok(*n),
        Expr::Reference(name) => engine.value_of(name)?.as_f64(),
        Expr::BinOp(op, left, right) => {
            let l = eval(left, engine)?;
            let r = eval(right, engine)?;
            Ok(match op {
                Op::Div => l / r,
                Op::Mul => l * r,
                Op::Add => l + r,
                Op::Sub => l - r,
            })
        }
    }
}

/// A statistic whose value is computed from an arithmetic expression over
/// other registered statistics (and numeric literals), e.g. `"AB/missing"`.
pub struct DerivedStatistic {
    name: String,
    expr: Expr,
}

impl DerivedStatistic {
    /// # Errors
    /// `MalformedArithmetic` if `expression` cannot be parsed.
    pub fn new(name: impl Into<String>, expression: &str) -> anyhow::Result<Self> {
        let expr = parse(expression).with_loc(|| format!("While parsing derived statistic expression '{expression}'"))?;
        Ok(Self{name: name.into(), expr})
    }
}

impl Statistic for DerivedStatistic {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, engine: &StatisticsEngine) -> anyhow::Result<Value> {
        Ok(Value::Number(eval(&self.expr, engine)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StatisticsEngine;

    struct Constant(&'static str, f64);
    impl Statistic for Constant {
        fn name(&self) -> &str { self.0 }
        fn evaluate(&self, _engine: &StatisticsEngine) -> anyhow::Result<Value> { Ok(Value::Number(self.1)) }
    }

    fn engine_with_constants() -> StatisticsEngine {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(Constant("AB", 10.0))).unwrap();
        engine.register(Box::new(Constant("missing", 5.0))).unwrap();
        let mut v = genotype::VariantRecord::new(0);
        v.id = genotype::Identification::default();
        engine.process(&v);
        engine
    }

    #[test]
    fn plain_literal_arithmetic() {
        let engine = engine_with_constants();
        let stat = DerivedStatistic::new("d", "1+2").unwrap();
        assert_eq!(eval(&stat.expr, &engine).unwrap(), 3.0);
    }

    #[test]
    fn division_is_searched_for_first_regardless_of_position() {
        let engine = engine_with_constants();
        let stat = DerivedStatistic::new("d", "1+2/3").unwrap();
        // Parses as (1+2)/3 = 1.0, not 1 + 2/3 = 1.666..., preserving the
        // quirky left-to-right-by-operator-priority split order.
        assert!((eval(&stat.expr, &engine).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn references_other_statistics_by_name() {
        let engine = engine_with_constants();
        let stat = DerivedStatistic::new("ratio", "AB/missing").unwrap();
        assert_eq!(stat.evaluate(&engine).unwrap().as_f64().unwrap(), 2.0);
    }

    #[test]
    fn empty_expression_is_rejected() {
        assert!(DerivedStatistic::new("d", "").is_err());
    }

    #[test]
    fn dangling_operator_is_rejected() {
        assert!(DerivedStatistic::new("d", "AB+").is_err());
    }
}
