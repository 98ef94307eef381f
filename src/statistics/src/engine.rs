use std::{cell::RefCell, collections::HashMap};

use genotype::{GenotypeTriple, Identification, VariantRecord};
use located_error::prelude::*;

use crate::{basics::BasicSummary, error::StatisticsError, value::Value};

/// A named, per-variant quantity derived from the engine's current state.
/// Implementations may read other registered statistics through
/// [`StatisticsEngine::value_of`] to build derived quantities.
pub trait Statistic {
    fn name(&self) -> &str;

    /// # Errors
    /// Whatever the statistic's own domain requires; typically
    /// [`StatisticsError::NoCurrentVariant`] if called before the first
    /// [`StatisticsEngine::process`].
    fn evaluate(&self, engine: &StatisticsEngine) -> anyhow::Result<Value>;
}

struct CurrentVariant {
    id: Identification,
    triples: Vec<GenotypeTriple>,
    basics: BasicSummary,
}

/// Name-addressable registry of per-variant statistics, evaluated lazily
/// and memoised for the variant currently loaded by [`Self::process`].
///
/// The memo cache is keyed by registration index rather than name (a
/// `Vec` slot lookup instead of a hash of the name on every access) and is
/// entirely invalidated each time a new variant is processed.
pub struct StatisticsEngine {
    statistics: Vec<Box<dyn Statistic>>,
    index_of: HashMap<String, usize>,
    current: Option<CurrentVariant>,
    cache: RefCell<HashMap<usize, Value>>,
    evaluating: RefCell<Vec<usize>>,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsEngine {
    #[must_use]
    pub fn new() -> Self {
        Self{
            statistics: Vec::new(),
            index_of: HashMap::new(),
            current: None,
            cache: RefCell::new(HashMap::new()),
            evaluating: RefCell::new(Vec::new()),
        }
    }

    /// # Errors
    /// `DuplicateStatistic` if a statistic under this name is already
    /// registered.
    pub fn register(&mut self, statistic: Box<dyn Statistic>) -> anyhow::Result<()> {
        let name = statistic.name().to_string();
        if self.index_of.contains_key(&name) {
            return Err(StatisticsError::DuplicateStatistic(name)).loc("While registering a statistic");
        }
        let index = self.statistics.len();
        self.index_of.insert(name, index);
        self.statistics.push(statistic);
        Ok(())
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.statistics.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.index_of.contains_key(name)
    }

    /// Load a new current variant, discarding every memoised value from
    /// the previous one.
    pub fn process(&mut self, variant: &VariantRecord) {
        let basics = BasicSummary::from_triples(variant.triples());
        self.current = Some(CurrentVariant{
            id: variant.id.clone(),
            triples: variant.triples().to_vec(),
            basics,
        });
        self.cache.borrow_mut().clear();
    }

    /// # Errors
    /// `NoCurrentVariant` if no variant has been loaded yet via [`Self::process`].
    pub fn current_id(&self) -> anyhow::Result<&Identification> {
        self.current.as_ref().map(|c| &c.id)
            .ok_or(StatisticsError::NoCurrentVariant).loc("While reading the current variant's identification")
    }

    /// # Errors
    /// `NoCurrentVariant` if no variant has been loaded yet via [`Self::process`].
    pub fn current_triples(&self) -> anyhow::Result<&[GenotypeTriple]> {
        self.current.as_ref().map(|c| c.triples.as_slice())
            .ok_or(StatisticsError::NoCurrentVariant).loc("While reading the current variant's genotype triples")
    }

    /// # Errors
    /// `NoCurrentVariant` if no variant has been loaded yet via [`Self::process`].
    pub fn current_basics(&self) -> anyhow::Result<&BasicSummary> {
        self.current.as_ref().map(|c| &c.basics)
            .ok_or(StatisticsError::NoCurrentVariant).loc("While reading the current variant's basic summary")
    }

    /// Evaluate (or retrieve the memoised value of) the named statistic
    /// against the current variant.
    ///
    /// # Errors
    /// `StatisticNotFound` if no such statistic is registered, a cyclical
    /// `MalformedArithmetic`-style dependency (a derived statistic that
    /// reads its own value while evaluating), or whatever the statistic's
    /// own evaluation raises.
    pub fn value_of(&self, name: &str) -> anyhow::Result<Value> {
        let index = *self.index_of.get(name)
            .ok_or_else(|| StatisticsError::StatisticNotFound(name.to_string())).loc("While looking up a statistic")?;

        if let Some(value) = self.cache.borrow().get(&index) {
            return Ok(value.clone());
        }
        if self.evaluating.borrow().contains(&index) {
            return Err(StatisticsError::MalformedArithmetic(format!("'{name}' depends on itself")))
                .loc("While evaluating a statistic");
        }

        self.evaluating.borrow_mut().push(index);
        let result = self.statistics[index].evaluate(self);
        self.evaluating.borrow_mut().pop();

        let value = result.with_loc(|| format!("While evaluating statistic '{name}'"))?;
        self.cache.borrow_mut().insert(index, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use genotype::{Allele, Chromosome, GenotypeTriple};

    use super::*;

    struct Constant(f64);
    impl Statistic for Constant {
        fn name(&self) -> &str { "constant" }
        fn evaluate(&self, _engine: &StatisticsEngine) -> anyhow::Result<Value> {
            Ok(Value::Number(self.0))
        }
    }

    struct CallCounter(RefCell<usize>);
    impl Statistic for CallCounter {
        fn name(&self) -> &str { "calls" }
        fn evaluate(&self, _engine: &StatisticsEngine) -> anyhow::Result<Value> {
            *self.0.borrow_mut() += 1;
            Ok(Value::Number(*self.0.borrow() as f64))
        }
    }

    struct SelfReferential;
    impl Statistic for SelfReferential {
        fn name(&self) -> &str { "loopy" }
        fn evaluate(&self, engine: &StatisticsEngine) -> anyhow::Result<Value> {
            engine.value_of("loopy")
        }
    }

    fn processed_engine() -> StatisticsEngine {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(Constant(42.0))).unwrap();
        let mut v = VariantRecord::new(1);
        v.id = Identification::new("s", "rs", Chromosome::Autosome(1), 1, Allele::A, Allele::G);
        v.triples_mut()[0] = GenotypeTriple::new(1.0, 0.0, 0.0);
        engine.process(&v);
        engine
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(Constant(1.0))).unwrap();
        assert!(engine.register(Box::new(Constant(2.0))).is_err());
    }

    #[test]
    fn lookup_before_processing_fails() {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(Constant(1.0))).unwrap();
        assert!(engine.current_id().is_err());
    }

    #[test]
    fn values_are_memoised_across_repeated_lookups() {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(CallCounter(RefCell::new(0)))).unwrap();
        let mut v = VariantRecord::new(1);
        v.id = Identification::default();
        engine.process(&v);
        assert_eq!(engine.value_of("calls").unwrap().as_f64().unwrap(), 1.0);
        assert_eq!(engine.value_of("calls").unwrap().as_f64().unwrap(), 1.0); // still 1: memoised
    }

    #[test]
    fn reprocessing_invalidates_the_cache() {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(CallCounter(RefCell::new(0)))).unwrap();
        let mut v = VariantRecord::new(1);
        v.id = Identification::default();
        engine.process(&v);
        engine.value_of("calls").unwrap();
        engine.process(&v);
        assert_eq!(engine.value_of("calls").unwrap().as_f64().unwrap(), 2.0);
    }

    #[test]
    fn unknown_statistic_is_an_error() {
        let engine = processed_engine();
        assert!(engine.value_of("nope").is_err());
    }

    #[test]
    fn self_referential_statistic_is_rejected_not_stack_overflowed() {
        let mut engine = StatisticsEngine::new();
        engine.register(Box::new(SelfReferential)).unwrap();
        let mut v = VariantRecord::new(1);
        v.id = Identification::default();
        engine.process(&v);
        assert!(engine.value_of("loopy").is_err());
    }
}
