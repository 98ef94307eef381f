use genotype::VariantRecord;
use located_error::prelude::*;

#[cfg(test)]
use mockall::automock;

use crate::error::IoError;

/// One backing variant stream. Implementations own whatever file handle or
/// buffer they read from; the chain only ever sees this interface.
///
/// `read_next` is pull-based rather than callback-driven: the caller passes
/// a record to populate and reads the boolean return to know whether a
/// variant was produced, instead of registering an observer the source
/// invokes mid-read.
#[cfg_attr(test, automock)]
pub trait SnpSource {
    fn n_samples(&self) -> usize;
    fn total_variants(&self) -> usize;

    /// Populate `record` with the next variant. Returns `Ok(false)` (leaving
    /// `record` unspecified) once the source is exhausted.
    fn read_next(&mut self, record: &mut VariantRecord) -> anyhow::Result<bool>;
}

/// Result of one [`SourceChain::read_next`] call: whether a variant was
/// produced, and whether reading it crossed into a new child source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    pub has_more: bool,
    pub source_changed: bool,
}

/// Concatenates several [`SnpSource`]s into one logical stream.
///
/// All children must declare the same sample count; the chain advances to
/// the next child transparently once the current one is exhausted, and
/// reports the crossing via [`ReadOutcome::source_changed`] so the driver can
/// roll the sink chain in lockstep (§4.6 of the input/output correspondence).
#[derive(Default)]
pub struct SourceChain {
    children: Vec<Box<dyn SnpSource>>,
    current: usize,
    read_per_child: Vec<usize>,
    n_samples: Option<usize>,
}

impl SourceChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child source.
    ///
    /// # Errors
    /// `SampleCountMismatch` if its sample count disagrees with earlier children.
    pub fn add_source(&mut self, source: Box<dyn SnpSource>) -> anyhow::Result<()> {
        let n = source.n_samples();
        match self.n_samples {
            None => self.n_samples = Some(n),
            Some(expected) if expected != n => {
                return Err(IoError::SampleCountMismatch{first: expected, other: n})
                    .loc("While adding a child to the source chain");
            }
            Some(_) => {}
        }
        self.children.push(source);
        self.read_per_child.push(0);
        Ok(())
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples.unwrap_or(0)
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn total_variants(&self) -> usize {
        self.children.iter().map(|c| c.total_variants()).sum()
    }

    #[must_use]
    pub fn current_child_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_within_child_index(&self) -> usize {
        self.read_per_child.get(self.current).copied().unwrap_or(0)
    }

    /// Pull the next variant, crossing child boundaries transparently.
    ///
    /// # Errors
    /// Propagates the first I/O or format error raised by any child verbatim
    /// (fail-fast: no retry, no skipping).
    pub fn read_next(&mut self, record: &mut VariantRecord) -> anyhow::Result<ReadOutcome> {
        let mut source_changed = false;
        loop {
            let Some(child) = self.children.get_mut(self.current) else {
                return Ok(ReadOutcome{has_more: false, source_changed});
            };
            if child.read_next(record).loc("While reading the next variant from the source chain")? {
                self.read_per_child[self.current] += 1;
                return Ok(ReadOutcome{has_more: true, source_changed});
            }
            self.current += 1;
            source_changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_source(n_samples: usize, variants: usize) -> MockSnpSource {
        let mut mock = MockSnpSource::new();
        mock.expect_n_samples().return_const(n_samples);
        mock.expect_total_variants().return_const(variants);
        let mut remaining = variants;
        mock.expect_read_next().returning(move |_record| {
            if remaining == 0 {
                Ok(false)
            } else {
                remaining -= 1;
                Ok(true)
            }
        });
        mock
    }

    #[test]
    fn reads_through_a_single_child() {
        let mut chain = SourceChain::new();
        chain.add_source(Box::new(mock_source(3, 2))).unwrap();
        let mut record = VariantRecord::new(3);

        let first = chain.read_next(&mut record).unwrap();
        assert!(first.has_more && !first.source_changed);
        let second = chain.read_next(&mut record).unwrap();
        assert!(second.has_more && !second.source_changed);
        let third = chain.read_next(&mut record).unwrap();
        assert!(!third.has_more);
    }

    #[test]
    fn crossing_a_child_boundary_flags_source_changed() {
        let mut chain = SourceChain::new();
        chain.add_source(Box::new(mock_source(2, 1))).unwrap();
        chain.add_source(Box::new(mock_source(2, 1))).unwrap();
        let mut record = VariantRecord::new(2);

        let first = chain.read_next(&mut record).unwrap();
        assert!(first.has_more && !first.source_changed);
        assert_eq!(chain.current_child_index(), 0);

        let second = chain.read_next(&mut record).unwrap();
        assert!(second.has_more && second.source_changed);
        assert_eq!(chain.current_child_index(), 1);
    }

    #[test]
    fn mismatched_sample_counts_are_rejected() {
        let mut chain = SourceChain::new();
        chain.add_source(Box::new(mock_source(2, 1))).unwrap();
        assert!(chain.add_source(Box::new(mock_source(3, 1))).is_err());
    }

    #[test]
    fn empty_chain_reports_no_more() {
        let mut chain = SourceChain::new();
        let mut record = VariantRecord::new(0);
        assert!(!chain.read_next(&mut record).unwrap().has_more);
    }
}
