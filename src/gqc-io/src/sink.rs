use genotype::VariantRecord;
use located_error::prelude::*;

#[cfg(test)]
use mockall::automock;

use crate::error::IoError;

/// One backing variant destination.
#[cfg_attr(test, automock)]
pub trait SnpSink {
    fn write_variant(&mut self, variant: &VariantRecord) -> anyhow::Result<()>;
    fn variants_written(&self) -> usize;
}

/// Mirrors [`crate::SourceChain`] on the write side: an ordered list of
/// sinks, with the active one advanced explicitly by the driver whenever the
/// source chain reports a child-boundary crossing whose target output index
/// differs from the current one (§4.6).
#[derive(Default)]
pub struct SinkChain {
    children: Vec<Box<dyn SnpSink>>,
    current: usize,
}

impl SinkChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn SnpSink>) {
        self.children.push(sink);
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn current_child(&self) -> usize {
        self.current
    }

    /// Switch the active sink to the next one in the list.
    ///
    /// # Errors
    /// Fails if already at the last sink.
    pub fn advance(&mut self) -> anyhow::Result<()> {
        if self.current + 1 >= self.children.len() {
            return Err(IoError::OutputIndexOutOfRange(self.current + 1)).loc("While advancing the sink chain");
        }
        self.current += 1;
        Ok(())
    }

    /// Jump directly to output index `j`, as computed by the filename
    /// mapper's `output_index_of`. Used on setup and whenever the driver
    /// must resynchronise after a multi-input-to-one-output collapse.
    ///
    /// # Errors
    /// `OutputIndexOutOfRange` if `j` is out of bounds.
    pub fn set_current(&mut self, j: usize) -> anyhow::Result<()> {
        if j >= self.children.len() {
            return Err(IoError::OutputIndexOutOfRange(j)).loc("While setting the sink chain's active output");
        }
        self.current = j;
        Ok(())
    }

    #[must_use]
    pub fn sink(&self, j: usize) -> Option<&dyn SnpSink> {
        self.children.get(j).map(|sink| sink.as_ref())
    }

    #[must_use]
    pub fn child_written(&self, j: usize) -> Option<usize> {
        self.children.get(j).map(|s| s.variants_written())
    }

    #[must_use]
    pub fn total_written(&self) -> usize {
        self.children.iter().map(|s| s.variants_written()).sum()
    }

    /// Write `variant` to the currently active sink.
    ///
    /// # Errors
    /// Propagates the sink's I/O error verbatim.
    pub fn write_variant(&mut self, variant: &VariantRecord) -> anyhow::Result<()> {
        let current = self.current;
        let sink = self.children.get_mut(current)
            .ok_or(IoError::OutputIndexOutOfRange(current))
            .loc("While writing to the active sink")?;
        sink.write_variant(variant).loc("While writing to the active sink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_sink() -> MockSnpSink {
        use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};
        let mut mock = MockSnpSink::new();
        let count = Arc::new(AtomicUsize::new(0));
        let write_count = Arc::clone(&count);
        mock.expect_write_variant().returning(move |_| { write_count.fetch_add(1, Ordering::SeqCst); Ok(()) });
        mock.expect_variants_written().returning(move || count.load(Ordering::SeqCst));
        mock
    }

    #[test]
    fn writes_go_to_the_active_sink() {
        let mut chain = SinkChain::new();
        chain.add_sink(Box::new(counting_sink()));
        chain.add_sink(Box::new(counting_sink()));
        let record = VariantRecord::new(1);

        chain.write_variant(&record).unwrap();
        chain.advance().unwrap();
        chain.write_variant(&record).unwrap();
        chain.write_variant(&record).unwrap();

        assert_eq!(chain.child_written(0), Some(1));
        assert_eq!(chain.child_written(1), Some(2));
        assert_eq!(chain.total_written(), 3);
    }

    #[test]
    fn advancing_past_the_last_sink_errors() {
        let mut chain = SinkChain::new();
        chain.add_sink(Box::new(counting_sink()));
        assert!(chain.advance().is_err());
    }

    #[test]
    fn set_current_jumps_directly() {
        let mut chain = SinkChain::new();
        chain.add_sink(Box::new(counting_sink()));
        chain.add_sink(Box::new(counting_sink()));
        chain.add_sink(Box::new(counting_sink()));
        chain.set_current(2).unwrap();
        assert_eq!(chain.current_child(), 2);
        assert!(chain.set_current(5).is_err());
    }
}
