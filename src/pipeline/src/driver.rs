use std::collections::HashMap;

use filter::{Condition, Trivial};
use genotype::{SampleRow, SampleTable, VariantRecord};
use gqc_io::{SinkChain, SourceChain};
use located_error::prelude::*;
use log::debug;
use statistics::{StatisticsEngine, Value, IDENTIFICATION_NAMES};

use crate::{error::PipelineError, stats_sink::StatsSink};

/// Everything the driver needs beyond the source/sink chains and the
/// statistics engine: the filter tree for variants, the two sample-level
/// filters, the sample annotation table, and the input-to-output
/// correspondence the filename mapper computed (§4.6).
pub struct DriverConfig {
    pub sample_table: Option<SampleTable>,
    /// Decides, once per sample and before streaming starts, which samples
    /// are stripped from every variant (and from the sample table). A
    /// sample is kept when this condition is satisfied against its row.
    pub sample_removal_filter: Box<dyn Condition>,
    /// Decides, once per sample after streaming ends, whether its derived
    /// row (with `missing`/`heterozygosity` appended) is written to the
    /// kept or the excluded sample sink.
    pub sample_stats_filter: Box<dyn Condition>,
    /// Decides, once per autosomal variant, whether it is written to the
    /// kept or the excluded variant sink.
    pub snp_filter: Box<dyn Condition>,
    pub output_index_for_input: Vec<usize>,
    pub excluded_output_index_for_input: Option<Vec<usize>>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self{
            sample_table: None,
            sample_removal_filter: Box::new(Trivial),
            sample_stats_filter: Box::new(Trivial),
            snp_filter: Box::new(Trivial),
            output_index_for_input: Vec::new(),
            excluded_output_index_for_input: None,
        }
    }
}

/// The two sample tables produced once the per-sample accumulator has been
/// finalised: one row per sample, routed by [`DriverConfig::sample_stats_filter`].
pub struct SampleOutcome {
    pub kept: SampleTable,
    pub excluded: SampleTable,
}

/// Summary of one full run of [`Driver::run`].
pub struct DriverOutput {
    pub total_read: usize,
    pub total_kept: usize,
    pub total_rejected: usize,
    /// How many times each named subcondition of the SNP filter was the
    /// (or a) reason a variant was rejected (§4.5).
    pub rejection_counts: HashMap<String, usize>,
    pub samples: Option<SampleOutcome>,
}

/// The streaming pipeline driver (C7): pulls variants from the source
/// chain, runs them through the statistics engine and SNP filter, routes
/// them to the kept/excluded variant sinks and the SNP-stats sink, and
/// accumulates per-sample sums for the post-stream sample statistics pass.
pub struct Driver {
    source: SourceChain,
    sink_in: SinkChain,
    sink_out: Option<SinkChain>,
    stats_sink: Option<Box<dyn StatsSink>>,
    engine: StatisticsEngine,
    snp_filter: Box<dyn Condition>,
    output_index_for_input: Vec<usize>,
    excluded_output_index_for_input: Option<Vec<usize>>,
    removed_sample_indices: Vec<usize>,
    sample_stats_filter: Box<dyn Condition>,
    retained_table: Option<SampleTable>,
    accumulator: genotype::SampleAccumulator,
}

impl Driver {
    /// # Errors
    /// `PipelineError::SampleCountMismatch` if a configured sample table's
    /// row count disagrees with the source chain's sample count.
    pub fn new(
        source: SourceChain,
        sink_in: SinkChain,
        sink_out: Option<SinkChain>,
        stats_sink: Option<Box<dyn StatsSink>>,
        engine: StatisticsEngine,
        config: DriverConfig,
    ) -> anyhow::Result<Self> {
        let n_samples = source.n_samples();

        let (removed_sample_indices, retained_table) = match config.sample_table {
            None => (Vec::new(), None),
            Some(table) => {
                if table.n_samples() != n_samples {
                    return Err(PipelineError::SampleCountMismatch{source: n_samples, table: table.n_samples()})
                        .loc("While constructing the pipeline driver");
                }
                let mut removed = Vec::new();
                let mut kept_rows = Vec::new();
                for (i, row) in table.rows.iter().enumerate() {
                    let env = filter::SampleRowEnv::new(&table.columns, row);
                    let satisfied = config.sample_removal_filter.evaluate(&env)
                        .with_loc(|| format!("While evaluating the sample-removal filter on row {i}"))?
                        .satisfied;
                    if satisfied {
                        kept_rows.push(row.clone());
                    } else {
                        removed.push(i);
                    }
                }
                let mut retained = SampleTable::new(table.columns.clone(), table.kinds.clone());
                retained.rows = kept_rows;
                (removed, Some(retained))
            }
        };

        let accumulator = genotype::SampleAccumulator::new(n_samples - removed_sample_indices.len());

        Ok(Self{
            source, sink_in, sink_out, stats_sink, engine,
            snp_filter: config.snp_filter,
            output_index_for_input: config.output_index_for_input,
            excluded_output_index_for_input: config.excluded_output_index_for_input,
            removed_sample_indices,
            sample_stats_filter: config.sample_stats_filter,
            retained_table,
            accumulator,
        })
    }

    fn roll_sinks(&mut self) -> anyhow::Result<()> {
        let input_idx = self.source.current_child_index();
        let target = *self.output_index_for_input.get(input_idx)
            .ok_or(PipelineError::NoOutputForInput{input: input_idx})
            .loc("While rolling the sink chain to the active output")?;
        if self.sink_in.current_child() != target {
            self.sink_in.set_current(target).loc("While advancing the kept-variant sink chain")?;
        }
        if let Some(sink_out) = self.sink_out.as_mut() {
            let map = self.excluded_output_index_for_input.as_ref().unwrap_or(&self.output_index_for_input);
            let target_out = *map.get(input_idx)
                .ok_or(PipelineError::NoOutputForInput{input: input_idx})
                .loc("While rolling the excluded-variant sink chain to the active output")?;
            if sink_out.current_child() != target_out {
                sink_out.set_current(target_out).loc("While advancing the excluded-variant sink chain")?;
            }
        }
        Ok(())
    }

    fn write_na_stats_row(&mut self, record: &VariantRecord, row_index: usize) -> anyhow::Result<()> {
        if self.stats_sink.is_none() {
            return Ok(());
        }
        self.engine.process(record);
        let names = self.engine.names();
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            if IDENTIFICATION_NAMES.contains(&name) {
                values.push(self.engine.value_of(name).loc("While emitting an identification-only statistics row")?);
            } else {
                values.push(Value::Text("NA".to_string()));
            }
        }
        self.stats_sink.as_mut().unwrap().write_row(row_index, &values)
            .loc("While writing a sex-chromosome statistics row")
    }

    fn write_stats_row(&mut self, row_index: usize) -> anyhow::Result<()> {
        let Some(sink) = self.stats_sink.as_mut() else { return Ok(()) };
        let names = self.engine.names().into_iter().map(String::from).collect::<Vec<_>>();
        let mut values = Vec::with_capacity(names.len());
        for name in &names {
            values.push(self.engine.value_of(name).with_loc(|| format!("While evaluating statistic '{name}' for the output row"))?);
        }
        sink.write_row(row_index, &values).loc("While writing a statistics row")
    }

    /// Run the streaming loop to completion, then derive and route the
    /// per-sample statistics (§4.7).
    ///
    /// # Errors
    /// Propagates any source/sink I/O error, sample-count mismatch, or
    /// filter-evaluation error verbatim (fail-fast, §5).
    pub fn run(mut self) -> anyhow::Result<DriverOutput> {
        if !self.output_index_for_input.is_empty() {
            self.roll_sinks()?;
        }
        if let Some(sink) = self.stats_sink.as_mut() {
            let names = self.engine.names();
            sink.write_header(&names).loc("While writing the statistics file header")?;
        }

        let mut record = VariantRecord::new(self.source.n_samples());
        let mut total_read = 0usize;
        let mut total_kept = 0usize;
        let mut total_rejected = 0usize;
        let mut rejection_counts: HashMap<String, usize> = HashMap::new();
        let mut row_index = 0usize;

        loop {
            let outcome = self.source.read_next(&mut record).loc("While reading the next variant")?;
            if !outcome.has_more {
                break;
            }
            if outcome.source_changed {
                self.roll_sinks()?;
            }
            total_read += 1;

            if !record.id.chromosome.is_autosomal() {
                self.sink_in.write_variant(&record).loc("While writing a sex-chromosome variant unchanged")?;
                row_index += 1;
                self.write_na_stats_row(&record, row_index)?;
                continue;
            }

            record.filter_out_samples_by_index(&self.removed_sample_indices)
                .loc("While applying the precomputed sample removal to an autosomal variant")?;
            self.engine.process(&record);

            let evaluation = self.snp_filter.evaluate(&self.engine).loc("While evaluating the SNP filter")?;
            for reason in &evaluation.failed {
                *rejection_counts.entry(reason.clone()).or_insert(0) += 1;
            }

            if evaluation.satisfied {
                self.sink_in.write_variant(&record).loc("While writing a kept variant")?;
                total_kept += 1;
                row_index += 1;
                self.write_stats_row(row_index)?;
            } else {
                total_rejected += 1;
                if let Some(sink_out) = self.sink_out.as_mut() {
                    sink_out.write_variant(&record).loc("While writing a rejected variant to the exclusion sink")?;
                }
            }
            self.accumulator.accumulate(&record).loc("While accumulating an autosomal variant's genotype sums")?;
        }

        let samples = self.finish_samples()?;
        debug!("Pipeline run complete: {total_read} read, {total_kept} kept, {total_rejected} rejected");

        Ok(DriverOutput{total_read, total_kept, total_rejected, rejection_counts, samples})
    }

    fn finish_samples(&mut self) -> anyhow::Result<Option<SampleOutcome>> {
        let Some(table) = self.retained_table.take() else { return Ok(None) };

        let stats = self.accumulator.derive();
        if stats.len() != table.rows.len() {
            return Err(PipelineError::SampleCountMismatch{source: stats.len(), table: table.rows.len()})
                .loc("While joining accumulated sample statistics back onto the sample table");
        }

        let mut augmented = table;
        let missing: Vec<String> = stats.iter().map(|s| format!("{}", s.missing)).collect();
        let heterozygosity: Vec<String> = stats.iter().map(|s| format!("{}", s.heterozygosity)).collect();
        augmented.add_column("missing_rate", genotype::ColumnKind::Continuous, missing)
            .loc("While appending the derived sample missingness column")?;
        augmented.add_column("heterozygosity", genotype::ColumnKind::Continuous, heterozygosity)
            .loc("While appending the derived sample heterozygosity column")?;

        let mut kept = SampleTable::new(augmented.columns.clone(), augmented.kinds.clone());
        let mut excluded = SampleTable::new(augmented.columns.clone(), augmented.kinds.clone());
        for row in augmented.rows {
            let satisfied = {
                let env = filter::SampleRowEnv::new(&augmented.columns, &row);
                self.sample_stats_filter.evaluate(&env).loc("While evaluating the sample-statistics filter")?.satisfied
            };
            route_row(row, satisfied, &mut kept, &mut excluded);
        }
        Ok(Some(SampleOutcome{kept, excluded}))
    }
}

fn route_row(row: SampleRow, satisfied: bool, kept: &mut SampleTable, excluded: &mut SampleTable) {
    if satisfied {
        kept.rows.push(row);
    } else {
        excluded.rows.push(row);
    }
}
