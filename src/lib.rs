extern crate parser;
extern crate logger;

use std::error::Error;

use filter::{And, Condition, GreaterThan, InIdentifierList, LessThan, SampleNotExcluded, SnpIdMatches, Trivial};
use genotype::SampleTable;
use gqc_io::{read_sample_table, write_sample_table, FilenameMapper, SinkChain, SourceChain, TextSink, TextSource};
use located_error::prelude::*;
use parser::{Cli, Commands, RunArgs};
use pipeline::{Driver, DriverConfig, TextStatsSink};
use statistics::StatisticsEngine;

#[macro_use]
extern crate log;

/// Dispatch a parsed [`Cli`] invocation.
pub fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.commands {
        Commands::Run(ref args) => run_pipeline(args)?,
        Commands::FromYaml{ref yaml} => {
            let cli = Cli::deserialize(yaml.clone())?;
            self::run(cli)?;
        }
    };
    Ok(())
}

fn run_pipeline(args: &RunArgs) -> anyhow::Result<()> {
    args.validate().loc("While validating command line arguments")?;
    args.check_overwrite().loc("While checking for pre-existing output files")?;

    let mut input_mapper = FilenameMapper::new();
    input_mapper.add_pairs(&args.input, &args.output)
        .loc("While mapping --input patterns to --output templates")?;

    let mut source = SourceChain::new();
    for i in 0..input_mapper.input_count() {
        let path = input_mapper.input(i).expect("index within input_count");
        source.add_source(Box::new(TextSource::open(path)?))
            .with_loc(|| format!("While adding '{path}' to the source chain"))?;
    }

    let mut sink_in = SinkChain::new();
    for j in 0..input_mapper.output_count() {
        let path = input_mapper.output(j).expect("index within output_count");
        sink_in.add_sink(Box::new(TextSink::create(path)?));
    }
    let output_index_for_input: Vec<usize> = (0..input_mapper.input_count())
        .map(|i| input_mapper.output_index_of(i).expect("every mapped input has an output"))
        .collect();

    let (sink_out, excluded_output_index_for_input) = if args.excluded_output.is_empty() {
        (None, None)
    } else {
        let mut excluded_mapper = FilenameMapper::new();
        excluded_mapper.add_pairs(&args.input, &args.excluded_output)
            .loc("While mapping --input patterns to --excluded-output templates")?;
        let mut chain = SinkChain::new();
        for j in 0..excluded_mapper.output_count() {
            let path = excluded_mapper.output(j).expect("index within output_count");
            chain.add_sink(Box::new(TextSink::create(path)?));
        }
        let map: Vec<usize> = (0..excluded_mapper.input_count())
            .map(|i| excluded_mapper.output_index_of(i).expect("every mapped input has an output"))
            .collect();
        (Some(chain), Some(map))
    };

    let sample_table: Option<SampleTable> = args.sample_file.as_ref()
        .map(read_sample_table)
        .transpose()
        .loc("While reading the sample annotation file")?;

    let sample_removal_filter: Box<dyn Condition> = if args.sample_excl_list.is_empty() {
        Box::new(Trivial)
    } else {
        let ids = gqc_io::load_identifier_set(&args.sample_excl_list)
            .loc("While loading --sample-excl-list")?;
        Box::new(SampleNotExcluded::new(ids))
    };

    let sample_stats_filter: Box<dyn Condition> = match args.sample_missing_max {
        Some(max) => Box::new(LessThan::new("missing_rate", max)),
        None => Box::new(Trivial),
    };

    let mut snp_conditions: Vec<Box<dyn Condition>> = Vec::new();
    if let Some(min) = args.maf_min {
        snp_conditions.push(Box::new(GreaterThan::new("MAF", min)));
    }
    if let Some(min) = args.info_min {
        snp_conditions.push(Box::new(GreaterThan::new("information", min)));
    }
    if let Some(max) = args.hwe_max {
        snp_conditions.push(Box::new(LessThan::new("HWE", max)));
    }
    if let Some(max) = args.missing_max {
        snp_conditions.push(Box::new(LessThan::new("missing", max)));
    }
    if !args.snp_incl_list.is_empty() {
        let ids = gqc_io::load_identifier_set(&args.snp_incl_list).loc("While loading --snp-incl-list")?;
        snp_conditions.push(Box::new(InIdentifierList::new(ids)));
    }
    if !args.snp_excl_list.is_empty() {
        let ids = gqc_io::load_identifier_set(&args.snp_excl_list).loc("While loading --snp-excl-list")?;
        snp_conditions.push(Box::new(filter::Not(Box::new(InIdentifierList::new(ids)))));
    }
    if let Some(expr) = &args.snp_id_matches {
        snp_conditions.push(Box::new(SnpIdMatches::new(expr.clone())));
    }
    let snp_filter: Box<dyn Condition> = if snp_conditions.is_empty() {
        Box::new(Trivial)
    } else {
        Box::new(And(snp_conditions))
    };

    let mut engine = StatisticsEngine::new();
    for builtin in statistics::all_builtin_statistics() {
        engine.register(builtin).loc("While registering a built-in statistic")?;
    }

    let stats_sink = args.stats_output.as_ref()
        .map(|path| TextStatsSink::create(path, args.significant_digits))
        .transpose()
        .loc("While creating the statistics output file")?
        .map(|sink| Box::new(sink) as Box<dyn pipeline::StatsSink>);

    let config = DriverConfig{
        sample_table,
        sample_removal_filter,
        sample_stats_filter,
        snp_filter,
        output_index_for_input,
        excluded_output_index_for_input,
    };

    let driver = Driver::new(source, sink_in, sink_out, stats_sink, engine, config)
        .loc("While constructing the pipeline driver")?;
    let output = driver.run().loc("While running the pipeline")?;

    info!(
        "{} variants read, {} kept, {} rejected",
        output.total_read, output.total_kept, output.total_rejected
    );
    for (reason, count) in &output.rejection_counts {
        debug!("rejected {count} time(s): {reason}");
    }

    if let Some(samples) = output.samples {
        if let Some(path) = &args.sample_output {
            write_sample_table(path, &samples.kept).loc("While writing the kept sample table")?;
        }
        if let Some(path) = &args.sample_excluded_output {
            write_sample_table(path, &samples.excluded).loc("While writing the excluded sample table")?;
        }
        info!(
            "{} samples kept, {} samples excluded",
            samples.kept.rows.len(), samples.excluded.rows.len()
        );
    }

    Ok(())
}
