use std::{
    error::Error,
    fs::File,
    path::PathBuf,
};

use located_error::*;

use clap::{Parser, Subcommand, Args};
use serde::{Serialize, Deserialize};
use log::debug;
use anyhow::Result;

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="gqc", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// A quality-control and transformation toolkit for genotype-imputation data.
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use --quiet/-q to disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emitted even when verbose mode is off. Use this to disable them;
    /// only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention `{current time}-{module name}.yaml`, current time
    ///   following the format `YYYY-MM-DDThhmmss`.
    /// - File is written at the root of the user-provided `--output-dir` folder, when the
    ///   subcommand carries one.
    ///
    /// # Errors
    /// Sends an unrecoverable error if `serde_yaml` fails to parse `Self` to a string.
    pub fn serialize(&self) -> Result<(), Box<dyn Error>> {
        let serialized = serde_yaml::to_string(&self)
            .map_err(|err| format!("Failed to serialize command line arguments. got [{err}]"))?;

        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();

        let output_file = match &self.commands {
            Commands::Run(run) => {
                let dir_string = run.output_dir.to_str().expect("Invalid characters in directory");
                format!("{dir_string}/{current_time}-gqc-run.yaml")
            },
            Commands::FromYaml{yaml: _} => return Ok(()),
        };

        match std::fs::write(&output_file, serialized) {
            Err(e) => Err(format!("Unable to serialize arguments into {output_file}: [{e}]").into()),
            Ok(()) => Ok(()),
        }
    }

    /// Deserialize a `.yaml` file into command line arguments.
    ///
    /// # Errors
    /// - if the provided `.yaml` is invalid or unreadable.
    /// - if `serde_yaml` fails to parse the file into `Self`.
    pub fn deserialize(yaml: PathBuf) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_reader(File::open(yaml)?)?)
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Run the streaming QC pipeline over one or more genotype files.
    Run(Box<RunArgs>),

    /// Re-run a previously serialized `.yaml` configuration file.
    FromYaml {
        yaml: PathBuf,
    },
}

/// Stream one or more input genotype files through the statistics engine and
/// filter tree, writing kept/excluded variants and the derived statistics.
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug, Default, Serialize, Deserialize)]
pub struct RunArgs {
    /// Input genotype file pattern(s).
    ///
    /// May contain a single `#` wildcard, expanded against the filesystem; see `--output`.
    /// Provide `--input` as many times as there are distinct patterns.
    #[clap(short='i', long, multiple_occurrences(true), required(true))]
    pub input: Vec<String>,

    /// Output genotype file template(s), paired positionally with `--input`.
    ///
    /// Must carry the `#` wildcard iff the corresponding `--input` does. Filenames ending in
    /// `.gz` are written gzip-compressed.
    #[clap(short='o', long, multiple_occurrences(true), required(true))]
    pub output: Vec<String>,

    /// Output template(s) for variants rejected by the SNP filter, paired with `--input` the
    /// same way as `--output`.
    ///
    /// When omitted, rejected variants are simply dropped (never written anywhere).
    #[clap(long, multiple_occurrences(true))]
    pub excluded_output: Vec<String>,

    /// Sample annotation file (`id_1 id_2 missing [...]`, see the format documentation).
    #[clap(long)]
    pub sample_file: Option<PathBuf>,

    /// Where to write the surviving sample rows (requires `--sample-file`).
    #[clap(long)]
    pub sample_output: Option<PathBuf>,

    /// Where to write sample rows excluded by `--sample-missing-max`/`--sample-excl-list`
    /// (requires `--sample-file`).
    #[clap(long)]
    pub sample_excluded_output: Option<PathBuf>,

    /// Where to write the per-variant statistics table (one row per variant passed in, one
    /// column per registered statistic).
    #[clap(long)]
    pub stats_output: Option<PathBuf>,

    /// Number of significant digits used when formatting statistics output.
    #[clap(long, default_value("5"))]
    pub significant_digits: usize,

    /// Reject variants whose minor allele frequency is not strictly greater than this value.
    #[clap(long)]
    pub maf_min: Option<f64>,

    /// Reject variants whose `information` statistic is not strictly greater than this value.
    #[clap(long)]
    pub info_min: Option<f64>,

    /// Reject variants whose `HWE` (`-log10 p`) statistic is not strictly less than this value,
    /// i.e. whose departure from Hardy-Weinberg equilibrium is too significant.
    #[clap(long)]
    pub hwe_max: Option<f64>,

    /// Reject variants whose `missing` fraction is not strictly less than this value.
    #[clap(long)]
    pub missing_max: Option<f64>,

    /// Keep only variants whose SNP-id, RS-id, or position appears in one of these
    /// whitespace-separated identifier-list files.
    #[clap(long, multiple_occurrences(true))]
    pub snp_incl_list: Vec<PathBuf>,

    /// Reject variants whose SNP-id, RS-id, or position appears in one of these
    /// whitespace-separated identifier-list files.
    #[clap(long, multiple_occurrences(true))]
    pub snp_excl_list: Vec<PathBuf>,

    /// Keep only variants whose SNP-id matches this single-`*`-wildcard expression.
    #[clap(long)]
    pub snp_id_matches: Option<String>,

    /// Remove samples whose `id_1`/`id_2` appears in one of these whitespace-separated
    /// identifier-list files, before any variant is streamed (requires `--sample-file`).
    #[clap(long, multiple_occurrences(true))]
    pub sample_excl_list: Vec<PathBuf>,

    /// After streaming, route samples whose derived missingness is not strictly less than this
    /// value to `--sample-excluded-output` instead of `--sample-output`.
    #[clap(long)]
    pub sample_missing_max: Option<f64>,

    /// Overwrite existing output files.
    ///
    /// By default this program does not allow itself to overwrite existing results files or
    /// proceed past setup warnings. Use this flag to force both.
    #[clap(short='f', long)]
    pub force: bool,

    /// Directory where the serialized `.yaml` configuration of this run is written.
    #[clap(long, default_value("."))]
    pub output_dir: PathBuf,
}

impl RunArgs {
    /// Sanity-check the shape of the argument set, independent of the filesystem.
    ///
    /// # Errors
    /// `ParserError::Cardinality` if `--input`/`--output` counts differ, `MissingInputs` if
    /// neither was given, or `UsageConflict` for option combinations that can never do anything
    /// useful together.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.input.is_empty() || self.output.is_empty() {
            return Err(ParserError::MissingInputs).loc("While validating command line arguments");
        }
        if self.input.len() != self.output.len() {
            return Err(ParserError::Cardinality{inputs: self.input.len(), outputs: self.output.len()})
                .loc("While validating command line arguments");
        }
        if !self.excluded_output.is_empty() && self.excluded_output.len() != self.input.len() {
            return Err(ParserError::Cardinality{inputs: self.input.len(), outputs: self.excluded_output.len()})
                .loc("While validating --excluded-output against --input");
        }
        if self.sample_file.is_none() && (self.sample_output.is_some()
            || self.sample_excluded_output.is_some()
            || !self.sample_excl_list.is_empty()
            || self.sample_missing_max.is_some())
        {
            return Err(ParserError::UsageConflict(
                "sample-level options were given without --sample-file".to_string()
            )).loc("While validating command line arguments");
        }
        Ok(())
    }

    /// Whether any output path named by this run already exists on disk.
    #[must_use]
    pub fn existing_outputs(&self) -> Vec<&str> {
        self.output.iter()
            .chain(self.excluded_output.iter())
            .map(String::as_str)
            .filter(|p| PathBuf::from(p).exists())
            .collect()
    }

    /// Enforce the no-clobber policy unless `--force` was given.
    ///
    /// # Errors
    /// `ParserError::CannotOverwrite` naming the first pre-existing output path found.
    pub fn check_overwrite(&self) -> anyhow::Result<()> {
        if self.force {
            return Ok(());
        }
        if let Some(existing) = self.existing_outputs().first() {
            return Err(ParserError::CannotOverwrite((*existing).to_string())).loc("While checking output paths");
        }
        Ok(())
    }
}
