use logger::Logger;
use parser::Cli;

use std::process;
use clap::Parser;

#[macro_use]
extern crate log;

fn main() {
    let cli = Cli::parse();

    let verbosity = if cli.quiet { 0 } else { cli.verbose + 1 };
    Logger::init(verbosity);

    if let Err(e) = cli.serialize() {
        warn!("Failed to serialize command line arguments: {e}");
    }

    if let Err(e) = gqc::run(cli) {
        error!("{e}");
        process::exit(1);
    }
}
