use std::process::ExitCode;

use clap::Parser;

use imgmerge::{cli, logger};

fn main() -> ExitCode {
    // Session log (overwrites the previous run's log)
    logger::init();

    let args = cli::CliArgs::parse();
    cli::run(args)
}
