mod cli;
mod demo;
mod formatter;
mod initializers;

use clap::Parser;

use crate::cli::CLI;
use crate::initializers::init_tracing;

fn main() -> eyre::Result<()> {
    let CLI { opts, command } = CLI::parse();

    init_tracing(&opts)?;

    command.run(&opts)
}
