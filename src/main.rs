//! CLI entry point for weak-lensing mass mapping and peak counting

use clap::Parser;
use massmap::io::cli::{Cli, CommandRunner, init_logging};

fn main() -> massmap::Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose);
    CommandRunner::new(cli).run()
}
