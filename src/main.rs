//! vgraph - Command-line tool for resolving sprite-variant node graphs

use std::process::ExitCode;

use variantgraph::cli;

fn main() -> ExitCode {
    cli::run()
}
