//! rewind CLI entry point
//!
//! Parsing, the runtime and exit-code mapping all live in `cli`.

use rewind::cli;

fn main() {
    std::process::exit(cli::run());
}
