//! Cardsrc - Command-line tool for rendering digital business cards

use std::process::ExitCode;

use cardsrc::cli;

fn main() -> ExitCode {
    cli::run()
}
