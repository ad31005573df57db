use clap::Parser;
use datetidy::cli::{Cli, run};
use datetidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        OutputFormatter::error(&e.to_string());
        return ExitCode::from(e.exit_code());
    }

    ExitCode::SUCCESS
}
