use clap::Parser;
use dirsorter::cli::{Cli, run_cli};
use dirsorter::error::SortError;
use dirsorter::logging::init_logging;
use dirsorter::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run_cli(&cli) {
        // Per-file failures were already listed by the sort command.
        if !matches!(e, SortError::MoveFailures { .. }) {
            OutputFormatter::error(&e.to_string());
        }
        std::process::exit(e.exit_code());
    }
}
