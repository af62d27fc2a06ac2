use clap::Parser;
use crosswatch::cli::{init_logging, run, Cli};

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
