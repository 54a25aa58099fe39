use std::process::ExitCode;

use gpx2yotreps::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::from_env();
    cli::init_logging(cli.log_level());

    match cli::run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
