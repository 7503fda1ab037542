use clap::Parser;
use solid_png::cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if Cli::parse().run() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
