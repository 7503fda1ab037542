use crate::commands::Command;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Write solid-color PNG images and app icons", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> bool {
        match self.command.run() {
            Ok(_) => true,
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        }
    }
}
