use clap::Parser;

use rebal::cmd::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Show(a) => a.run(),
        Commands::Rebalance(a) => a.run(),
        Commands::Simulate(a) => a.run(),
        Commands::CheckEquivalence(a) => a.run(),
    }
}
