//! Command line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::equiv::check_equivalence;
use crate::io::{read_network_file, read_pattern_file, write_network_file, write_pattern_file};
use crate::network::stats::stats;
use crate::optim::{rebalance, rebalance_bounded};
use crate::sim::simulate;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a logic network
    ///
    /// Will print statistics on the number of inputs, outputs and gates in
    /// the network, as well as its depth.
    #[clap()]
    Show(ShowArgs),

    /// Reduce the depth of a logic network
    ///
    /// Re-associates And chains along the critical path until no rewrite
    /// shortens it further.
    #[clap(alias = "opt")]
    Rebalance(RebalanceArgs),

    /// Simulate a logic network
    ///
    /// This uses the same test pattern format as Atalanta, with one bit per input:
    ///    1: 00011101
    ///    2: 01110000
    #[clap(alias = "sim")]
    Simulate(SimulateArgs),

    /// Check equivalence between two logic networks
    ///
    /// The command will fail if the two networks are not equivalent, and will
    /// output the failing test pattern.
    #[clap(alias = "equiv")]
    CheckEquivalence(EquivArgs),
}

/// Command arguments for network informations
#[derive(Args)]
pub struct ShowArgs {
    /// Network to show
    file: PathBuf,
}

impl ShowArgs {
    /// Run the show command
    pub fn run(&self) {
        let aig = read_network_file(&self.file);
        println!("Network stats:\n{}\n", stats(&aig));
    }
}

/// Command arguments for depth reduction
#[derive(Args)]
pub struct RebalanceArgs {
    /// Network to optimize
    file: PathBuf,

    /// Output file for the optimized network
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Bound on the number of sweeps over the network
    #[arg(long)]
    max_sweeps: Option<usize>,
}

impl RebalanceArgs {
    /// Run the rebalance command
    pub fn run(&self) {
        let mut aig = read_network_file(&self.file);
        aig.cleanup();
        let depth_before = stats(&aig).depth;
        let res = match self.max_sweeps {
            Some(n) => rebalance_bounded(&mut aig, n),
            None => rebalance(&mut aig),
        };
        match res {
            Ok(nb_rewrites) => {
                aig.cleanup();
                let depth_after = stats(&aig).depth;
                println!(
                    "Applied {} rewrites, depth {} to {}",
                    nb_rewrites, depth_before, depth_after
                );
                write_network_file(&self.output, &aig);
            }
            Err(err) => {
                eprintln!("Rebalancing failed: {}", err);
                std::process::exit(1);
            }
        }
    }
}

/// Command arguments for simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Network to simulate
    network: PathBuf,

    /// Input patterns file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file for output patterns
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl SimulateArgs {
    /// Run the simulate command
    pub fn run(&self) {
        let aig = read_network_file(&self.network);
        let input_values = read_pattern_file(&self.input);
        let mut output_values = Vec::new();
        for pattern in &input_values {
            output_values.push(simulate(&aig, pattern));
        }
        write_pattern_file(&self.output, &output_values);
    }
}

/// Command arguments for equivalence checking
#[derive(Args)]
pub struct EquivArgs {
    /// First network to compare
    file1: PathBuf,
    /// Second network to compare
    file2: PathBuf,

    /// Number of random patterns when the network is too large for an exhaustive check
    #[arg(short = 'r', long, default_value_t = 1 << 20)]
    num_random: usize,

    /// Seed for random pattern generation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl EquivArgs {
    /// Run the equivalence checking command
    pub fn run(&self) {
        let aig1 = read_network_file(&self.file1);
        let aig2 = read_network_file(&self.file2);
        if aig1.nb_inputs() != aig2.nb_inputs() {
            println!(
                "Different number of inputs: {} vs {}. Networks are not equivalent",
                aig1.nb_inputs(),
                aig2.nb_inputs()
            );
            std::process::exit(1);
        }
        if aig1.nb_outputs() != aig2.nb_outputs() {
            println!(
                "Different number of outputs: {} vs {}. Networks are not equivalent",
                aig1.nb_outputs(),
                aig2.nb_outputs()
            );
            std::process::exit(1);
        }
        match check_equivalence(&aig1, &aig2, self.num_random, self.seed) {
            Err(pattern) => {
                println!("Networks are not equivalent");
                print!("Test pattern: ");
                for b in pattern {
                    print!("{}", if b { "1" } else { "0" });
                }
                println!();
                std::process::exit(1);
            }
            Ok(()) => {
                println!("Networks are equivalent");
                std::process::exit(0);
            }
        }
    }
}
