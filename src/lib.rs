//! Delay optimization for And-Inverter Graphs
//!
//! This crate reduces the critical-path depth of a logic network by locally
//! re-associating And chains, without changing the function the network
//! computes. It comes with the surrounding machinery a delay tool needs:
//! simulation, equivalence checking and `.bench` file support.
//!
//! # Usage
//!
//! The network is a typical And-Inverter-Graph representation of a logic
//! circuit: every gate is a 2-input And, and inverters are implicit,
//! occupying just one bit in [`Signal`]. Structural hashing is applied when
//! gates are created, so identical gates are shared.
//!
//! ```
//! use rebal::{Network, optim};
//!
//! let mut net = Network::new();
//! let a = net.add_input();
//! let b = net.add_input();
//! let c = net.add_input();
//! let ab = net.and(a, b);
//! let abc = net.and(ab, c);
//! net.add_output(abc);
//!
//! // Shorten the critical path where re-association provably helps
//! optim::rebalance(&mut net).unwrap();
//! net.cleanup();
//! ```
//!
//! The same operations are available from the command line:
//!
//! ```bash
//! # Show statistics, including the depth
//! rebal show mydesign.bench
//! # Reduce the depth
//! rebal opt mydesign.bench -o rebalanced.bench
//! # Check equivalence between the two
//! rebal equiv mydesign.bench rebalanced.bench
//! ```
//!
//! # Development
//!
//! The rewriting engine itself is deliberately small: it walks the gates on
//! the critical path, inspects two levels of the deepest chain, and replaces
//! `x & (y & deep)` by `(x & y) & deep` whenever the depth analysis proves
//! the result strictly shallower. Everything else in the crate exists to
//! make that loop usable and checkable: levels and critical paths are
//! recomputed through [`DepthView`] after every accepted rewrite, and the
//! simulation-based equivalence checker makes broken rewrites visible in
//! tests and from the CLI.

#![warn(missing_docs)]

pub mod cmd;
pub mod equiv;
pub mod io;
pub mod network;
pub mod optim;
pub mod sim;

pub use network::{stats, DepthView, Gate, Network, Signal};
