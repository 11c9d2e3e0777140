//! Compute network statistics
//!
//! ```
//! # use rebal::Network;
//! # let aig = Network::new();
//! use rebal::stats::stats;
//! let stats = stats(&aig);
//!
//! // Check that there is no And gate
//! assert_eq!(stats.nb_and, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::depth::DepthView;
use crate::{Gate, Network};

/// Number of inputs, outputs and gates in a network, plus its depth
#[derive(Clone, Debug)]
pub struct NetworkStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of And gates
    pub nb_and: usize,
    /// Number of positive Buf
    pub nb_buf: usize,
    /// Number of Not (negative Buf)
    pub nb_not: usize,
    /// Depth of the network, in And gates
    pub depth: u32,
}

impl NetworkStats {
    /// Total number of gates
    pub fn nb_gates(&self) -> usize {
        self.nb_and + self.nb_buf + self.nb_not
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        writeln!(f, "  Depth: {}", self.depth)?;
        if self.nb_and != 0 {
            writeln!(f, "  And: {}", self.nb_and)?;
        }
        if self.nb_not != 0 {
            writeln!(f, "  Not: {}", self.nb_not)?;
        }
        if self.nb_buf != 0 {
            writeln!(f, "  Buf: {}", self.nb_buf)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the network
pub fn stats(a: &Network) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_inputs: a.nb_inputs(),
        nb_outputs: a.nb_outputs(),
        nb_and: 0,
        nb_buf: 0,
        nb_not: 0,
        depth: DepthView::from_network(a).depth(),
    };
    for i in 0..a.nb_nodes() {
        match a.gate(i) {
            Gate::And(_) => ret.nb_and += 1,
            Gate::Buf(s) => {
                if s.is_inverted() {
                    ret.nb_not += 1;
                } else {
                    ret.nb_buf += 1;
                }
            }
        }
    }

    ret
}
