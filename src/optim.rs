//! Optimization of logic networks

mod rebalance;

pub use rebalance::{rebalance, rebalance_bounded, rebalance_with_observer};
