//! Representation and handling of And-Inverter Graphs

mod depth;
mod gates;
mod network;
mod signal;
pub mod stats;

pub use depth::DepthView;
pub use gates::{Gate, Normalization};
pub use network::Network;
pub use signal::Signal;
