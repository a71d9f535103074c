//! Representation and handling of logic networks

pub mod cost;
pub mod events;
mod flat_list;
mod gates;
pub mod generators;
mod network;
mod signal;

pub use flat_list::{FlatList, Instruction, Opcode};
pub use gates::{BinaryType, Gate, Normalization};
pub use network::{Network, NetworkKind};
pub use signal::Signal;
