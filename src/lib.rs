//! Database-driven logic rewriting
//!
//! This crate provides the core of a technology-independent rewriting flow: small Boolean
//! functions observed in a circuit are matched against a library of precomputed minimal
//! structures, and the best structure is rebuilt in whatever representation is being produced.
//!
//! # Usage
//!
//! A [`database::Library`] is built once and shared. A [`database::DatabaseManager`] looks up
//! functions, possibly incompletely specified, and inserts the matching supergates into a
//! [`database::Destination`]: a [`Network`], a [`network::FlatList`] or a [`view::LevelView`].
//!
//! ```
//! # use supergate::database::Library;
//! # use supergate::network::NetworkKind;
//! # use supergate::optim::{rewrite, RewriteParameters};
//! # use supergate::Network;
//! let mut xag = Network::new(NetworkKind::Xag);
//! let a = xag.add_input();
//! let b = xag.add_input();
//! let x0 = xag.and(a, !b);
//! let x1 = xag.and(!a, b);
//! let x = xag.or(x0, x1);
//! xag.add_output(x);
//!
//! let library = Library::standard(NetworkKind::Xag);
//! let optimized = rewrite(&xag, &library, &RewriteParameters::default()).unwrap();
//! assert_eq!(optimized.nb_gates(), 1);
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! `Network` is a typical Gate-Inverter-Graph representation of a logic circuit.
//! Inverters are implicit, occupying just one bit in `Signal`.
//! Each network has a kind, restricting the gates it contains: And gates only, And and Xor
//! gates, or Maj gates only. Gates are normalized and structurally hashed when they are created.
//!
//! Algorithms that need per-node information while the network changes use a
//! [`view::LevelView`], which subscribes to the creation events of the network.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.

#![warn(missing_docs)]

pub mod canonization;
pub mod database;
pub mod network;
pub mod optim;
pub mod sim;
pub mod truth_table;
pub mod view;

pub use network::{cost, Gate, Network, NetworkKind, Signal};
