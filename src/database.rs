//! Database of precomputed minimal structures, and their insertion in a destination
//!
//! The [`Library`] associates NPN classes of functions with supergates: small structures
//! over [`NUM_VARS`] inputs with a known cost and depth. The [`DatabaseManager`] looks up a
//! function, possibly with don't-cares, and rebuilds the selected supergate in a
//! [`Destination`]: a network, a flat instruction list or a level view.
//!
//! ```
//! # use supergate::database::{DatabaseManager, Library, NUM_VARS};
//! # use supergate::network::NetworkKind;
//! # use supergate::truth_table::{TernaryTable, TruthTable};
//! # use supergate::Network;
//! let library = Library::standard(NetworkKind::Xag);
//! let mut manager = DatabaseManager::new(&library, NetworkKind::Xag.into()).unwrap();
//!
//! let mut xag = Network::new(NetworkKind::Xag);
//! let a = xag.add_input();
//! let b = xag.add_input();
//! let target = TernaryTable::full(TruthTable::nth_var(2, 0) ^ TruthTable::nth_var(2, 1));
//! let m = manager.lookup(&target).unwrap();
//! let leaves = manager.match_leaves(&m, &xag, &[a, b]);
//! assert_eq!(leaves.len(), NUM_VARS);
//! manager.insert(&m, &mut xag, m.best(), &leaves);
//! assert_eq!(xag.nb_gates(), 1);
//! ```

use std::fmt;

mod destination;
mod library;
mod manager;

pub use destination::{Destination, DestinationKind};
pub use library::{Library, LibraryBuilder, Supergate};
pub use manager::{DatabaseManager, Match};

/// Number of inputs of the supergates
pub const NUM_VARS: usize = 5;

/// Error returned by database and rewriting operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The library uses a gate that cannot be built in this kind of destination
    UnsupportedDestinationKind {
        /// Kind of the destination
        kind: DestinationKind,
        /// Name of the unsupported gate
        gate: &'static str,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDestinationKind { kind, gate } => {
                write!(f, "{gate} gates from the library cannot be built in a {kind:?} destination")
            }
        }
    }
}

impl std::error::Error for RewriteError {}
