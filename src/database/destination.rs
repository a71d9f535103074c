use crate::network::{FlatList, NetworkKind};
use crate::{Network, Signal};

/// Kind of destination, selecting how library gates are rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// And-Inverter-Graph: only And gates
    Aig,
    /// Xor-And-Inverter-Graph: And and Xor gates
    Xag,
    /// Majority-Inverter-Graph: only Maj gates
    Mig,
    /// Flat instruction list: all gates
    Flat,
}

impl From<NetworkKind> for DestinationKind {
    fn from(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Aig => DestinationKind::Aig,
            NetworkKind::Xag => DestinationKind::Xag,
            NetworkKind::Mig => DestinationKind::Mig,
        }
    }
}

/// Representation in which supergates can be rebuilt
pub trait Destination {
    /// Kind of the destination
    fn kind(&self) -> DestinationKind;

    /// Signal of a constant
    fn get_constant(&self, value: bool) -> Signal;

    /// Create an And2 gate
    fn create_and(&mut self, a: Signal, b: Signal) -> Signal;

    /// Create a Xor2 gate
    fn create_xor(&mut self, a: Signal, b: Signal) -> Signal;

    /// Create a Maj gate
    fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal;

    /// Create a primary output and return its index
    fn create_output(&mut self, s: Signal) -> usize;
}

impl Destination for Network {
    fn kind(&self) -> DestinationKind {
        Network::kind(self).into()
    }

    fn get_constant(&self, value: bool) -> Signal {
        Signal::from(value)
    }

    fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.and(a, b)
    }

    fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.xor(a, b)
    }

    fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        self.maj(a, b, c)
    }

    fn create_output(&mut self, s: Signal) -> usize {
        self.add_output(s)
    }
}

impl Destination for FlatList {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Flat
    }

    fn get_constant(&self, value: bool) -> Signal {
        Signal::from(value)
    }

    fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.add_and(a, b)
    }

    fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.add_xor(a, b)
    }

    fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        self.add_maj(a, b, c)
    }

    fn create_output(&mut self, s: Signal) -> usize {
        self.add_output(s)
    }
}
