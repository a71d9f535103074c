use std::fmt;
use std::ops::{BitXor, BitXorAssign, Not};

/// Representation of a signal (a node of the network or its complement)
///
/// May be 0, 1, x or !x.
/// Node 0 is the constant node, so that the default signal is the constant zero.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Signal {
    a: u32,
}

impl Signal {
    /// Constant zero signal
    pub fn zero() -> Signal {
        Signal { a: 0 }
    }

    /// Constant one signal
    pub fn one() -> Signal {
        Signal { a: 1 }
    }

    /// Create a signal from a node index
    pub fn from_node(n: u32) -> Signal {
        Signal { a: n << 1 }
    }

    /// Create a signal from a node index and a polarity
    pub fn new(n: u32, inverted: bool) -> Signal {
        Signal::from_node(n) ^ inverted
    }

    /// Obtain the node index associated with the signal
    pub fn node(&self) -> u32 {
        self.a >> 1
    }

    /// Obtain the node index associated with the signal, as an index
    pub fn index(&self) -> usize {
        self.node() as usize
    }

    /// Returns true if the signal represents a constant
    pub fn is_constant(&self) -> bool {
        self.node() == 0
    }

    /// Clear the inversion, if set
    pub fn without_inversion(&self) -> Signal {
        Signal { a: self.a & !1u32 }
    }

    /// Returns true if the signal is implicitly inverted
    ///
    /// False for nodes and zero.
    /// True for their complement and for one.
    pub fn is_inverted(&self) -> bool {
        self.a & 1 != 0
    }

    /// Return the internal representation of the signal
    pub fn raw(&self) -> u32 {
        self.a
    }

    /// Rebuild a signal from its internal representation
    pub fn from_raw(a: u32) -> Signal {
        Signal { a }
    }

    /// Apply a translation of node indices to the signal
    pub(crate) fn remap(&self, t: &[Signal]) -> Signal {
        t[self.index()] ^ self.is_inverted()
    }
}

impl From<bool> for Signal {
    fn from(b: bool) -> Signal {
        if b {
            Signal::one()
        } else {
            Signal::zero()
        }
    }
}

impl Not for Signal {
    type Output = Signal;
    fn not(self) -> Signal {
        Signal { a: self.a ^ 1u32 }
    }
}

impl Not for &'_ Signal {
    type Output = Signal;
    fn not(self) -> Signal {
        Signal { a: self.a ^ 1u32 }
    }
}

impl BitXorAssign<bool> for Signal {
    fn bitxor_assign(&mut self, rhs: bool) {
        self.a ^= rhs as u32;
    }
}

impl BitXor<bool> for Signal {
    type Output = Signal;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut l = self;
        l ^= rhs;
        l
    }
}

impl BitXor<bool> for &'_ Signal {
    type Output = Signal;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut l = *self;
        l ^= rhs;
        l
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            let a = self.a & 1;
            write!(f, "{a}")
        } else {
            if self.is_inverted() {
                write!(f, "!")?;
            }
            write!(f, "x{}", self.node())
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
