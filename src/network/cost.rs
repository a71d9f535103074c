//! Compute an approximation of the area or of the complexity of a network
//!
//! ```
//! # use supergate::Network;
//! # let aig = Network::default();
//! use supergate::network::cost::CostParameters;
//!
//! // To estimate area for VLSI designs
//! println!("VLSI cost: {}", CostParameters::vlsi().area(&aig));
//!
//! // To estimate area for FPGA designs
//! println!("FPGA cost: {}", CostParameters::fpga().area(&aig));
//!
//! // To count gates
//! println!("Gate count: {}", CostParameters::unit().area(&aig));
//! ```

use std::fmt;

use crate::network::gates::BinaryType;
use crate::{Gate, Network};

/// Cost of each gate type, used for supergates and as an optimization objective
///
/// Buffers, inputs and the constant are free.
/// This is obviously very inaccurate, and is meant to be used as an objective during logic optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostParameters {
    /// Cost of And2
    pub and: usize,
    /// Cost of Xor2
    pub xor: usize,
    /// Cost of Maj
    pub maj: usize,
}

impl CostParameters {
    /// Good default parameters for VLSI design
    ///
    /// In VLSI, And gates are cheap and easy to merge together, while Xor is more expensive.
    /// We use roughly the area the cells would use in a standard cell library.
    pub fn vlsi() -> CostParameters {
        CostParameters {
            and: 4,
            xor: 8,
            maj: 6,
        }
    }

    /// Good default parameters for FPGA design
    ///
    /// FPGAs represent all logic functions with LUTs, whose cost only depends on the number of inputs.
    pub fn fpga() -> CostParameters {
        CostParameters {
            and: 2,
            xor: 2,
            maj: 3,
        }
    }

    /// Every gate costs 1: the cost is the gate count
    pub fn unit() -> CostParameters {
        CostParameters {
            and: 1,
            xor: 1,
            maj: 1,
        }
    }

    /// Compute the area of a gate
    pub fn gate_area(&self, g: &Gate) -> usize {
        use Gate::*;
        match g {
            Binary(_, BinaryType::And) => self.and,
            Binary(_, BinaryType::Xor) => self.xor,
            Maj(_) => self.maj,
            Constant | Input(_) | Buf(_) => 0,
        }
    }

    /// Compute the area of a network
    pub fn area(&self, a: &Network) -> usize {
        (0..a.nb_nodes()).map(|i| self.gate_area(a.gate(i))).sum()
    }

    /// Perform a consistency check to verify that the parameters are consistent
    pub fn check(&self) {
        // Everything positive
        assert!(self.and > 0);
        assert!(self.xor > 0);
        assert!(self.maj > 0);

        // A Maj is never cheaper than the And it generalizes
        assert!(self.maj >= self.and);
    }
}

impl Default for CostParameters {
    fn default() -> Self {
        CostParameters::unit()
    }
}

impl fmt::Display for CostParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gate costs:")?;
        writeln!(f, "  And2: {}", self.and)?;
        writeln!(f, "  Xor2: {}", self.xor)?;
        writeln!(f, "  Maj: {}", self.maj)?;
        fmt::Result::Ok(())
    }
}
