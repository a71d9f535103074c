//! Truth tables of small functions, stored in a single 64-bit word
//!
//! Bit `k` of a table is the value of the function for the assignment where variable `i`
//! takes bit `i` of `k`: variable 0 toggles fastest.
//!
//! ```
//! # use supergate::truth_table::TruthTable;
//! let a = TruthTable::nth_var(2, 0);
//! let b = TruthTable::nth_var(2, 1);
//! assert_eq!((a ^ b).bits(), 0x6);
//! assert_eq!(format!("{}", a & b), "8");
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use volute::Lut;

/// Maximum number of variables of a truth table
pub const MAX_VARS: usize = 6;

/// Projection functions of the variables over 64 patterns, with variable 0 toggling fastest
pub const PROJECTIONS: [u64; MAX_VARS] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// Completely specified function of at most [`MAX_VARS`] variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TruthTable {
    num_vars: u8,
    bits: u64,
}

/// Mask of the valid bits for a number of variables
fn mask(num_vars: usize) -> u64 {
    if num_vars >= MAX_VARS {
        !0
    } else {
        (1u64 << (1 << num_vars)) - 1
    }
}

impl TruthTable {
    /// Create a table from its bits; bits outside the table are ignored
    pub fn new(num_vars: usize, bits: u64) -> TruthTable {
        assert!(num_vars <= MAX_VARS, "At most {MAX_VARS} variables are supported");
        TruthTable {
            num_vars: num_vars as u8,
            bits: bits & mask(num_vars),
        }
    }

    /// Constant zero function
    pub fn zero(num_vars: usize) -> TruthTable {
        TruthTable::new(num_vars, 0)
    }

    /// Constant one function
    pub fn one(num_vars: usize) -> TruthTable {
        TruthTable::new(num_vars, !0)
    }

    /// Projection function of a variable
    pub fn nth_var(num_vars: usize, var: usize) -> TruthTable {
        assert!(var < num_vars);
        TruthTable::new(num_vars, PROJECTIONS[var])
    }

    /// Number of variables
    pub fn num_vars(&self) -> usize {
        self.num_vars as usize
    }

    /// Number of bits in the table
    pub fn num_bits(&self) -> usize {
        1 << self.num_vars
    }

    /// Raw bits of the table
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Value of the function for an assignment
    pub fn get_bit(&self, k: usize) -> bool {
        assert!(k < self.num_bits());
        (self.bits >> k) & 1 != 0
    }

    /// Set the value of the function for an assignment
    pub fn set_bit(&mut self, k: usize, value: bool) {
        assert!(k < self.num_bits());
        if value {
            self.bits |= 1 << k;
        } else {
            self.bits &= !(1 << k);
        }
    }

    /// Returns whether the function is one everywhere
    pub fn is_one(&self) -> bool {
        self.bits == mask(self.num_vars())
    }

    /// Returns whether the function is zero everywhere
    pub fn is_zero(&self) -> bool {
        self.bits == 0
    }

    /// Returns whether the function depends on a variable
    pub fn depends_on(&self, var: usize) -> bool {
        self.flip(var) != *self
    }

    /// Same function over more variables; the new variables are not used
    pub fn extend_to(&self, num_vars: usize) -> TruthTable {
        assert!(num_vars >= self.num_vars());
        assert!(num_vars <= MAX_VARS);
        let mut bits = self.bits;
        for v in self.num_vars()..num_vars {
            bits |= bits << (1 << v);
        }
        TruthTable::new(num_vars, bits)
    }

    /// Complement a variable
    pub fn flip(&self, var: usize) -> TruthTable {
        assert!(var < self.num_vars());
        let shift = 1 << var;
        let hi = self.bits & PROJECTIONS[var];
        let lo = self.bits & !PROJECTIONS[var];
        TruthTable::new(self.num_vars(), (hi >> shift) | (lo << shift))
    }

    /// Complement the variables of a mask
    pub fn flip_mask(&self, negation: u32) -> TruthTable {
        let mut ret = *self;
        for v in 0..self.num_vars() {
            if (negation >> v) & 1 != 0 {
                ret = ret.flip(v);
            }
        }
        ret
    }

    /// Reorder the variables: variable `perm[i]` of this table becomes variable `i` of the result
    pub fn permute(&self, perm: &[usize]) -> TruthTable {
        assert_eq!(perm.len(), self.num_vars());
        let mut ret = TruthTable::zero(self.num_vars());
        for y in 0..self.num_bits() {
            let mut x = 0;
            for (i, p) in perm.iter().enumerate() {
                x |= ((y >> i) & 1) << p;
            }
            ret.set_bit(y, self.get_bit(x));
        }
        ret
    }

    /// Hexadecimal representation, most significant bit first
    pub fn to_hex(&self) -> String {
        let digits = (self.num_bits() / 4).max(1);
        format!("{:0digits$x}", self.bits)
    }

    /// Parse a hexadecimal representation, most significant bit first
    pub fn from_hex(num_vars: usize, s: &str) -> Result<TruthTable, String> {
        let lut = Lut::from_hex_string(num_vars, s)
            .map_err(|_| format!("Invalid truth table {s} for {num_vars} variables"))?;
        Ok(TruthTable::from_lut(&lut))
    }

    /// Convert from a [`volute::Lut`]
    pub fn from_lut(lut: &Lut) -> TruthTable {
        let num_vars = lut.num_vars();
        let mut ret = TruthTable::zero(num_vars);
        for k in 0..ret.num_bits() {
            ret.set_bit(k, lut.value(k));
        }
        ret
    }

    /// Convert to a [`volute::Lut`]
    pub fn to_lut(&self) -> Lut {
        Lut::from_hex_string(self.num_vars(), &self.to_hex())
            .expect("hexadecimal representation is always valid")
    }
}

impl Not for TruthTable {
    type Output = TruthTable;
    fn not(self) -> TruthTable {
        TruthTable::new(self.num_vars(), !self.bits)
    }
}

impl BitAnd for TruthTable {
    type Output = TruthTable;
    fn bitand(self, rhs: TruthTable) -> TruthTable {
        assert_eq!(self.num_vars, rhs.num_vars);
        TruthTable::new(self.num_vars(), self.bits & rhs.bits)
    }
}

impl BitOr for TruthTable {
    type Output = TruthTable;
    fn bitor(self, rhs: TruthTable) -> TruthTable {
        assert_eq!(self.num_vars, rhs.num_vars);
        TruthTable::new(self.num_vars(), self.bits | rhs.bits)
    }
}

impl BitXor for TruthTable {
    type Output = TruthTable;
    fn bitxor(self, rhs: TruthTable) -> TruthTable {
        assert_eq!(self.num_vars, rhs.num_vars);
        TruthTable::new(self.num_vars(), self.bits ^ rhs.bits)
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Incompletely specified function: the onset only matters inside the care set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TernaryTable {
    onset: TruthTable,
    care: TruthTable,
}

impl TernaryTable {
    /// Create from an onset and a care set; the onset is masked by the care set
    pub fn new(onset: TruthTable, care: TruthTable) -> TernaryTable {
        TernaryTable {
            onset: onset & care,
            care,
        }
    }

    /// Completely specified function
    pub fn full(onset: TruthTable) -> TernaryTable {
        TernaryTable {
            onset,
            care: TruthTable::one(onset.num_vars()),
        }
    }

    /// Values of the function, zero outside the care set
    pub fn onset(&self) -> TruthTable {
        self.onset
    }

    /// Care set
    pub fn care(&self) -> TruthTable {
        self.care
    }

    /// Number of variables
    pub fn num_vars(&self) -> usize {
        self.onset.num_vars()
    }

    /// Returns whether every assignment is cared for
    pub fn is_complete(&self) -> bool {
        self.care.is_one()
    }

    /// Returns whether a function agrees with this one on the care set
    pub fn is_compatible(&self, f: &TruthTable) -> bool {
        ((*f ^ self.onset) & self.care).is_zero()
    }

    /// Same function over more variables
    pub fn extend_to(&self, num_vars: usize) -> TernaryTable {
        TernaryTable {
            onset: self.onset.extend_to(num_vars),
            care: self.care.extend_to(num_vars),
        }
    }
}

impl fmt::Display for TernaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (care {})", self.onset, self.care)
    }
}

#[cfg(test)]
mod tests {
    use super::{TernaryTable, TruthTable, MAX_VARS};

    #[test]
    fn test_basic() {
        let a = TruthTable::nth_var(3, 0);
        let b = TruthTable::nth_var(3, 1);
        let c = TruthTable::nth_var(3, 2);
        assert_eq!(a.bits(), 0xAA);
        assert_eq!(b.bits(), 0xCC);
        assert_eq!(c.bits(), 0xF0);
        assert_eq!((!a).bits(), 0x55);
        assert_eq!((a & b & c).bits(), 0x80);
        assert_eq!((a | b).bits(), 0xEE);
        assert!(TruthTable::one(3).is_one());
        assert!(TruthTable::zero(3).is_zero());
        assert_eq!(TruthTable::one(2).bits(), 0xF);
        assert_eq!(TruthTable::one(6).bits(), !0);
        assert!(a.get_bit(1));
        assert!(!a.get_bit(2));
        let mut t = a;
        t.set_bit(2, true);
        t.set_bit(1, false);
        assert_eq!(t.bits(), 0xA8);
    }

    #[test]
    fn test_extend() {
        let x = TruthTable::nth_var(2, 0) ^ TruthTable::nth_var(2, 1);
        let e = x.extend_to(5);
        assert_eq!(e, TruthTable::nth_var(5, 0) ^ TruthTable::nth_var(5, 1));
        assert_eq!(TruthTable::one(0).extend_to(3), TruthTable::one(3));
        assert_eq!(
            TruthTable::nth_var(4, 3).extend_to(MAX_VARS),
            TruthTable::nth_var(MAX_VARS, 3)
        );
    }

    #[test]
    fn test_flip() {
        for n in 1..=MAX_VARS {
            for v in 0..n {
                let x = TruthTable::nth_var(n, v);
                assert_eq!(x.flip(v), !x);
                assert!(x.depends_on(v));
                for w in 0..n {
                    if w != v {
                        assert_eq!(x.flip(w), x);
                        assert!(!x.depends_on(w));
                    }
                }
            }
        }
        let and = TruthTable::nth_var(2, 0) & TruthTable::nth_var(2, 1);
        assert_eq!(and.flip_mask(0b11).bits(), 0x1);
    }

    #[test]
    fn test_permute() {
        let n = 4;
        let vars: Vec<TruthTable> = (0..n).map(|i| TruthTable::nth_var(n, i)).collect();
        let f = (vars[0] & vars[1]) | vars[3];
        // Variable perm[i] becomes variable i
        let perm = [3, 0, 1, 2];
        let g = f.permute(&perm);
        assert_eq!(g, (vars[1] & vars[2]) | vars[0]);
        assert_eq!(f.permute(&[0, 1, 2, 3]), f);
    }

    #[test]
    fn test_hex() {
        let f = TruthTable::nth_var(4, 0) & TruthTable::nth_var(4, 3);
        assert_eq!(f.to_hex(), "aa00");
        assert_eq!(TruthTable::from_hex(4, "aa00"), Ok(f));
        assert_eq!(TruthTable::from_lut(&f.to_lut()), f);
        assert!(TruthTable::from_hex(4, "zz").is_err());
    }

    #[test]
    fn test_ternary() {
        let a = TruthTable::nth_var(2, 0);
        let b = TruthTable::nth_var(2, 1);
        let t = TernaryTable::new(a & b, a);
        assert_eq!(t.onset(), a & b);
        assert!(!t.is_complete());
        assert!(t.is_compatible(&(a & b)));
        assert!(t.is_compatible(&b));
        assert!(!t.is_compatible(&a));
        assert!(TernaryTable::full(a).is_complete());
        assert_eq!(t.extend_to(3).care(), TruthTable::nth_var(3, 0));
        // Onset is masked by the care set
        let u = TernaryTable::new(b, a);
        assert_eq!(u.onset(), a & b);
    }
}
