//! NPN canonization of truth tables
//!
//! Two functions are NPN-equivalent if one is obtained from the other by negating inputs,
//! permuting inputs and negating the output. A canonizer maps every function of an
//! equivalence class to the same representative, and returns the transformation used.
//!
//! The transformation maps a function `f` to its representative `g` with
//! `g(y) = f(x) ^ out`, where `x[permutation[i]] = y[i] ^ neg_i`.

use itertools::Itertools;

use crate::truth_table::TruthTable;

/// Result of the canonization of a function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Canonization {
    /// Canonical representative
    pub table: TruthTable,
    /// Input negations in the low bits; bit `num_vars` is the output negation
    pub negation: u32,
    /// Variable `permutation[i]` of the function becomes variable `i` of the representative
    pub permutation: Vec<usize>,
}

impl Canonization {
    /// Identity transformation of a function
    pub fn identity(table: TruthTable) -> Canonization {
        Canonization {
            table,
            negation: 0,
            permutation: (0..table.num_vars()).collect(),
        }
    }

    /// Number of variables
    pub fn num_vars(&self) -> usize {
        self.permutation.len()
    }

    /// Returns whether the output is negated
    pub fn output_negated(&self) -> bool {
        (self.negation >> self.num_vars()) & 1 != 0
    }

    /// Input negation mask, without the output bit
    pub fn input_negation(&self) -> u32 {
        self.negation & ((1 << self.num_vars()) - 1)
    }

    /// Apply the input permutation and negations to another function, such as a care set
    pub fn apply_inputs(&self, t: &TruthTable) -> TruthTable {
        t.permute(&self.permutation).flip_mask(self.input_negation())
    }

    /// Apply the whole transformation to a function
    pub fn apply(&self, t: &TruthTable) -> TruthTable {
        let r = self.apply_inputs(t);
        if self.output_negated() {
            !r
        } else {
            r
        }
    }

    /// Inverse of the permutation: variable `i` of the function is variable `inverse[i]` of the representative
    pub fn inverse_permutation(&self) -> Vec<usize> {
        let mut ret = vec![0; self.num_vars()];
        for (i, p) in self.permutation.iter().enumerate() {
            ret[*p] = i;
        }
        ret
    }
}

/// Algorithm computing NPN representatives
pub trait Canonizer: Send + Sync {
    /// Compute the representative of a function, and the transformation to obtain it
    ///
    /// The result must be identical for all NPN-equivalent functions.
    fn canonize(&self, t: &TruthTable) -> Canonization;
}

/// Canonization by enumeration of the whole NPN group
///
/// The representative has its support on the first variables, and is the smallest such
/// table, comparing the bits as an integer. A function of `k` variables over `x0..x(k-1)` is
/// therefore represented over the same variables.
/// On ties, the first transformation in enumeration order is kept, so that the result is
/// deterministic and a representative is its own canonization by the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveCanonizer;

/// Variables of a function, as a bitmask
fn support(t: &TruthTable) -> u32 {
    (0..t.num_vars())
        .filter(|v| t.depends_on(*v))
        .fold(0, |m, v| m | (1 << v))
}

impl Canonizer for ExhaustiveCanonizer {
    fn canonize(&self, t: &TruthTable) -> Canonization {
        let n = t.num_vars();
        let vars = support(t);
        let mut best = Canonization::identity(*t);
        let mut best_key = (u32::MAX, u64::MAX);
        for perm in (0..n).permutations(n) {
            // Negations do not change the support of the permuted function
            let perm_support = perm
                .iter()
                .enumerate()
                .filter(|(_, p)| (vars >> **p) & 1 != 0)
                .fold(0, |m, (i, _)| m | (1u32 << i));
            if perm_support > best_key.0 {
                continue;
            }
            let permuted = t.permute(&perm);
            for neg in 0..(1u32 << n) {
                let flipped = permuted.flip_mask(neg);
                for out in [false, true] {
                    let candidate = if out { !flipped } else { flipped };
                    let key = (perm_support, candidate.bits());
                    if key < best_key {
                        best_key = key;
                        best = Canonization {
                            table: candidate,
                            negation: neg | ((out as u32) << n),
                            permutation: perm.clone(),
                        };
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::{support, Canonization, Canonizer, ExhaustiveCanonizer};
    use crate::truth_table::TruthTable;

    /// Ordering of the representatives: support first, then table
    fn representative_key(t: &TruthTable) -> (u32, u64) {
        (support(t), t.bits())
    }

    #[test]
    fn test_transformation() {
        let mut rng = SmallRng::seed_from_u64(1);
        for n in 0..=5 {
            for _ in 0..10 {
                let t = TruthTable::new(n, rng.gen());
                let c = ExhaustiveCanonizer.canonize(&t);
                assert_eq!(c.apply(&t), c.table);
                assert_eq!(c.num_vars(), n);
                assert!(representative_key(&c.table) <= representative_key(&t));
                assert_eq!(support(&c.table).count_ones(), support(&t).count_ones());
            }
        }
    }

    #[test]
    fn test_equivalent_functions() {
        let mut rng = SmallRng::seed_from_u64(2);
        for n in 1..=4 {
            for _ in 0..10 {
                let t = TruthTable::new(n, rng.gen());
                let c = ExhaustiveCanonizer.canonize(&t);
                // Random transformation of the same function
                let mut perm: Vec<usize> = (0..n).collect();
                for i in (1..n).rev() {
                    perm.swap(i, rng.gen_range(0..=i));
                }
                let other = Canonization {
                    table: t,
                    negation: rng.gen_range(0..(1 << (n + 1))),
                    permutation: perm,
                }
                .apply(&t);
                assert_eq!(ExhaustiveCanonizer.canonize(&other).table, c.table);
            }
        }
    }

    #[test]
    fn test_classes() {
        let a = TruthTable::nth_var(2, 0);
        let b = TruthTable::nth_var(2, 1);
        let and = ExhaustiveCanonizer.canonize(&(a & b)).table;
        assert_eq!(ExhaustiveCanonizer.canonize(&(a | b)).table, and);
        assert_eq!(ExhaustiveCanonizer.canonize(&(!a & b)).table, and);
        let xor = ExhaustiveCanonizer.canonize(&(a ^ b)).table;
        assert_ne!(xor, and);
        assert_eq!(ExhaustiveCanonizer.canonize(&!(a ^ b)).table, xor);
        // Two-input functions stay on the first two variables
        assert_eq!(xor, a ^ b);
        assert_eq!(and, !a & !b);
        // Constants are all the zero function
        assert_eq!(
            ExhaustiveCanonizer.canonize(&TruthTable::one(3)).table,
            TruthTable::zero(3)
        );
    }

    #[test]
    fn test_inverse_permutation() {
        let c = Canonization {
            table: TruthTable::zero(3),
            negation: 0,
            permutation: vec![2, 0, 1],
        };
        assert_eq!(c.inverse_permutation(), vec![1, 2, 0]);
    }

    #[test]
    fn test_representative_on_first_variables() {
        let vars: Vec<TruthTable> = (0..5).map(|i| TruthTable::nth_var(5, i)).collect();
        let xor = ExhaustiveCanonizer.canonize(&(vars[0] ^ vars[1]));
        assert_eq!(xor.table, vars[0] ^ vars[1]);
        assert_eq!(xor.negation, 0);
        assert_eq!(xor.permutation, vec![0, 1, 2, 3, 4]);

        // Same class from the last variables
        let moved = ExhaustiveCanonizer.canonize(&!(vars[3] ^ vars[4]));
        assert_eq!(moved.table, xor.table);
        assert_eq!(support(&moved.table), 0b11);

        // A representative is canonized by the identity
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..10 {
            let t = TruthTable::new(4, rng.gen());
            let c = ExhaustiveCanonizer.canonize(&t);
            let again = ExhaustiveCanonizer.canonize(&c.table);
            assert_eq!(again, Canonization::identity(c.table));
        }
    }
}
