use core::slice;
use std::{cmp, fmt};

use crate::network::signal::Signal;
use crate::sim::SimulationValue;

/// Basic types of 2-input gates
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BinaryType {
    /// 2-input And gate
    And,
    /// 2-input Xor gate
    Xor,
}

/// Logic gate representation
///
/// Logic gates have a canonical form.
/// The canonical form is unique, making it easier to simplify and deduplicate
/// the logic. Inputs and output may be negated, and constant inputs are simplified.
///
/// Canonical form includes:
///   * And gates (with optional negated inputs)
///   * Xor gates (no negated input)
///   * Maj gates (first input not negated)
///
/// Buf and trivial gates are omitted.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Gate {
    /// The constant zero, always node 0
    Constant,
    /// Primary input, with its ordinal
    Input(u32),
    /// Arbitrary 2-input gate (And/Xor)
    Binary([Signal; 2], BinaryType),
    /// Majority gate (a + b + c >= 2)
    Maj([Signal; 3]),
    /// Buf or Not, left behind by substitution until the next cleanup
    Buf(Signal),
}

/// Result of normalizing a logic gate
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Normalization {
    /// A gate, with an optional inverted output
    Node(Gate, bool),
    /// The trivial case, where the gate reduces to a single signal or constant
    Copy(Signal),
}

impl Gate {
    /// Create a 2-input And
    pub fn and(a: Signal, b: Signal) -> Gate {
        Gate::Binary([a, b], BinaryType::And)
    }

    /// Create a 2-input Xor
    pub fn xor(a: Signal, b: Signal) -> Gate {
        Gate::Binary([a, b], BinaryType::Xor)
    }

    /// Create a Maj
    pub fn maj(a: Signal, b: Signal, c: Signal) -> Gate {
        Gate::Maj([a, b, c])
    }

    /// Returns whether the gate is in canonical form
    pub fn is_canonical(&self) -> bool {
        use Gate::*;
        match self {
            Constant | Input(_) => true,
            Binary([a, b], BinaryType::And) => sorted_2(*a, *b) && !a.is_constant(),
            Binary([a, b], BinaryType::Xor) => {
                sorted_2(*a, *b) && !a.is_constant() && no_inv_2(*a, *b)
            }
            Maj([a, b, c]) => sorted_3(*a, *b, *c) && !a.is_constant() && !a.is_inverted(),
            Buf(_) => false,
        }
    }

    /// Obtain the canonical form of the gate
    pub fn make_canonical(&self) -> Normalization {
        Normalization::Node(*self, false).make_canonical()
    }

    /// Obtain all signals feeding this gate
    pub fn dependencies(&self) -> &[Signal] {
        use Gate::*;
        match self {
            Constant | Input(_) => &[],
            Binary(s, _) => s,
            Maj(s) => s,
            Buf(s) => slice::from_ref(s),
        }
    }

    /// Obtain all nodes feeding this gate, the constant excluded
    pub fn fanins(&self) -> impl Iterator<Item = u32> + '_ {
        self.dependencies()
            .iter()
            .filter(|s| !s.is_constant())
            .map(|s| s.node())
    }

    /// Returns whether the gate is a primary input
    pub fn is_input(&self) -> bool {
        matches!(self, Gate::Input(_))
    }

    /// Returns whether the gate is the constant node
    pub fn is_constant(&self) -> bool {
        matches!(self, Gate::Constant)
    }

    /// Returns whether the gate is a logic gate (And, Xor or Maj)
    pub fn is_logic(&self) -> bool {
        matches!(self, Gate::Binary(_, _) | Gate::Maj(_))
    }

    /// Returns whether the gate is a 2-input And
    pub fn is_and(&self) -> bool {
        matches!(self, Gate::Binary(_, BinaryType::And))
    }

    /// Returns whether the gate is a 2-input Xor
    pub fn is_xor(&self) -> bool {
        matches!(self, Gate::Binary(_, BinaryType::Xor))
    }

    /// Returns whether the gate is a Maj
    pub fn is_maj(&self) -> bool {
        matches!(self, Gate::Maj(_))
    }

    /// Returns whether the gate is a Buf
    pub fn is_buf(&self) -> bool {
        matches!(self, Gate::Buf(_))
    }

    /// Compute the value of the gate from the values of its fanin nodes
    ///
    /// `values` holds the value of the node behind each dependency, in order;
    /// edge complements are applied here. Primary inputs have no computable value.
    pub fn compute<V: SimulationValue>(&self, values: &[V]) -> V {
        use Gate::*;
        let deps = self.dependencies();
        assert_eq!(deps.len(), values.len(), "Wrong number of fanin values");
        let v = |i: usize| -> V {
            if deps[i].is_inverted() {
                !values[i]
            } else {
                values[i]
            }
        };
        match self {
            Constant => V::default(),
            Input(i) => panic!("Primary input {i} has no computable value"),
            Binary(_, BinaryType::And) => v(0) & v(1),
            Binary(_, BinaryType::Xor) => v(0) ^ v(1),
            Maj(_) => {
                let (a, b, c) = (v(0), v(1), v(2));
                (a & b) | (a & c) | (b & c)
            }
            Buf(_) => v(0),
        }
    }

    /// Apply a remapping of the signals to the gate
    pub(crate) fn remap<F: Fn(&Signal) -> Signal>(&self, t: F) -> Gate {
        use Gate::*;
        match self {
            Constant => Constant,
            Input(i) => Input(*i),
            Binary([a, b], tp) => Binary([t(a), t(b)], *tp),
            Maj([a, b, c]) => Maj([t(a), t(b), t(c)]),
            Buf(s) => Buf(t(s)),
        }
    }

    /// Apply a translation of node indices to the gate
    pub(crate) fn remap_order(&self, t: &[Signal]) -> Gate {
        self.remap(|s: &Signal| s.remap(t))
    }
}

/// Normalize an And
fn make_and(a: Signal, b: Signal, inv: bool) -> Normalization {
    use Gate::*;
    use Normalization::*;
    let (i0, i1) = sort_2(a, b);
    if i0 == Signal::zero() || i0 == !i1 {
        Copy(Signal::zero() ^ inv)
    } else if i0 == Signal::one() || i0 == i1 {
        Copy(i1 ^ inv)
    } else {
        Node(Binary([i0, i1], BinaryType::And), inv)
    }
}

/// Normalize a Xor
fn make_xor(a: Signal, b: Signal, inv: bool) -> Normalization {
    use Gate::*;
    use Normalization::*;
    let new_inv = a.is_inverted() ^ b.is_inverted() ^ inv;
    let (i0, i1) = sort_2(a.without_inversion(), b.without_inversion());
    if i0 == Signal::zero() {
        Copy(i1 ^ new_inv)
    } else if i0 == i1 {
        Copy(Signal::from(new_inv))
    } else {
        Node(Binary([i0, i1], BinaryType::Xor), new_inv)
    }
}

/// Normalize a Maj
fn make_maj(a: Signal, b: Signal, c: Signal, inv: bool) -> Normalization {
    use Gate::*;
    use Normalization::*;
    let (i0, i1, i2) = sort_3(a, b, c);
    if i0 == !i1 || i1 == i2 {
        Copy(i2 ^ inv)
    } else if i1 == !i2 || i0 == i1 {
        Copy(i0 ^ inv)
    } else if i0.is_inverted() {
        // The order is unchanged and complementary pairs are already gone
        make_maj(!i0, !i1, !i2, !inv)
    } else if i0 == Signal::zero() {
        make_and(i1, i2, inv)
    } else {
        Node(Maj([i0, i1, i2]), inv)
    }
}

impl Normalization {
    /// Returns whether the normalization is canonical
    pub fn is_canonical(&self) -> bool {
        use Normalization::*;
        match self {
            Copy(_) => true,
            Node(g, _) => g.is_canonical(),
        }
    }

    /// Apply the normalization algorithm
    pub fn make_canonical(&self) -> Self {
        use Gate::*;
        use Normalization::*;
        match self {
            Copy(s) => Copy(*s),
            Node(g, inv) => match g {
                Constant => Copy(Signal::zero() ^ *inv),
                Input(_) => *self,
                Binary([a, b], BinaryType::And) => make_and(*a, *b, *inv),
                Binary([a, b], BinaryType::Xor) => make_xor(*a, *b, *inv),
                Maj([a, b, c]) => make_maj(*a, *b, *c, *inv),
                Buf(s) => Copy(*s ^ *inv),
            },
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Gate::*;
        match self {
            Constant => write!(f, "0"),
            Input(i) => write!(f, "i{i}"),
            Binary([a, b], BinaryType::And) => {
                write!(f, "{a} & {b}")
            }
            Binary([a, b], BinaryType::Xor) => {
                write!(f, "{a} ^ {b}")
            }
            Maj([a, b, c]) => {
                write!(f, "Maj({a}, {b}, {c})")
            }
            Buf(s) => {
                write!(f, "{s}")
            }
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Normalization::*;
        match self {
            Copy(s) => write!(f, "{s}"),
            Node(g, inv) => {
                if *inv {
                    write!(f, "!(")?;
                }
                write!(f, "{g}")?;
                if *inv {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

fn sorted_2(a: Signal, b: Signal) -> bool {
    a.node() < b.node()
}

fn sorted_3(a: Signal, b: Signal, c: Signal) -> bool {
    a.node() < b.node() && b.node() < c.node()
}

fn no_inv_2(a: Signal, b: Signal) -> bool {
    !a.is_inverted() && !b.is_inverted()
}

fn sort_2(a: Signal, b: Signal) -> (Signal, Signal) {
    (cmp::min(a, b), cmp::max(a, b))
}

fn sort_3(a: Signal, b: Signal, c: Signal) -> (Signal, Signal, Signal) {
    let (mut i0, mut i1, mut i2) = (a, b, c);
    (i1, i2) = sort_2(i1, i2);
    (i0, i1) = sort_2(i0, i1);
    (i1, i2) = sort_2(i1, i2);
    (i0, i1, i2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Gate::*;
    use Normalization::*;

    fn check_canonization(n: Gate) {
        let e0 = Node(n, false);
        let e1 = Node(n, true);
        let c0 = e0.make_canonical();
        let c1 = e1.make_canonical();
        assert!(c0.is_canonical(), "Canonization is wrong: {e0} to {c0}");
        assert!(c1.is_canonical(), "Canonization is wrong: {e1} to {c1}");

        match (c0, c1) {
            (Copy(s0), Copy(s1)) => assert_eq!(s0, !s1),
            (Node(g0, i0), Node(g1, i1)) => {
                assert_eq!(g0, g1);
                assert_eq!(i0, !i1);
            }
            _ => panic!("Canonization of complements resulted in different gates"),
        }
    }

    /// Evaluate a normalization with node i holding bit i of the assignment
    fn eval(n: &Normalization, assignment: u32) -> bool {
        let value = |s: &Signal| -> bool {
            let v = s.node() != 0 && (assignment >> s.node()) & 1 != 0;
            v ^ s.is_inverted()
        };
        match n {
            Copy(s) => value(s),
            Node(g, inv) => {
                let vals: Vec<bool> = g
                    .dependencies()
                    .iter()
                    .map(|s| value(&s.without_inversion()))
                    .collect();
                g.compute(&vals) ^ inv
            }
        }
    }

    fn vars() -> Vec<Signal> {
        let mut vars = vec![Signal::zero(), Signal::one()];
        for i in 1..4 {
            for b in [false, true] {
                vars.push(Signal::from_node(i) ^ b);
            }
        }
        vars
    }

    #[test]
    fn test_make_canonical() {
        let vars = vars();
        for i0 in vars.iter() {
            check_canonization(Buf(*i0));
            for i1 in vars.iter() {
                check_canonization(Gate::and(*i0, *i1));
                check_canonization(Gate::xor(*i0, *i1));
                for i2 in vars.iter() {
                    check_canonization(Gate::maj(*i0, *i1, *i2));
                }
            }
        }
        check_canonization(Constant);
        check_canonization(Input(3));
    }

    #[test]
    fn test_canonical_preserves_function() {
        let vars = vars();
        for i0 in vars.iter() {
            for i1 in vars.iter() {
                for i2 in vars.iter() {
                    for g in [
                        Gate::and(*i0, *i1),
                        Gate::xor(*i0, *i1),
                        Gate::maj(*i0, *i1, *i2),
                    ] {
                        let orig = Node(g, false);
                        let canon = orig.make_canonical();
                        for a in 0..16 {
                            assert_eq!(eval(&orig, a), eval(&canon, a), "{orig} vs {canon}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_compute() {
        let a = Signal::from_node(1);
        let b = Signal::from_node(2);
        let c = Signal::from_node(3);
        let (va, vb, vc) = (0xF0u8, 0xCCu8, 0xAAu8);
        assert_eq!(Gate::and(a, b).compute(&[va, vb]), va & vb);
        assert_eq!(Gate::and(a, !b).compute(&[va, vb]), va & !vb);
        assert_eq!(Gate::xor(!a, b).compute(&[va, vb]), !va ^ vb);
        assert_eq!(Gate::maj(a, b, c).compute(&[va, vb, vc]), 0xE8);
        assert_eq!(Gate::maj(a, !b, c).compute(&[va, vb, vc]), 0xB2);
        assert_eq!(Buf(!c).compute(&[vc]), !vc);
        assert_eq!(Constant.compute::<u8>(&[]), 0);
        assert!(!Constant.compute::<bool>(&[]));
    }

    #[test]
    fn test_and_is_canonical() {
        let l0 = Signal::zero();
        let l1 = Signal::one();
        let i0 = Signal::from_node(1);
        let i1 = Signal::from_node(2);

        // Everything OK
        assert!(Gate::and(i0, i1).is_canonical());
        assert!(Gate::and(i0, !i1).is_canonical());
        assert!(Gate::and(!i0, i1).is_canonical());
        assert!(Gate::and(!i0, !i1).is_canonical());

        // Wrong ordering
        assert!(!Gate::and(i1, i0).is_canonical());
        assert!(!Gate::and(!i1, !i0).is_canonical());

        // Constant
        assert!(!Gate::and(l0, i1).is_canonical());
        assert!(!Gate::and(l1, i1).is_canonical());

        // Repetition
        assert!(!Gate::and(i0, i0).is_canonical());
        assert!(!Gate::and(i0, !i0).is_canonical());
    }

    #[test]
    fn test_xor_is_canonical() {
        let l0 = Signal::zero();
        let i0 = Signal::from_node(1);
        let i1 = Signal::from_node(2);

        assert!(Gate::xor(i0, i1).is_canonical());
        assert!(!Gate::xor(i1, i0).is_canonical());
        assert!(!Gate::xor(i0, !i1).is_canonical());
        assert!(!Gate::xor(!i0, i1).is_canonical());
        assert!(!Gate::xor(l0, i1).is_canonical());
        assert!(!Gate::xor(i0, i0).is_canonical());
    }

    #[test]
    fn test_maj_is_canonical() {
        let l0 = Signal::zero();
        let l1 = Signal::one();
        let i0 = Signal::from_node(1);
        let i1 = Signal::from_node(2);
        let i2 = Signal::from_node(3);

        // Everything OK
        assert!(Gate::maj(i0, i1, i2).is_canonical());
        assert!(Gate::maj(i0, !i1, i2).is_canonical());
        assert!(Gate::maj(i0, !i1, !i2).is_canonical());

        // Wrong ordering
        assert!(!Gate::maj(i0, i2, i1).is_canonical());
        assert!(!Gate::maj(i1, i0, i2).is_canonical());

        // Constant
        assert!(!Gate::maj(l0, i1, i2).is_canonical());
        assert!(!Gate::maj(l1, i1, i2).is_canonical());

        // Wrong polarity
        assert!(!Gate::maj(!i0, i1, i2).is_canonical());
        assert!(!Gate::maj(!i0, !i1, !i2).is_canonical());

        // Repetition
        assert!(!Gate::maj(i0, i0, i2).is_canonical());
        assert!(!Gate::maj(i0, !i0, i2).is_canonical());
    }

    #[test]
    fn test_maj_with_constant_becomes_and() {
        let a = Signal::from_node(1);
        let b = Signal::from_node(2);
        assert_eq!(
            Gate::maj(Signal::zero(), a, b).make_canonical(),
            Node(Gate::and(a, b), false)
        );
        assert_eq!(
            Gate::maj(Signal::one(), a, b).make_canonical(),
            Node(Gate::and(!a, !b), true)
        );
    }

    #[test]
    fn test_representation_size() {
        assert!(std::mem::size_of::<Gate>() <= 4 * std::mem::size_of::<Signal>());
    }
}
