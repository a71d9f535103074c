//! Network generators and templates

/// Adder generators
pub mod adder {
    use crate::network::NetworkKind;
    use crate::{Network, Signal};

    /// A simple and slow ripple-carry adder
    pub fn ripple_carry(kind: NetworkKind, len: usize) -> Network {
        let mut ret = Network::new(kind);
        let mut c = Signal::zero();
        for _ in 0..len {
            let a = ret.add_input();
            let b = ret.add_input();
            let next_c = ret.maj(a, b, c);
            let o = ret.xor_n(&[a, b, c]);
            ret.add_output(o);
            c = next_c;
        }
        ret.add_output(c);
        ret.check();
        ret
    }
}

/// Carry chain generators
pub mod carry_chain {
    use crate::network::NetworkKind;
    use crate::{Network, Signal};

    /// A simple and slow ripple-carry chain
    pub fn ripple_carry(kind: NetworkKind, len: usize) -> Network {
        let mut ret = Network::new(kind);
        let mut c = Signal::zero();
        for _ in 0..len {
            let propagate = ret.add_input();
            let generate = ret.add_input();
            let d = ret.and(propagate, c);
            c = ret.or(generate, d);
            ret.add_output(c);
        }
        ret
    }
}

/// Random networks, to test algorithms on unstructured logic
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::network::NetworkKind;
    use crate::{Network, Signal};

    /// A random network, with gates of the kind picking their fanins among previous signals
    ///
    /// The result is deterministic for a given seed.
    pub fn random_logic(
        kind: NetworkKind,
        nb_inputs: usize,
        nb_gates: usize,
        nb_outputs: usize,
        seed: u64,
    ) -> Network {
        assert!(nb_inputs > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = Network::new(kind);
        let mut sigs: Vec<Signal> = ret.add_inputs(nb_inputs);
        for _ in 0..nb_gates {
            let pick = |rng: &mut SmallRng| -> Signal {
                // Favour recent signals to obtain deeper logic
                let lo = sigs.len().saturating_sub(3 * nb_inputs);
                sigs[rng.gen_range(lo..sigs.len())] ^ rng.gen_bool(0.5)
            };
            let a = pick(&mut rng);
            let b = pick(&mut rng);
            let s = match kind {
                NetworkKind::Aig => ret.and(a, b),
                NetworkKind::Xag => {
                    if rng.gen_bool(0.3) {
                        ret.xor(a, b)
                    } else {
                        ret.and(a, b)
                    }
                }
                NetworkKind::Mig => {
                    let c = if rng.gen_bool(0.3) {
                        Signal::from(rng.gen_bool(0.5))
                    } else {
                        pick(&mut rng)
                    };
                    ret.maj(a, b, c)
                }
            };
            if !s.is_constant() {
                sigs.push(s.without_inversion());
            }
        }
        for _ in 0..nb_outputs {
            let lo = sigs.len().saturating_sub(nb_outputs.max(1));
            let o = sigs[rng.gen_range(lo..sigs.len())] ^ rng.gen_bool(0.5);
            ret.add_output(o);
        }
        ret.check();
        ret
    }
}
