//! Simulation of a logic network
//!
//! Simulation is bit-parallel: with 64-bit words, 64 patterns are evaluated at once.
//! With at most 6 inputs, the projections of [`projections`] give the complete truth table
//! of every node in a single pass.

use std::ops::{BitAnd, BitOr, BitXor, Not};

use crate::truth_table::{MAX_VARS, PROJECTIONS};
use crate::{Network, Signal};

/// Value that can be propagated through the gates of a network
///
/// `Default` is the all-zero value.
pub trait SimulationValue:
    Copy
    + Default
    + PartialEq
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
{
}

impl<T> SimulationValue for T where
    T: Copy
        + Default
        + PartialEq
        + Not<Output = Self>
        + BitAnd<Output = Self>
        + BitOr<Output = Self>
        + BitXor<Output = Self>
{
}

/// Value of a signal given the value of its node
pub fn signal_value<V: SimulationValue>(node_values: &[V], s: Signal) -> V {
    let v = node_values[s.index()];
    if s.is_inverted() {
        !v
    } else {
        v
    }
}

/// Projection functions of the first `nb_vars` variables, with variable 0 toggling fastest
pub fn projections(nb_vars: usize) -> Vec<u64> {
    assert!(nb_vars <= MAX_VARS, "At most 6 variables fit in 64 patterns");
    PROJECTIONS[..nb_vars].to_vec()
}

/// Simulate a topologically sorted network; return the value of every node
pub fn simulate_nodes<V: SimulationValue>(a: &Network, input_values: &[V]) -> Vec<V> {
    assert!(a.is_topo_sorted(), "Simulation requires a topologically sorted network");
    assert_eq!(input_values.len(), a.nb_inputs());
    let mut values = vec![V::default(); a.nb_nodes()];
    for (k, v) in input_values.iter().enumerate() {
        values[a.input(k).index()] = *v;
    }
    let mut fanin_values = Vec::with_capacity(3);
    for i in 0..a.nb_nodes() {
        let g = a.gate(i);
        if g.is_input() || g.is_constant() {
            continue;
        }
        fanin_values.clear();
        fanin_values.extend(g.dependencies().iter().map(|s| values[s.index()]));
        values[i] = g.compute(&fanin_values);
    }
    values
}

/// Simulate a network with 64b inputs; return the output values
pub fn simulate_words(a: &Network, input_values: &[u64]) -> Vec<u64> {
    let values = simulate_nodes(a, input_values);
    a.outputs()
        .iter()
        .map(|s| signal_value(&values, *s))
        .collect()
}

/// Simulate a network over multiple patterns; return the output values
pub fn simulate(a: &Network, input_values: &[Vec<bool>]) -> Vec<Vec<bool>> {
    input_values
        .iter()
        .map(|v| {
            let values = simulate_nodes(a, v);
            a.outputs()
                .iter()
                .map(|s| signal_value(&values, *s))
                .collect()
        })
        .collect()
}
