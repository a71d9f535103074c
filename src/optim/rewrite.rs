//! Cut-based rewriting with precomputed structures
//!
//! Each logic node is visited in topological order. A cut of at most [`NUM_VARS`] leaves is
//! computed for the node, and the function of the cone is looked up in the library. The cone is
//! replaced by the cheapest matching supergate if it saves area, counting the nodes that would
//! be freed by the replacement.

use log::debug;

use crate::database::{DatabaseManager, Library, RewriteError, NUM_VARS};
use crate::network::cost::CostParameters;
use crate::sim::projections;
use crate::truth_table::{TernaryTable, TruthTable};
use crate::view::{LevelParameters, LevelView};
use crate::{Network, Signal};

/// Parameters of the rewriting pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriteParameters {
    /// Accept replacements that do not change the area
    pub allow_zero_gain: bool,
    /// Reject replacements that would increase the depth of the network
    pub preserve_depth: bool,
}

impl Default for RewriteParameters {
    fn default() -> Self {
        RewriteParameters {
            allow_zero_gain: false,
            preserve_depth: true,
        }
    }
}

/// Find a cut of the node with at most [`NUM_VARS`] leaves
///
/// The leaf with the highest index is expanded first, as long as the cut stays small enough.
/// The network must be topologically sorted.
fn find_cut(ntk: &Network, node: usize) -> Vec<usize> {
    let mut leaves: Vec<usize> = ntk.gate(node).fanins().map(|f| f as usize).collect();
    leaves.sort();
    leaves.dedup();
    'expand: loop {
        for i in (0..leaves.len()).rev() {
            let l = leaves[i];
            let g = ntk.gate(l);
            if !g.is_logic() {
                continue;
            }
            let mut next: Vec<usize> = leaves
                .iter()
                .copied()
                .filter(|x| *x != l)
                .chain(g.fanins().map(|f| f as usize))
                .collect();
            next.sort();
            next.dedup();
            if next.len() <= NUM_VARS {
                leaves = next;
                continue 'expand;
            }
        }
        return leaves;
    }
}

/// Compute the function of the cone of a node, with the leaves as variables
fn cone_function(ntk: &Network, node: usize, leaves: &[usize]) -> TruthTable {
    let mut values = vec![None; node + 1];
    values[0] = Some(0u64);
    for (l, v) in leaves.iter().zip(projections(leaves.len())) {
        values[*l] = Some(v);
    }
    let mut to_visit = vec![node];
    while let Some(&n) = to_visit.last() {
        if values[n].is_some() {
            to_visit.pop();
            continue;
        }
        let g = ntk.gate(n);
        let pending: Vec<usize> = g
            .dependencies()
            .iter()
            .map(|s| s.index())
            .filter(|f| values[*f].is_none())
            .collect();
        if pending.is_empty() {
            to_visit.pop();
            let fanin_values: Vec<u64> = g
                .dependencies()
                .iter()
                .map(|s| values[s.index()].unwrap_or(0))
                .collect();
            values[n] = Some(g.compute(&fanin_values));
        } else {
            to_visit.extend(pending);
        }
    }
    TruthTable::new(leaves.len(), values[node].unwrap_or(0))
}

/// Remove the references of a node to its fanins; return the area of the nodes freed
fn deref_area(
    ntk: &Network,
    fanouts: &mut [u32],
    node: usize,
    leaves: &[usize],
    costs: &CostParameters,
) -> usize {
    let g = ntk.gate(node);
    let mut area = costs.gate_area(g);
    for f in g.fanins() {
        let f = f as usize;
        assert!(fanouts[f] > 0);
        fanouts[f] -= 1;
        if fanouts[f] == 0 && !leaves.contains(&f) && ntk.gate(f).is_logic() {
            area += deref_area(ntk, fanouts, f, leaves, costs);
        }
    }
    area
}

/// Restore the references removed by [`deref_area`]
fn ref_area(ntk: &Network, fanouts: &mut [u32], node: usize, leaves: &[usize]) {
    for f in ntk.gate(node).fanins() {
        let f = f as usize;
        if fanouts[f] == 0 && !leaves.contains(&f) && ntk.gate(f).is_logic() {
            ref_area(ntk, fanouts, f, leaves);
        }
        fanouts[f] += 1;
    }
}

/// Latest level of each node that keeps the depth of the network, with unit delays
fn required_levels(ntk: &Network, depth: usize) -> Vec<usize> {
    let mut ret = vec![usize::MAX; ntk.nb_nodes()];
    for s in ntk.outputs() {
        ret[s.index()] = depth;
    }
    for n in (0..ntk.nb_nodes()).rev() {
        let g = ntk.gate(n);
        if ret[n] == usize::MAX || !g.is_logic() {
            continue;
        }
        let r = ret[n].saturating_sub(1);
        for f in g.fanins() {
            ret[f as usize] = ret[f as usize].min(r);
        }
    }
    ret
}

/// Rewrite a network with the structures of a library
///
/// The network is rebuilt node by node. Replacements are accepted if they reduce the area, with
/// the costs of the library. With `preserve_depth`, critical nodes may not get a higher level and
/// other nodes may not exceed their slack, so that the depth never increases.
///
/// The area of the result is never larger than the area of the network. Fails if the library
/// uses gates that are not allowed in the network.
pub fn rewrite(
    ntk: &Network,
    library: &Library,
    params: &RewriteParameters,
) -> Result<Network, RewriteError> {
    let mut manager = DatabaseManager::new(library, ntk.kind().into())?;
    let costs = *library.costs();

    let mut src = ntk.clone();
    src.cleanup();
    let (critical, depth) = {
        let view = LevelView::<u64>::new(&mut src, LevelParameters::unit());
        let critical: Vec<bool> = (0..view.network().nb_nodes())
            .map(|n| view.is_critical(n))
            .collect();
        (critical, view.depth())
    };
    let required = required_levels(&src, depth);
    let mut fanouts = src.fanout_counts();

    let mut ret = Network::new(src.kind());
    let mut translation = vec![Signal::zero(); src.nb_nodes()];
    for i in 0..src.nb_inputs() {
        translation[src.input(i).index()] = ret.add_input();
    }

    let mut nb_rewritten = 0;
    {
        let mut view = LevelView::<u64>::new(&mut ret, LevelParameters::unit());
        for n in 0..src.nb_nodes() {
            let g = src.gate(n);
            if !g.is_logic() {
                continue;
            }
            let copy = view.add(g.remap_order(&translation));
            translation[n] = copy;

            let leaves = find_cut(&src, n);
            let function = cone_function(&src, n, &leaves);
            let Some(m) = manager.lookup(&TernaryTable::full(function)) else {
                continue;
            };
            let area = deref_area(&src, &mut fanouts, n, &leaves, &costs);
            ref_area(&src, &mut fanouts, n, &leaves);

            let signals: Vec<Signal> = leaves.iter().map(|l| translation[*l]).collect();
            let leaf_level = signals
                .iter()
                .map(|s| view.level(s.index()))
                .max()
                .unwrap_or(0);
            let max_level = if critical[n] {
                view.level(copy.index())
            } else {
                required[n]
            };
            let chosen = m.candidates().iter().copied().find(|i| {
                let sg = library.supergate(*i);
                let gain_ok = if params.allow_zero_gain {
                    sg.cost() <= area
                } else {
                    sg.cost() < area
                };
                let depth_ok = !params.preserve_depth || leaf_level + sg.depth() <= max_level;
                gain_ok && depth_ok
            });
            let Some(root) = chosen else {
                continue;
            };
            manager.incr_trav_id();
            let leaf_signals = manager.match_leaves(&m, &view, &signals);
            translation[n] = manager.build(&m, &mut view, root, &leaf_signals);
            nb_rewritten += 1;
        }
        for o in src.outputs() {
            view.create_po(o.remap(&translation));
        }
    }
    ret.cleanup();

    let old_area = costs.area(&src);
    let new_area = costs.area(&ret);
    debug!(
        "Rewrote {} nodes: area {} -> {}, {} -> {} gates",
        nb_rewritten,
        old_area,
        new_area,
        src.nb_gates(),
        ret.nb_gates()
    );
    if new_area > old_area {
        return Ok(src);
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use test_log::test;

    use super::{find_cut, rewrite, RewriteParameters};
    use crate::database::{Library, RewriteError, NUM_VARS};
    use crate::network::cost::CostParameters;
    use crate::network::generators::{adder, carry_chain, random};
    use crate::network::NetworkKind;
    use crate::sim::simulate_words;
    use crate::view::{LevelParameters, LevelView};
    use crate::Network;

    fn check_equivalent(a: &Network, b: &Network) {
        assert_eq!(a.nb_inputs(), b.nb_inputs());
        assert_eq!(a.nb_outputs(), b.nb_outputs());
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..4 {
            let inputs: Vec<u64> = (0..a.nb_inputs()).map(|_| rng.gen()).collect();
            assert_eq!(simulate_words(a, &inputs), simulate_words(b, &inputs));
        }
    }

    fn depth(ntk: &mut Network) -> usize {
        LevelView::<u64>::new(ntk, LevelParameters::unit()).depth()
    }

    #[test]
    fn test_xor_from_ands() {
        let mut xag = Network::new(NetworkKind::Xag);
        let a = xag.add_input();
        let b = xag.add_input();
        let x0 = xag.and(a, !b);
        let x1 = xag.and(!a, b);
        let x = xag.or(x0, x1);
        xag.add_output(x);
        assert_eq!(xag.nb_gates(), 3);

        let lib = Library::standard(NetworkKind::Xag);
        let ret = rewrite(&xag, &lib, &RewriteParameters::default()).unwrap();
        assert_eq!(ret.nb_gates(), 1);
        assert!(ret.gate(ret.output(0).index()).is_xor());
        check_equivalent(&xag, &ret);
    }

    #[test]
    fn test_redundant_and() {
        let mut aig = Network::new(NetworkKind::Aig);
        let a = aig.add_input();
        let b = aig.add_input();
        let x0 = aig.and(a, b);
        let x1 = aig.and(a, x0);
        aig.add_output(x1);
        let lib = Library::standard(NetworkKind::Aig);
        let ret = rewrite(&aig, &lib, &RewriteParameters::default()).unwrap();
        assert_eq!(ret.nb_gates(), 1);
        check_equivalent(&aig, &ret);
    }

    #[test]
    fn test_constant() {
        let mut aig = Network::new(NetworkKind::Aig);
        let i = aig.add_inputs(3);
        let x0 = aig.and(i[0], i[1]);
        let x1 = aig.and(!i[0], i[2]);
        let x2 = aig.and(x0, x1);
        aig.add_output(x2);
        let lib = Library::standard(NetworkKind::Aig);
        let ret = rewrite(&aig, &lib, &RewriteParameters::default()).unwrap();
        assert_eq!(ret.nb_gates(), 0);
        assert!(ret.output(0).is_constant());
        check_equivalent(&aig, &ret);
    }

    #[test]
    fn test_unsupported_library() {
        let aig = adder::ripple_carry(NetworkKind::Aig, 2);
        let lib = Library::standard(NetworkKind::Xag);
        assert!(matches!(
            rewrite(&aig, &lib, &RewriteParameters::default()),
            Err(RewriteError::UnsupportedDestinationKind { .. })
        ));
    }

    #[test]
    fn test_cut_size() {
        let ntk = random::random_logic(NetworkKind::Xag, 10, 100, 5, 3);
        for n in 0..ntk.nb_nodes() {
            if !ntk.gate(n).is_logic() {
                continue;
            }
            let cut = find_cut(&ntk, n);
            assert!(!cut.is_empty());
            assert!(cut.len() <= NUM_VARS);
            assert!(cut.iter().all(|l| *l < n));
        }
    }

    #[test]
    fn test_preserves_function() {
        for kind in [NetworkKind::Aig, NetworkKind::Xag, NetworkKind::Mig] {
            let lib = Library::standard(kind);
            let mut networks = vec![
                adder::ripple_carry(kind, 6),
                carry_chain::ripple_carry(kind, 6),
            ];
            for seed in 0..4 {
                networks.push(random::random_logic(kind, 8, 80, 6, seed));
            }
            for ntk in networks {
                for params in [
                    RewriteParameters::default(),
                    RewriteParameters {
                        allow_zero_gain: true,
                        preserve_depth: false,
                    },
                ] {
                    let ret = rewrite(&ntk, &lib, &params).unwrap();
                    ret.check();
                    check_equivalent(&ntk, &ret);
                    let costs = lib.costs();
                    assert!(costs.area(&ret) <= costs.area(&ntk));
                }
            }
        }
    }

    #[test]
    fn test_preserves_depth() {
        for kind in [NetworkKind::Aig, NetworkKind::Xag] {
            let lib = Library::standard_with_costs(kind, CostParameters::vlsi());
            for seed in 0..4 {
                let mut ntk = random::random_logic(kind, 8, 100, 6, seed);
                let mut ret = rewrite(&ntk, &lib, &RewriteParameters::default()).unwrap();
                assert!(depth(&mut ret) <= depth(&mut ntk));
                check_equivalent(&ntk, &ret);
            }
        }
    }
}
