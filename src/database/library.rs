use std::sync::atomic::{AtomicU64, Ordering};

use fxhash::FxHashMap;
use log::debug;

use crate::canonization::{Canonization, Canonizer, ExhaustiveCanonizer};
use crate::database::NUM_VARS;
use crate::network::cost::CostParameters;
use crate::network::NetworkKind;
use crate::sim::{projections, signal_value, simulate_nodes};
use crate::truth_table::{TernaryTable, TruthTable};
use crate::{Gate, Network, Signal};

static NEXT_LIBRARY_ID: AtomicU64 = AtomicU64::new(0);

/// A precomputed structure implementing a canonical function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supergate {
    root: Signal,
    function: TruthTable,
    cost: usize,
    depth: usize,
}

impl Supergate {
    /// Root of the structure in the library nodes; it may be complemented
    pub fn root(&self) -> Signal {
        self.root
    }

    /// Canonical function implemented, over [`NUM_VARS`] inputs
    pub fn function(&self) -> TruthTable {
        self.function
    }

    /// Sum of the gate costs of the structure
    pub fn cost(&self) -> usize {
        self.cost
    }

    /// Number of gates on the longest path from an input to the root
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Read-only collection of supergates, indexed by NPN class
///
/// All supergates share a single arena of gates over [`NUM_VARS`] inputs: node 0 is the
/// constant and nodes `1..=NUM_VARS` are the inputs.
pub struct Library {
    id: u64,
    kind: NetworkKind,
    costs: CostParameters,
    nodes: Box<[Gate]>,
    supergates: Vec<Supergate>,
    classes: FxHashMap<u64, Vec<usize>>,
    canonizer: Box<dyn Canonizer>,
}

impl Library {
    /// Library with the usual small structures, built with unit costs
    ///
    /// The gates used are those of the network kind.
    pub fn standard(kind: NetworkKind) -> Library {
        Library::standard_with_costs(kind, CostParameters::unit())
    }

    /// Library with the usual small structures
    pub fn standard_with_costs(kind: NetworkKind, costs: CostParameters) -> Library {
        let mut builder = LibraryBuilder::new(kind, costs);
        builder.add(0, |_, _| Signal::zero());
        builder.add(1, |_, x| x[0]);
        builder.add(2, |n, x| n.and(x[0], x[1]));
        builder.add(3, |n, x| n.and_n(x));
        builder.add(4, |n, x| n.and_n(x));
        builder.add(2, |n, x| n.xor(x[0], x[1]));
        builder.add(3, |n, x| n.xor_n(x));
        builder.add(3, |n, x| n.maj(x[0], x[1], x[2]));
        builder.add(3, |n, x| n.mux(x[0], x[1], x[2]));
        builder.add(3, |n, x| {
            let a = n.and(x[0], x[1]);
            n.or(a, x[2])
        });
        builder.add(3, |n, x| {
            let o = n.or(x[0], x[1]);
            n.and(o, x[2])
        });
        builder.add(3, |n, x| {
            let a = n.and(x[0], x[1]);
            n.xor(a, x[2])
        });
        builder.add(3, |n, x| {
            let o = n.xor(x[0], x[1]);
            n.and(o, x[2])
        });
        builder.build()
    }

    /// Unique identifier of the library
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Kind of gates used by the supergates
    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// Costs used to evaluate the supergates
    pub fn costs(&self) -> &CostParameters {
        &self.costs
    }

    /// Number of supergates
    pub fn nb_supergates(&self) -> usize {
        self.supergates.len()
    }

    /// Number of distinct canonical functions
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }

    /// Get the supergate at index i
    pub fn supergate(&self, i: usize) -> &Supergate {
        &self.supergates[i]
    }

    /// Number of nodes shared by the supergates, including the constant and the inputs
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.nodes[i]
    }

    /// Returns whether any supergate uses a gate
    pub fn uses(&self, pred: impl Fn(&Gate) -> bool) -> bool {
        self.nodes.iter().any(pred)
    }

    /// Canonize a function with the canonizer of the library
    pub fn canonize(&self, t: &TruthTable) -> Canonization {
        self.canonizer.canonize(t)
    }

    /// Supergates implementing a canonical function, sorted by cost, depth and index
    pub fn class(&self, canonical: &TruthTable) -> &[usize] {
        assert_eq!(canonical.num_vars(), NUM_VARS);
        self.classes
            .get(&canonical.bits())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Supergates compatible with an incompletely specified function, sorted by cost, depth and index
    pub fn compatible(&self, target: &TernaryTable) -> Vec<usize> {
        assert_eq!(target.num_vars(), NUM_VARS);
        let mut ret: Vec<usize> = (0..self.supergates.len())
            .filter(|i| target.is_compatible(&self.supergates[*i].function))
            .collect();
        ret.sort_by_key(|i| (self.supergates[*i].cost, self.supergates[*i].depth, *i));
        ret
    }
}

/// Incremental construction of a [`Library`]
///
/// Structures are built in a scratch network, canonized, and rebuilt in canonical coordinates
/// in the shared network of the library.
pub struct LibraryBuilder {
    ntk: Network,
    costs: CostParameters,
    canonizer: Box<dyn Canonizer>,
    supergates: Vec<Supergate>,
}

impl LibraryBuilder {
    /// Create a builder using exhaustive canonization
    pub fn new(kind: NetworkKind, costs: CostParameters) -> LibraryBuilder {
        LibraryBuilder::with_canonizer(kind, costs, Box::new(ExhaustiveCanonizer))
    }

    /// Create a builder with a custom canonizer
    pub fn with_canonizer(
        kind: NetworkKind,
        costs: CostParameters,
        canonizer: Box<dyn Canonizer>,
    ) -> LibraryBuilder {
        costs.check();
        let mut ntk = Network::new(kind);
        ntk.add_inputs(NUM_VARS);
        LibraryBuilder {
            ntk,
            costs,
            canonizer,
            supergates: Vec::new(),
        }
    }

    /// Number of supergates added so far
    pub fn nb_supergates(&self) -> usize {
        self.supergates.len()
    }

    /// Add a structure over `nb_inputs` inputs, and return the index of its supergate
    ///
    /// The structure is described by a function building it from its input signals.
    /// Structures that are already present are not duplicated.
    pub fn add<F>(&mut self, nb_inputs: usize, build: F) -> usize
    where
        F: Fn(&mut Network, &[Signal]) -> Signal,
    {
        assert!(nb_inputs <= NUM_VARS, "Supergates have at most {NUM_VARS} inputs");

        // Obtain the function in a scratch network
        let mut scratch = Network::new(self.ntk.kind());
        let x = scratch.add_inputs(NUM_VARS);
        let s = build(&mut scratch, &x[..nb_inputs]);
        let values = simulate_nodes(&scratch, &projections(NUM_VARS));
        let function = TruthTable::new(NUM_VARS, signal_value(&values, s));
        let c = self.canonizer.canonize(&function);

        // Rebuild in canonical coordinates: x[perm[i]] = y[i] ^ neg_i
        let mut x = vec![Signal::zero(); NUM_VARS];
        for (i, p) in c.permutation.iter().enumerate() {
            x[*p] = self.ntk.input(i) ^ ((c.input_negation() >> i) & 1 != 0);
        }
        let root = build(&mut self.ntk, &x[..nb_inputs]) ^ c.output_negated();

        let values = simulate_nodes(&self.ntk, &projections(NUM_VARS));
        assert_eq!(
            signal_value(&values, root),
            c.table.bits(),
            "Structure rebuilt with a different function"
        );

        if let Some(i) = self.supergates.iter().position(|sg| sg.root == root) {
            return i;
        }
        let (cost, depth) = self.cone_cost(root);
        self.supergates.push(Supergate {
            root,
            function: c.table,
            cost,
            depth,
        });
        self.supergates.len() - 1
    }

    /// Compute the cost and the depth of the cone of a signal
    fn cone_cost(&self, root: Signal) -> (usize, usize) {
        let mut depth = vec![None; self.ntk.nb_nodes()];
        let mut cost = 0;
        let mut to_visit = vec![root.index()];
        while let Some(&n) = to_visit.last() {
            if depth[n].is_some() {
                to_visit.pop();
                continue;
            }
            let g = self.ntk.gate(n);
            let pending: Vec<usize> = g
                .fanins()
                .map(|f| f as usize)
                .filter(|f| depth[*f].is_none())
                .collect();
            if pending.is_empty() {
                to_visit.pop();
                let d = g.fanins().map(|f| depth[f as usize].unwrap_or(0)).max();
                depth[n] = Some(if g.is_logic() { d.unwrap_or(0) + 1 } else { 0 });
                cost += self.costs.gate_area(g);
            } else {
                to_visit.extend(pending);
            }
        }
        (cost, depth[root.index()].unwrap_or(0))
    }

    /// Freeze the library
    pub fn build(self) -> Library {
        let nodes: Box<[Gate]> = (0..self.ntk.nb_nodes())
            .map(|i| *self.ntk.gate(i))
            .collect();
        let mut classes: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
        for (i, sg) in self.supergates.iter().enumerate() {
            classes.entry(sg.function.bits()).or_default().push(i);
        }
        for v in classes.values_mut() {
            v.sort_by_key(|i| (self.supergates[*i].cost, self.supergates[*i].depth, *i));
        }
        let id = NEXT_LIBRARY_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Built library {} with {} supergates in {} classes over {} nodes",
            id,
            self.supergates.len(),
            classes.len(),
            nodes.len()
        );
        Library {
            id,
            kind: self.ntk.kind(),
            costs: self.costs,
            nodes,
            supergates: self.supergates,
            classes,
            canonizer: self.canonizer,
        }
    }
}
