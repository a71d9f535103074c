use fxhash::FxHashMap;
use log::trace;

use crate::database::destination::{Destination, DestinationKind};
use crate::database::library::Library;
use crate::database::{RewriteError, NUM_VARS};
use crate::network::BinaryType;
use crate::truth_table::TernaryTable;
use crate::{Gate, Signal};

/// Result of a successful lookup, to be consumed by [`DatabaseManager::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    negation: u32,
    slots: [usize; NUM_VARS],
    output_phase: bool,
    num_inputs: usize,
    library_id: u64,
    candidates: Vec<usize>,
}

impl Match {
    /// Input negations, indexed by supergate input
    pub fn negation(&self) -> u32 {
        self.negation
    }

    /// Supergate input receiving each external input
    pub fn slots(&self) -> &[usize] {
        &self.slots[..self.num_inputs]
    }

    /// Whether the supergate output must be complemented
    pub fn output_phase(&self) -> bool {
        self.output_phase
    }

    /// Number of external inputs
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Compatible supergates, sorted by cost, depth and index
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Cheapest compatible supergate
    pub fn best(&self) -> usize {
        self.candidates[0]
    }
}

type BinaryRule = fn(&mut dyn Destination, Signal, Signal) -> Signal;
type TernaryRule = fn(&mut dyn Destination, Signal, Signal, Signal) -> Signal;
type OutputRule = fn(&mut dyn Destination, Signal) -> usize;

/// How each library gate is rebuilt for a kind of destination
#[derive(Clone, Copy)]
struct Strategy {
    and: Option<BinaryRule>,
    xor: Option<BinaryRule>,
    maj: Option<TernaryRule>,
    output: OutputRule,
}

impl Strategy {
    fn for_kind(kind: DestinationKind) -> Strategy {
        let and: BinaryRule = |d, a, b| d.create_and(a, b);
        let xor: BinaryRule = |d, a, b| d.create_xor(a, b);
        let maj: TernaryRule = |d, a, b, c| d.create_maj(a, b, c);
        let output: OutputRule = |d, s| d.create_output(s);
        match kind {
            DestinationKind::Aig => Strategy {
                and: Some(and),
                xor: None,
                maj: None,
                output,
            },
            DestinationKind::Xag => Strategy {
                and: Some(and),
                xor: Some(xor),
                maj: None,
                output,
            },
            DestinationKind::Mig => Strategy {
                and: None,
                xor: None,
                maj: Some(maj),
                output,
            },
            DestinationKind::Flat => Strategy {
                and: Some(and),
                xor: Some(xor),
                maj: Some(maj),
                output,
            },
        }
    }
}

/// Lookup of functions in a [`Library`] and insertion of supergates in destinations
///
/// Insertion is memoized by library node: within a traversal generation, a library node
/// is built only once. The generation must be incremented with
/// [`DatabaseManager::incr_trav_id`] before inserting with different leaves.
pub struct DatabaseManager<'a> {
    library: &'a Library,
    kind: DestinationKind,
    strategy: Strategy,
    memo: FxHashMap<u32, (u32, Signal)>,
    trav_id: u32,
}

impl<'a> DatabaseManager<'a> {
    /// Create a manager inserting in a kind of destination
    ///
    /// Fails if the library uses a gate that has no construction rule for this kind.
    pub fn new(library: &'a Library, kind: DestinationKind) -> Result<Self, RewriteError> {
        let strategy = Strategy::for_kind(kind);
        let unsupported: [(&'static str, bool, fn(&Gate) -> bool); 3] = [
            ("And", strategy.and.is_none(), Gate::is_and),
            ("Xor", strategy.xor.is_none(), Gate::is_xor),
            ("Maj", strategy.maj.is_none(), Gate::is_maj),
        ];
        for (gate, missing, pred) in unsupported {
            if missing && library.uses(pred) {
                return Err(RewriteError::UnsupportedDestinationKind { kind, gate });
            }
        }
        Ok(DatabaseManager {
            library,
            kind,
            strategy,
            memo: FxHashMap::default(),
            trav_id: 1,
        })
    }

    /// Library used by the manager
    pub fn library(&self) -> &'a Library {
        self.library
    }

    /// Kind of destination the manager inserts into
    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    /// Current traversal generation
    pub fn trav_id(&self) -> u32 {
        self.trav_id
    }

    /// Start a new traversal generation: previously built nodes are forgotten
    pub fn incr_trav_id(&mut self) {
        self.trav_id += 1;
    }

    /// Find the supergates implementing a function, on its care set
    ///
    /// Returns `None` if no supergate is compatible.
    pub fn lookup(&self, target: &TernaryTable) -> Option<Match> {
        let num_inputs = target.num_vars();
        assert!(num_inputs <= NUM_VARS, "At most {NUM_VARS} inputs are supported");
        let t = target.extend_to(NUM_VARS);
        let c = self.library.canonize(&t.onset());
        let care = c.apply_inputs(&t.care());
        let candidates = if care.is_one() {
            self.library.class(&c.table).to_vec()
        } else {
            self.library.compatible(&TernaryTable::new(c.table, care))
        };
        if candidates.is_empty() {
            trace!("No supergate for {target}");
            return None;
        }
        trace!("{} supergates for {target}", candidates.len());
        let inverse = c.inverse_permutation();
        let mut slots = [0; NUM_VARS];
        slots.copy_from_slice(&inverse);
        Some(Match {
            negation: c.input_negation(),
            slots,
            output_phase: c.output_negated(),
            num_inputs,
            library_id: self.library.id(),
            candidates,
        })
    }

    fn check_match(&self, m: &Match) {
        assert_eq!(
            m.library_id,
            self.library.id(),
            "Match was obtained from another library"
        );
    }

    /// Place the leaf signals on the supergate inputs
    ///
    /// Each signal goes to its supergate input, with the input negation applied. Unused
    /// inputs are tied to the constant zero of the destination.
    pub fn match_leaves(
        &self,
        m: &Match,
        dest: &dyn Destination,
        signals: &[Signal],
    ) -> [Signal; NUM_VARS] {
        self.check_match(m);
        assert_eq!(signals.len(), m.num_inputs, "Wrong number of leaves");
        let mut ret = [dest.get_constant(false); NUM_VARS];
        for (j, s) in signals.iter().enumerate() {
            ret[m.slots[j]] = *s;
        }
        for (i, s) in ret.iter_mut().enumerate() {
            *s = *s ^ ((m.negation >> i) & 1 != 0);
        }
        ret
    }

    /// Rebuild a supergate from the match in the destination, and create an output for it
    ///
    /// Returns the index of the new output.
    pub fn insert(
        &mut self,
        m: &Match,
        dest: &mut dyn Destination,
        root: usize,
        leaves: &[Signal],
    ) -> usize {
        let s = self.build(m, dest, root, leaves);
        (self.strategy.output)(dest, s)
    }

    /// Rebuild a supergate from the match in the destination, and return its signal
    ///
    /// `leaves` are the supergate inputs, as returned by [`DatabaseManager::match_leaves`].
    pub fn build(
        &mut self,
        m: &Match,
        dest: &mut dyn Destination,
        root: usize,
        leaves: &[Signal],
    ) -> Signal {
        self.check_match(m);
        assert!(
            m.candidates.contains(&root),
            "Supergate {root} is not a candidate of the match"
        );
        assert_eq!(leaves.len(), NUM_VARS, "Wrong number of leaves");
        assert_eq!(dest.kind(), self.kind, "Wrong kind of destination");
        let sg_root = self.library.supergate(root).root();
        let s = self.synthesize(dest, sg_root.node(), leaves);
        s ^ sg_root.is_inverted() ^ m.output_phase
    }

    fn synthesize_fanin(&mut self, dest: &mut dyn Destination, s: Signal, leaves: &[Signal]) -> Signal {
        self.synthesize(dest, s.node(), leaves) ^ s.is_inverted()
    }

    /// Rebuild a library node, reusing the nodes built in the current generation
    fn synthesize(&mut self, dest: &mut dyn Destination, node: u32, leaves: &[Signal]) -> Signal {
        if let Some((generation, s)) = self.memo.get(&node) {
            if *generation == self.trav_id {
                return *s;
            }
        }
        let s = match *self.library.gate(node as usize) {
            Gate::Constant => dest.get_constant(false),
            Gate::Input(i) => leaves[i as usize],
            Gate::Binary([a, b], tp) => {
                let fa = self.synthesize_fanin(dest, a, leaves);
                let fb = self.synthesize_fanin(dest, b, leaves);
                let rule = match tp {
                    BinaryType::And => self.strategy.and,
                    BinaryType::Xor => self.strategy.xor,
                };
                match rule {
                    Some(rule) => rule(dest, fa, fb),
                    None => unreachable!("{tp:?} is not supported by {:?}", self.kind),
                }
            }
            Gate::Maj([a, b, c]) => {
                let fa = self.synthesize_fanin(dest, a, leaves);
                let fb = self.synthesize_fanin(dest, b, leaves);
                let fc = self.synthesize_fanin(dest, c, leaves);
                match self.strategy.maj {
                    Some(rule) => rule(dest, fa, fb, fc),
                    None => unreachable!("Maj is not supported by {:?}", self.kind),
                }
            }
            Gate::Buf(s) => self.synthesize_fanin(dest, s, leaves),
        };
        self.memo.insert(node, (self.trav_id, s));
        s
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use test_log::test;

    use super::DatabaseManager;
    use crate::database::{DestinationKind, Library, RewriteError, NUM_VARS};
    use crate::network::{FlatList, NetworkKind};
    use crate::sim::{projections, simulate_words};
    use crate::truth_table::{TernaryTable, TruthTable};
    use crate::Network;

    /// Insert a function in a fresh network and return the truth table of the output
    fn insert_and_simulate(
        manager: &mut DatabaseManager,
        kind: NetworkKind,
        target: &TernaryTable,
    ) -> Option<TruthTable> {
        let n = target.num_vars();
        let m = manager.lookup(target)?;
        let mut ntk = Network::new(kind);
        let inputs = ntk.add_inputs(n);
        let leaves = manager.match_leaves(&m, &ntk, &inputs);
        manager.incr_trav_id();
        manager.insert(&m, &mut ntk, m.best(), &leaves);
        let out = simulate_words(&ntk, &projections(n))[0];
        Some(TruthTable::new(n, out))
    }

    #[test]
    fn test_xor_in_empty_xag() {
        let lib = Library::standard(NetworkKind::Xag);
        let mut manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let a = TruthTable::nth_var(2, 0);
        let b = TruthTable::nth_var(2, 1);
        let target = TernaryTable::full(a ^ b);
        let m = manager.lookup(&target).unwrap();
        assert_eq!(m.num_inputs(), 2);
        assert_eq!(m.slots(), &[0, 1]);
        assert_eq!(m.negation(), 0);
        assert!(!m.output_phase());

        let mut xag = Network::new(NetworkKind::Xag);
        let x = xag.add_input();
        let y = xag.add_input();
        let leaves = manager.match_leaves(&m, &xag, &[x, y]);
        assert_eq!(leaves.len(), NUM_VARS);
        let nb_nodes = xag.nb_nodes();
        let o = manager.insert(&m, &mut xag, m.best(), &leaves);
        assert_eq!(o, 0);
        assert_eq!(xag.nb_nodes(), nb_nodes + 1);
        assert!(xag.gate(xag.output(0).index()).is_xor());
        let out = simulate_words(&xag, &projections(2))[0];
        assert_eq!(out & 0xF, 0x6);
    }

    #[test]
    fn test_care_set() {
        let lib = Library::standard(NetworkKind::Aig);
        let manager = DatabaseManager::new(&lib, DestinationKind::Aig).unwrap();
        let a = TruthTable::nth_var(2, 0);
        let b = TruthTable::nth_var(2, 1);

        // Complete And: only And-like structures
        let m = manager.lookup(&TernaryTable::full(a & b)).unwrap();
        assert_eq!(lib.supergate(m.best()).cost(), 1);

        // Xor is only available as three Ands
        let m = manager.lookup(&TernaryTable::full(a ^ b)).unwrap();
        assert_eq!(lib.supergate(m.best()).cost(), 3);

        // Equal to an And on the care set, unconstrained elsewhere
        let vars: Vec<TruthTable> = (0..5).map(|i| TruthTable::nth_var(5, i)).collect();
        let and = lib.canonize(&(vars[0] & vars[1])).table;
        let care = and | vars[2];
        let onset = and;
        let m = manager.lookup(&TernaryTable::new(onset, care)).unwrap();
        let and_class = lib.class(&and);
        assert!(and_class.iter().all(|i| m.candidates().contains(i)));
        for i in m.candidates() {
            let f = lib.supergate(*i).function();
            assert_eq!(f & care, onset & care);
        }
    }

    #[test]
    fn test_no_match() {
        let lib = Library::standard(NetworkKind::Xag);
        let manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let vars: Vec<TruthTable> = (0..5).map(|i| TruthTable::nth_var(5, i)).collect();
        // Five-input function, far from the small structures
        let f = (vars[0] & vars[1]) ^ (vars[2] & vars[3]) ^ (vars[4] & vars[0] & vars[2]);
        assert!(manager.lookup(&TernaryTable::full(f)).is_none());
        // Every supergate ignores a variable, and so differs from f on at least 8 assignments
        let t = TernaryTable::new(f, TruthTable::new(5, 0xFFFF_FFF0));
        assert!(!t.is_complete());
        assert!(manager.lookup(&t).is_none());
        // Dropping the care set makes anything compatible
        let t = TernaryTable::new(f, TruthTable::zero(5));
        let m = manager.lookup(&t).unwrap();
        assert_eq!(lib.supergate(m.best()).cost(), 0);
    }

    #[test]
    fn test_unsupported_kind() {
        let lib = Library::standard(NetworkKind::Xag);
        assert!(matches!(
            DatabaseManager::new(&lib, DestinationKind::Aig),
            Err(RewriteError::UnsupportedDestinationKind { gate: "Xor", .. })
        ));
        assert!(DatabaseManager::new(&lib, DestinationKind::Mig).is_err());
        assert!(DatabaseManager::new(&lib, DestinationKind::Xag).is_ok());
        assert!(DatabaseManager::new(&lib, DestinationKind::Flat).is_ok());
        let err = DatabaseManager::new(&lib, DestinationKind::Aig).err().unwrap();
        assert!(err.to_string().contains("Xor"));

        let aig = Library::standard(NetworkKind::Aig);
        assert!(DatabaseManager::new(&aig, DestinationKind::Xag).is_ok());
        assert!(DatabaseManager::new(&aig, DestinationKind::Mig).is_err());
        let mig = Library::standard(NetworkKind::Mig);
        assert!(DatabaseManager::new(&mig, DestinationKind::Mig).is_ok());
        assert!(DatabaseManager::new(&mig, DestinationKind::Aig).is_err());
    }

    #[test]
    fn test_round_trip_catalog() {
        // Every function of the catalog, under random input transformations
        let mut rng = SmallRng::seed_from_u64(3);
        for kind in [NetworkKind::Aig, NetworkKind::Xag, NetworkKind::Mig] {
            let lib = Library::standard(kind);
            let mut manager = DatabaseManager::new(&lib, kind.into()).unwrap();
            for i in 0..lib.nb_supergates() {
                let f = lib.supergate(i).function();
                for _ in 0..5 {
                    let mut perm: Vec<usize> = (0..NUM_VARS).collect();
                    for k in (1..NUM_VARS).rev() {
                        perm.swap(k, rng.gen_range(0..=k));
                    }
                    let g = f.permute(&perm).flip_mask(rng.gen_range(0..32));
                    let g = if rng.gen_bool(0.5) { !g } else { g };
                    let target = TernaryTable::full(g);
                    let out = insert_and_simulate(&mut manager, kind, &target).unwrap();
                    assert_eq!(out, g, "{kind:?}");
                }
            }
        }
    }

    #[test]
    fn test_round_trip_dont_cares() {
        let mut rng = SmallRng::seed_from_u64(4);
        let lib = Library::standard(NetworkKind::Xag);
        let mut manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let mut found = 0;
        for n in 0..=4 {
            for _ in 0..50 {
                let onset = TruthTable::new(n, rng.gen());
                let care = TruthTable::new(n, rng.gen::<u64>() & rng.gen::<u64>());
                let target = TernaryTable::new(onset, care);
                if let Some(out) = insert_and_simulate(&mut manager, NetworkKind::Xag, &target) {
                    assert!(target.is_compatible(&out), "{target} implemented as {out}");
                    found += 1;
                }
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn test_deterministic() {
        let lib = Library::standard(NetworkKind::Xag);
        let manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let a = TruthTable::nth_var(3, 0);
        let b = TruthTable::nth_var(3, 1);
        let c = TruthTable::nth_var(3, 2);
        let t = TernaryTable::full((a & b) | c);
        assert_eq!(manager.lookup(&t), manager.lookup(&t));
    }

    #[test]
    fn test_memoization() {
        let lib = Library::standard(NetworkKind::Xag);
        let mut manager = DatabaseManager::new(&lib, DestinationKind::Flat).unwrap();
        let a = TruthTable::nth_var(3, 0);
        let b = TruthTable::nth_var(3, 1);
        let c = TruthTable::nth_var(3, 2);
        let t = TernaryTable::full((a & b) ^ c);
        let m = manager.lookup(&t).unwrap();

        let mut list = FlatList::new(3);
        let inputs = [list.input(0), list.input(1), list.input(2)];
        let leaves = manager.match_leaves(&m, &list, &inputs);
        manager.insert(&m, &mut list, m.best(), &leaves);
        let size = list.nb_instructions();
        assert_eq!(size, 2);

        // Same generation: nothing is rebuilt
        manager.insert(&m, &mut list, m.best(), &leaves);
        assert_eq!(list.nb_instructions(), size);
        assert_eq!(list.nb_outputs(), 2);
        assert_eq!(list.output(0), list.output(1));

        // New generation: the flat list duplicates the logic
        manager.incr_trav_id();
        manager.insert(&m, &mut list, m.best(), &leaves);
        assert_eq!(list.nb_instructions(), 2 * size);

        let p = projections(3);
        let out = list.simulate(&p);
        assert_eq!(out[0] & 0xFF, ((a & b) ^ c).bits());
        assert_eq!(out[0], out[2]);
    }

    #[test]
    #[should_panic]
    fn test_wrong_library() {
        let lib1 = Library::standard(NetworkKind::Xag);
        let lib2 = Library::standard(NetworkKind::Xag);
        let m1 = DatabaseManager::new(&lib1, DestinationKind::Xag).unwrap();
        let mut m2 = DatabaseManager::new(&lib2, DestinationKind::Xag).unwrap();
        let t = TernaryTable::full(TruthTable::nth_var(2, 0) & TruthTable::nth_var(2, 1));
        let m = m1.lookup(&t).unwrap();
        let mut xag = Network::new(NetworkKind::Xag);
        let i = xag.add_inputs(2);
        let leaves = m1.match_leaves(&m, &xag, &i);
        m2.insert(&m, &mut xag, m.best(), &leaves);
    }

    #[test]
    #[should_panic]
    fn test_wrong_leaf_count() {
        let lib = Library::standard(NetworkKind::Xag);
        let manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let t = TernaryTable::full(TruthTable::nth_var(2, 0) & TruthTable::nth_var(2, 1));
        let m = manager.lookup(&t).unwrap();
        let mut xag = Network::new(NetworkKind::Xag);
        let i = xag.add_inputs(3);
        manager.match_leaves(&m, &xag, &i);
    }

    #[test]
    #[should_panic]
    fn test_wrong_destination() {
        let lib = Library::standard(NetworkKind::Xag);
        let mut manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let t = TernaryTable::full(TruthTable::nth_var(2, 0) & TruthTable::nth_var(2, 1));
        let m = manager.lookup(&t).unwrap();
        let mut list = FlatList::new(2);
        let leaves = manager.match_leaves(&m, &list, &[list.input(0), list.input(1)]);
        manager.insert(&m, &mut list, m.best(), &leaves);
    }

    #[test]
    #[should_panic]
    fn test_not_a_candidate() {
        let lib = Library::standard(NetworkKind::Xag);
        let mut manager = DatabaseManager::new(&lib, DestinationKind::Xag).unwrap();
        let t = TernaryTable::full(TruthTable::nth_var(2, 0) & TruthTable::nth_var(2, 1));
        let m = manager.lookup(&t).unwrap();
        let root = (0..lib.nb_supergates())
            .find(|i| !m.candidates().contains(i))
            .unwrap();
        let mut xag = Network::new(NetworkKind::Xag);
        let i = xag.add_inputs(2);
        let leaves = manager.match_leaves(&m, &xag, &i);
        manager.insert(&m, &mut xag, root, &leaves);
    }
}
