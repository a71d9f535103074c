//! Per-node attributes of a network, kept up to date while it is modified
//!
//! A [`LevelView`] borrows a network and tracks, for every node, its level, whether it lies on
//! a critical path, its number of fanins and its simulation value. Full updates recompute
//! everything from the outputs; nodes created through the view or the network afterwards are
//! handled one at a time when the network notifies their creation.
//!
//! ```
//! # use supergate::network::NetworkKind;
//! # use supergate::view::{LevelParameters, LevelView};
//! # use supergate::Network;
//! use supergate::database::Destination;
//!
//! let mut xag = Network::new(NetworkKind::Xag);
//! let a = xag.add_input();
//! let b = xag.add_input();
//! let mut view = LevelView::<u64>::new(&mut xag, LevelParameters::unit());
//! let x = view.create_xor(a, b);
//! let y = view.create_and(x, a);
//! view.create_po(y);
//! assert_eq!(view.level(y.index()), 2);
//! assert_eq!(view.depth(), 2);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::database::{Destination, DestinationKind};
use crate::network::cost::CostParameters;
use crate::network::events::{EventHandle, NodeListener};
use crate::sim::SimulationValue;
use crate::{Gate, Network, Signal};

/// Parameters of the level computation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelParameters {
    /// Delay of each gate type
    pub costs: CostParameters,
    /// Level of the primary inputs
    pub input_cost: usize,
    /// Whether complemented edges add one to the level
    pub count_complements: bool,
}

impl LevelParameters {
    /// Every gate has a delay of 1, inverters are free
    pub fn unit() -> LevelParameters {
        LevelParameters {
            costs: CostParameters::unit(),
            input_cost: 0,
            count_complements: false,
        }
    }

    /// Every gate and every inverter has a delay of 1
    pub fn with_complements() -> LevelParameters {
        LevelParameters {
            count_complements: true,
            ..LevelParameters::unit()
        }
    }
}

impl Default for LevelParameters {
    fn default() -> Self {
        LevelParameters::unit()
    }
}

/// Validity of a set of attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeState {
    /// Never computed
    Uninitialized,
    /// Computed, but the network was modified since
    Stale,
    /// Up to date
    Fresh,
}

/// Attribute tables, updated by the network events
struct Attributes<V> {
    params: LevelParameters,
    levels: Vec<usize>,
    critical: Vec<bool>,
    fanin_size: Vec<usize>,
    sims: Vec<V>,
    input_sims: Vec<V>,
    depth: usize,
    levels_state: AttributeState,
    sims_state: AttributeState,
}

impl<V: SimulationValue> Attributes<V> {
    fn new(params: LevelParameters) -> Self {
        Attributes {
            params,
            levels: Vec::new(),
            critical: Vec::new(),
            fanin_size: Vec::new(),
            sims: Vec::new(),
            input_sims: Vec::new(),
            depth: 0,
            levels_state: AttributeState::Uninitialized,
            sims_state: AttributeState::Uninitialized,
        }
    }

    fn resize(&mut self, nb_nodes: usize) {
        self.levels.resize(nb_nodes, 0);
        self.critical.resize(nb_nodes, false);
        self.fanin_size.resize(nb_nodes, 0);
        self.sims.resize(nb_nodes, V::default());
    }

    /// Level seen through an edge
    fn edge_level(&self, s: Signal) -> usize {
        let penalty = self.params.count_complements && s.is_inverted();
        self.levels[s.index()] + penalty as usize
    }

    fn compute_level(&self, g: &Gate) -> usize {
        match g {
            Gate::Constant => 0,
            Gate::Input(_) => self.params.input_cost,
            _ => {
                let fanin_level = g
                    .dependencies()
                    .iter()
                    .filter(|s| !s.is_constant())
                    .map(|s| self.edge_level(*s))
                    .max()
                    .unwrap_or(0);
                self.params.costs.gate_area(g) + fanin_level
            }
        }
    }

    fn compute_simulation(&self, g: &Gate) -> V {
        match g {
            Gate::Constant => V::default(),
            Gate::Input(i) => self
                .input_sims
                .get(*i as usize)
                .copied()
                .unwrap_or_default(),
            _ => {
                let values: Vec<V> = g
                    .dependencies()
                    .iter()
                    .map(|s| self.sims[s.index()])
                    .collect();
                g.compute(&values)
            }
        }
    }

    fn invalidate(&mut self) {
        if self.levels_state == AttributeState::Fresh {
            self.levels_state = AttributeState::Stale;
        }
        if self.sims_state == AttributeState::Fresh {
            self.sims_state = AttributeState::Stale;
        }
    }
}

impl<V: SimulationValue> NodeListener for Attributes<V> {
    fn on_add(&mut self, ntk: &Network, node: usize) {
        self.resize(ntk.nb_nodes());
        let g = ntk.gate(node);
        self.fanin_size[node] = g.fanins().count();
        self.levels[node] = self.compute_level(g);
        self.critical[node] = false;
        self.sims[node] = self.compute_simulation(g);
    }

    fn on_modify(&mut self, ntk: &Network, node: usize) {
        self.resize(ntk.nb_nodes());
        self.fanin_size[node] = ntk.gate(node).fanins().count();
        self.invalidate();
    }

    fn on_rebuild(&mut self, ntk: &Network) {
        self.resize(ntk.nb_nodes());
        for i in 0..ntk.nb_nodes() {
            self.fanin_size[i] = ntk.gate(i).fanins().count();
        }
        self.invalidate();
    }
}

/// Postorder of all nodes, starting from the outputs
///
/// Nodes that are not in the cone of an output come after. Uses the network traversal marks.
fn postorder(ntk: &mut Network) -> Vec<usize> {
    ntk.incr_trav_id();
    let roots: Vec<usize> = ntk
        .outputs()
        .iter()
        .map(|s| s.index())
        .chain(0..ntk.nb_nodes())
        .collect();
    let mut order = Vec::with_capacity(ntk.nb_nodes());
    let mut to_visit = Vec::new();
    for r in roots {
        to_visit.push((r, false));
        while let Some((n, expanded)) = to_visit.pop() {
            if expanded {
                order.push(n);
                continue;
            }
            if ntk.is_visited(n) {
                continue;
            }
            ntk.mark_visited(n);
            to_visit.push((n, true));
            for f in ntk.gate(n).fanins() {
                if !ntk.is_visited(f as usize) {
                    to_visit.push((f as usize, false));
                }
            }
        }
    }
    order
}

/// View of a network maintaining levels, critical paths and simulation values
///
/// The view subscribes to the events of the network at construction, and releases the
/// subscription when dropped. New nodes get their attributes immediately, computed from their
/// fanins; other modifications make the attributes stale until the next full update.
///
/// Critical path membership is only computed by [`LevelView::update_levels`]: new nodes are
/// never critical.
pub struct LevelView<'a, V: SimulationValue + 'static = u64> {
    ntk: &'a mut Network,
    attrs: Rc<RefCell<Attributes<V>>>,
    handle: Option<EventHandle>,
}

impl<'a, V: SimulationValue + 'static> LevelView<'a, V> {
    /// Create a view and compute the levels
    pub fn new(ntk: &'a mut Network, params: LevelParameters) -> Self {
        params.costs.check();
        let attrs = Rc::new(RefCell::new(Attributes::new(params)));
        attrs.borrow_mut().resize(ntk.nb_nodes());
        let listener: Rc<RefCell<dyn NodeListener>> = attrs.clone();
        let handle = ntk.subscribe(&listener);
        let mut ret = LevelView {
            ntk,
            attrs,
            handle: Some(handle),
        };
        ret.update_levels();
        ret
    }

    /// Access the underlying network
    pub fn network(&self) -> &Network {
        &*self.ntk
    }

    /// Set the simulation values of the primary inputs, in order
    pub fn set_input_simulations(&mut self, values: &[V]) {
        assert_eq!(
            values.len(),
            self.ntk.nb_inputs(),
            "One value per primary input is required"
        );
        let mut attrs = self.attrs.borrow_mut();
        attrs.input_sims = values.to_vec();
        if attrs.sims_state == AttributeState::Fresh {
            attrs.sims_state = AttributeState::Stale;
        }
    }

    /// Recompute the levels and the critical paths
    pub fn update_levels(&mut self) {
        let order = postorder(&mut *self.ntk);
        let ntk: &Network = &*self.ntk;
        let mut guard = self.attrs.borrow_mut();
        let attrs = &mut *guard;
        attrs.resize(ntk.nb_nodes());
        for n in order {
            let g = ntk.gate(n);
            attrs.levels[n] = attrs.compute_level(g);
            attrs.fanin_size[n] = g.fanins().count();
            attrs.critical[n] = false;
        }
        attrs.depth = ntk
            .outputs()
            .iter()
            .map(|s| attrs.levels[s.index()])
            .max()
            .unwrap_or(0);

        // Backward expansion from the outputs at maximum level
        let mut to_visit: Vec<usize> = ntk
            .outputs()
            .iter()
            .map(|s| s.index())
            .filter(|n| attrs.levels[*n] == attrs.depth)
            .collect();
        while let Some(n) = to_visit.pop() {
            if attrs.critical[n] {
                continue;
            }
            attrs.critical[n] = true;
            let g = ntk.gate(n);
            if g.is_input() || g.is_constant() {
                continue;
            }
            let gate_cost = attrs.params.costs.gate_area(g);
            for s in g.dependencies() {
                if s.is_constant() || attrs.critical[s.index()] {
                    continue;
                }
                if gate_cost + attrs.edge_level(*s) == attrs.levels[n] {
                    to_visit.push(s.index());
                }
            }
        }
        attrs.levels_state = AttributeState::Fresh;
        debug!(
            "Updated levels of {} nodes: depth {}, {} critical nodes",
            ntk.nb_nodes(),
            attrs.depth,
            attrs.critical.iter().filter(|c| **c).count()
        );
    }

    /// Recompute the simulation values from the primary inputs
    pub fn update_simulations(&mut self) {
        let order = postorder(&mut *self.ntk);
        let ntk: &Network = &*self.ntk;
        let mut attrs = self.attrs.borrow_mut();
        attrs.resize(ntk.nb_nodes());
        for n in order {
            let v = attrs.compute_simulation(ntk.gate(n));
            attrs.sims[n] = v;
        }
        attrs.sims_state = AttributeState::Fresh;
        debug!("Updated simulations of {} nodes", ntk.nb_nodes());
    }

    /// Add a primary output, and extend the depth if required
    pub fn create_po(&mut self, s: Signal) -> usize {
        let ret = self.ntk.add_output(s);
        let mut attrs = self.attrs.borrow_mut();
        let level = attrs.levels[s.index()];
        attrs.depth = attrs.depth.max(level);
        ret
    }

    /// Add a gate to the network, normalized and hashed
    pub fn add(&mut self, g: Gate) -> Signal {
        self.ntk.add(g)
    }

    /// Replace a node in the network; attributes become stale
    pub fn substitute(&mut self, node: usize, s: Signal) {
        self.ntk.substitute(node, s);
    }

    /// Clean up the network; attributes become stale
    ///
    /// Returns the mapping of old node indices to signals.
    pub fn cleanup(&mut self) -> Box<[Signal]> {
        self.ntk.cleanup()
    }

    /// Maximum level of the outputs
    pub fn depth(&self) -> usize {
        self.attrs.borrow().depth
    }

    /// Level of a node
    pub fn level(&self, node: usize) -> usize {
        self.attrs.borrow().levels[node]
    }

    /// Returns whether a node lies on a critical path
    pub fn is_critical(&self, node: usize) -> bool {
        self.attrs.borrow().critical[node]
    }

    /// Number of fanins of a node, the constant excluded
    pub fn fanin_size(&self, node: usize) -> usize {
        self.attrs.borrow().fanin_size[node]
    }

    /// Simulation value of a node
    pub fn simulation(&self, node: usize) -> V {
        self.attrs.borrow().sims[node]
    }

    /// Simulation value of a signal, with its complement
    pub fn signal_simulation(&self, s: Signal) -> V {
        let v = self.simulation(s.index());
        if s.is_inverted() {
            !v
        } else {
            v
        }
    }

    /// State of the levels and critical paths
    pub fn levels_state(&self) -> AttributeState {
        self.attrs.borrow().levels_state
    }

    /// State of the simulation values
    pub fn simulations_state(&self) -> AttributeState {
        self.attrs.borrow().sims_state
    }
}

impl<'a, V: SimulationValue + 'static> Drop for LevelView<'a, V> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.ntk.unsubscribe(handle);
        }
    }
}

impl<'a, V: SimulationValue + 'static> Destination for LevelView<'a, V> {
    fn kind(&self) -> DestinationKind {
        self.ntk.kind().into()
    }

    fn get_constant(&self, value: bool) -> Signal {
        Signal::from(value)
    }

    fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.ntk.and(a, b)
    }

    fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.ntk.xor(a, b)
    }

    fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        self.ntk.maj(a, b, c)
    }

    fn create_output(&mut self, s: Signal) -> usize {
        self.create_po(s)
    }
}
