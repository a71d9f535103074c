use core::fmt;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::network::events::{EventHandle, Listeners, NodeListener};
use crate::network::gates::{BinaryType, Gate, Normalization};
use crate::network::signal::Signal;

/// Kind of logic allowed in a network
///
/// Construction functions are available for all kinds, but only build the gates of the kind:
/// an Xor in an And-Inverter-Graph is built from several And gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkKind {
    /// And-Inverter-Graph
    #[default]
    Aig,
    /// Xor-And-Inverter-Graph
    Xag,
    /// Majority-Inverter-Graph
    Mig,
}

/// Representation of a logic network as a gate-inverter-graph
///
/// Nodes are stored in an arena with dense indices: node 0 is the constant, primary inputs
/// are [`Gate::Input`] nodes, and every gate is structurally hashed after normalization.
/// Each node carries a traversal mark, compared against the network's traversal id.
#[derive(Debug)]
pub struct Network {
    kind: NetworkKind,
    nodes: Vec<Gate>,
    inputs: Vec<u32>,
    outputs: Vec<Signal>,
    strash: FxHashMap<Gate, u32>,
    visited: Vec<u32>,
    trav_id: u32,
    listeners: Listeners,
}

impl Network {
    /// Create a new network of the given kind
    pub fn new(kind: NetworkKind) -> Self {
        Network {
            kind,
            nodes: vec![Gate::Constant],
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: FxHashMap::default(),
            visited: vec![0],
            trav_id: 1,
            listeners: Listeners::default(),
        }
    }

    /// Return the kind of logic built by the network
    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of nodes in the network, including the constant and the inputs
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of logic gates (And, Xor and Maj)
    pub fn nb_gates(&self) -> usize {
        self.nodes.iter().filter(|g| g.is_logic()).count()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.nb_inputs());
        Signal::from_node(self.inputs[i])
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        assert!(i < self.nb_outputs());
        self.outputs[i]
    }

    /// Get all outputs
    pub fn outputs(&self) -> &[Signal] {
        &self.outputs
    }

    /// Get the signal of node i
    pub fn node(&self, i: usize) -> Signal {
        Signal::from_node(i as u32)
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.nodes[i]
    }

    /// Returns whether node i is a primary input
    pub fn is_input(&self, i: usize) -> bool {
        self.nodes[i].is_input()
    }

    /// Add a new primary input
    pub fn add_input(&mut self) -> Signal {
        let ordinal = self.inputs.len() as u32;
        let node = self.push(Gate::Input(ordinal));
        self.inputs.push(node);
        self.notify_add(node as usize);
        Signal::from_node(node)
    }

    /// Add multiple primary inputs
    pub fn add_inputs(&mut self, nb: usize) -> Vec<Signal> {
        (0..nb).map(|_| self.add_input()).collect()
    }

    /// Add a new primary output based on an existing signal, and return its index
    pub fn add_output(&mut self, s: Signal) -> usize {
        assert!(self.is_valid(s), "Invalid output {s}");
        self.outputs.push(s);
        self.outputs.len() - 1
    }

    /// Create an And2 gate
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        let n = Gate::and(a, b).make_canonical();
        self.add_normalized(n)
    }

    /// Create an Or2 gate
    pub fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    /// Create a Xor2 gate
    pub fn xor(&mut self, a: Signal, b: Signal) -> Signal {
        match self.kind {
            NetworkKind::Xag => {
                let n = Gate::xor(a, b).make_canonical();
                self.add_normalized(n)
            }
            NetworkKind::Aig | NetworkKind::Mig => {
                let x = self.and(a, !b);
                let y = self.and(!a, b);
                self.or(x, y)
            }
        }
    }

    /// Create a Maj gate
    pub fn maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        match self.kind {
            NetworkKind::Mig => {
                let n = Gate::maj(a, b, c).make_canonical();
                self.add_normalized(n)
            }
            NetworkKind::Xag => {
                let ab = self.and(a, b);
                let x = self.xor(a, b);
                let cx = self.and(c, x);
                self.xor(ab, cx)
            }
            NetworkKind::Aig => {
                let ab = self.and(a, b);
                let o = self.or(a, b);
                let co = self.and(c, o);
                self.or(ab, co)
            }
        }
    }

    /// Create a Mux gate: s ? a : b
    pub fn mux(&mut self, s: Signal, a: Signal, b: Signal) -> Signal {
        let x = self.and(s, a);
        let y = self.and(!s, b);
        self.or(x, y)
    }

    /// Create an n-ary And as a tree
    pub fn and_n(&mut self, sigs: &[Signal]) -> Signal {
        if sigs.is_empty() {
            Signal::one()
        } else if sigs.len() == 1 {
            sigs[0]
        } else {
            let next_sigs: Vec<Signal> = sigs
                .chunks(2)
                .map(|c| if c.len() == 2 { self.and(c[0], c[1]) } else { c[0] })
                .collect();
            self.and_n(&next_sigs)
        }
    }

    /// Create an n-ary Xor as a tree
    pub fn xor_n(&mut self, sigs: &[Signal]) -> Signal {
        if sigs.is_empty() {
            Signal::zero()
        } else if sigs.len() == 1 {
            sigs[0]
        } else {
            let next_sigs: Vec<Signal> = sigs
                .chunks(2)
                .map(|c| if c.len() == 2 { self.xor(c[0], c[1]) } else { c[0] })
                .collect();
            self.xor_n(&next_sigs)
        }
    }

    /// Add a gate with new fanins, using the construction functions of the network kind
    pub fn add(&mut self, gate: Gate) -> Signal {
        match gate {
            Gate::Constant => Signal::zero(),
            Gate::Input(i) => panic!("Cannot add input {i} as a gate"),
            Gate::Binary([a, b], BinaryType::And) => self.and(a, b),
            Gate::Binary([a, b], BinaryType::Xor) => self.xor(a, b),
            Gate::Maj([a, b, c]) => self.maj(a, b, c),
            Gate::Buf(s) => s,
        }
    }

    /// Add a normalized gate, reusing an existing node if possible
    fn add_normalized(&mut self, n: Normalization) -> Signal {
        match n {
            Normalization::Copy(s) => s,
            Normalization::Node(g, inv) => {
                for s in g.dependencies() {
                    assert!(self.is_valid(*s), "Invalid signal {s}");
                }
                // Majority graphs keep And gates as Maj with a constant
                let g = match (self.kind, g) {
                    (NetworkKind::Mig, Gate::Binary([a, b], BinaryType::And)) => {
                        Gate::Maj([Signal::zero(), a, b])
                    }
                    _ => g,
                };
                let next = self.nodes.len() as u32;
                let node = match self.strash.entry(g) {
                    Entry::Occupied(e) => return Signal::from_node(*e.get()) ^ inv,
                    Entry::Vacant(e) => {
                        e.insert(next);
                        next
                    }
                };
                self.push(g);
                self.notify_add(node as usize);
                Signal::from_node(node) ^ inv
            }
        }
    }

    /// Push a new node without hashing or notification
    fn push(&mut self, g: Gate) -> u32 {
        let node = self.nodes.len() as u32;
        self.nodes.push(g);
        self.visited.push(0);
        node
    }

    /// Return the current traversal id
    pub fn trav_id(&self) -> u32 {
        self.trav_id
    }

    /// Start a new traversal: all nodes become unvisited
    pub fn incr_trav_id(&mut self) {
        self.trav_id += 1;
    }

    /// Return the traversal mark of node i
    pub fn visited(&self, i: usize) -> u32 {
        self.visited[i]
    }

    /// Set the traversal mark of node i
    pub fn set_visited(&mut self, i: usize, v: u32) {
        self.visited[i] = v;
    }

    /// Returns whether node i is marked with the current traversal id
    pub fn is_visited(&self, i: usize) -> bool {
        self.visited[i] == self.trav_id
    }

    /// Mark node i with the current traversal id
    pub fn mark_visited(&mut self, i: usize) {
        self.visited[i] = self.trav_id;
    }

    /// Subscribe to node creation and modification events
    ///
    /// The listener is held weakly; the handle must be given back to [`Network::unsubscribe`].
    pub fn subscribe(&mut self, listener: &Rc<RefCell<dyn NodeListener>>) -> EventHandle {
        self.listeners.register(listener)
    }

    /// Release an event subscription; returns false if it was not registered
    pub fn unsubscribe(&mut self, handle: EventHandle) -> bool {
        self.listeners.release(handle)
    }

    /// Number of live event subscriptions
    pub fn nb_listeners(&self) -> usize {
        self.listeners.len()
    }

    fn notify_add(&mut self, node: usize) {
        for l in self.listeners.active() {
            l.borrow_mut().on_add(self, node);
        }
    }

    fn notify_modify(&mut self, node: usize) {
        for l in self.listeners.active() {
            l.borrow_mut().on_modify(self, node);
        }
    }

    fn notify_rebuild(&mut self) {
        for l in self.listeners.active() {
            l.borrow_mut().on_rebuild(self);
        }
    }

    /// Replace a logic node by another signal in place
    ///
    /// The node becomes a buffer until the next [`Network::cleanup`]. The replacement must not
    /// depend on the node, or a combinatorial loop is created.
    pub fn substitute(&mut self, node: usize, s: Signal) {
        assert!(
            self.gate(node).is_logic() || self.gate(node).is_buf(),
            "Only logic nodes can be substituted, got {}",
            self.gate(node)
        );
        assert!(self.is_valid(s), "Invalid signal {s}");
        if s == self.node(node) {
            return;
        }
        assert_ne!(s.index(), node, "Cannot substitute a node by its complement");
        let old = self.nodes[node];
        if self.strash.get(&old) == Some(&(node as u32)) {
            self.strash.remove(&old);
        }
        self.nodes[node] = Gate::Buf(s);
        self.notify_modify(node);
    }

    /// Count the number of references to each node from logic and outputs
    pub fn fanout_counts(&self) -> Vec<u32> {
        let mut ret = vec![0u32; self.nb_nodes()];
        for g in self.nodes.iter() {
            for f in g.fanins() {
                ret[f as usize] += 1;
            }
        }
        for s in self.outputs.iter() {
            if !s.is_constant() {
                ret[s.index()] += 1;
            }
        }
        ret
    }

    /// Compute a topological order of the nodes reachable from the outputs
    fn reachable_order(&self) -> Vec<u32> {
        let mut seen = vec![false; self.nb_nodes()];
        let mut order = Vec::new();
        let mut to_visit: Vec<(u32, bool)> = self
            .outputs
            .iter()
            .rev()
            .map(|s| (s.node(), false))
            .collect();
        while let Some((n, expanded)) = to_visit.pop() {
            if expanded {
                order.push(n);
                continue;
            }
            if seen[n as usize] {
                continue;
            }
            seen[n as usize] = true;
            to_visit.push((n, true));
            for f in self.gate(n as usize).fanins() {
                if !seen[f as usize] {
                    to_visit.push((f, false));
                }
            }
        }
        order
    }

    /// Remove buffers and unused logic, and rehash the network; this will invalidate all signals
    ///
    /// Inputs are kept in the same order. The network is topologically sorted afterwards.
    /// Returns the mapping of old node indices to signals; removed nodes are mapped to zero.
    pub fn cleanup(&mut self) -> Box<[Signal]> {
        let order = self.reachable_order();
        let old_nodes = std::mem::replace(&mut self.nodes, vec![Gate::Constant]);
        let old_inputs = std::mem::take(&mut self.inputs);
        let listeners = std::mem::take(&mut self.listeners);
        self.strash.clear();
        self.visited = vec![0];
        self.trav_id = 1;

        let mut translation = vec![Signal::zero(); old_nodes.len()];
        for i in old_inputs.iter() {
            translation[*i as usize] = self.add_input();
        }
        for n in order {
            let g = &old_nodes[n as usize];
            if g.is_logic() || g.is_buf() {
                translation[n as usize] = self.add(g.remap_order(&translation));
            }
        }
        let outputs: Vec<Signal> = self.outputs.iter().map(|s| s.remap(&translation)).collect();
        self.outputs = outputs;
        self.listeners = listeners;
        self.check();
        self.notify_rebuild();
        translation.into()
    }

    /// Return whether the network is topologically sorted
    pub fn is_topo_sorted(&self) -> bool {
        for (i, g) in self.nodes.iter().enumerate() {
            let ind = i as u32;
            for v in g.fanins() {
                if v >= ind {
                    return false;
                }
            }
        }
        true
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert_eq!(self.nodes[0], Gate::Constant, "Node 0 must be the constant");
        assert_eq!(self.visited.len(), self.nodes.len());
        for (k, i) in self.inputs.iter().enumerate() {
            assert_eq!(self.nodes[*i as usize], Gate::Input(k as u32), "Wrong input {k}");
        }
        for i in 0..self.nb_nodes() {
            for v in self.gate(i).dependencies() {
                assert!(self.is_valid(*v), "Invalid signal {v}");
            }
            match (self.kind, self.gate(i)) {
                (NetworkKind::Aig, g) => assert!(!g.is_xor() && !g.is_maj(), "{g} in an AIG"),
                (NetworkKind::Xag, g) => assert!(!g.is_maj(), "{g} in a XAG"),
                (NetworkKind::Mig, g) => assert!(!g.is_and() && !g.is_xor(), "{g} in a MIG"),
            }
        }
        for i in 0..self.nb_outputs() {
            let v = self.output(i);
            assert!(self.is_valid(v), "Invalid output {v}");
        }
    }

    /// Returns whether a signal is valid (within bounds) in the network
    pub(crate) fn is_valid(&self, s: Signal) -> bool {
        s.index() < self.nb_nodes()
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new(NetworkKind::default())
    }
}

/// Copies the logic, but not the event subscriptions
impl Clone for Network {
    fn clone(&self) -> Self {
        Network {
            kind: self.kind,
            nodes: self.nodes.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            strash: self.strash.clone(),
            visited: self.visited.clone(),
            trav_id: self.trav_id,
            listeners: Listeners::default(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} network with {} inputs, {} outputs:",
            self.kind,
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for i in 1..self.nb_nodes() {
            writeln!(f, "\t{} = {}", self.node(i), self.gate(i))?;
        }
        for i in 0..self.nb_outputs() {
            writeln!(f, "\to{} = {}", i, self.output(i))?;
        }
        Ok(())
    }
}
