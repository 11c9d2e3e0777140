use core::fmt;
use std::collections::hash_map::Entry;

use fxhash::FxHashMap;

use crate::network::gates::{Gate, Normalization};
use crate::network::signal::Signal;

/// Representation of an And-Inverter Graph, used as the main representation for all logic manipulations
///
/// Nodes live in an arena addressed by stable variable indices; signals refer
/// to them by index plus inversion. Structural hashing is applied when gates
/// are created through [`Network::and`], so an existing gate is returned
/// instead of a duplicate.
///
/// Node substitution rewires fanouts in place and leaves the substituted node
/// unreferenced; unreachable nodes are reclaimed by [`Network::sweep`] or
/// [`Network::cleanup`], not immediately.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nb_inputs: usize,
    nodes: Vec<Gate>,
    outputs: Vec<Signal>,
    hash: FxHashMap<Gate, u32>,
}

impl Network {
    /// Create a new network
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of nodes in the network
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.nb_inputs());
        Signal::from_input(i as u32)
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        assert!(i < self.nb_outputs());
        self.outputs[i]
    }

    /// Get the variable at index i
    pub fn node(&self, i: usize) -> Signal {
        Signal::from_var(i as u32)
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.nodes[i]
    }

    /// Add a new primary input
    pub fn add_input(&mut self) -> Signal {
        self.nb_inputs += 1;
        self.input(self.nb_inputs() - 1)
    }

    /// Add multiple primary inputs
    pub fn add_inputs(&mut self, nb: usize) {
        self.nb_inputs += nb;
    }

    /// Add a new primary output based on an existing signal
    pub fn add_output(&mut self, l: Signal) {
        self.outputs.push(l)
    }

    /// Create an And2 gate, with structural hashing
    ///
    /// The gate is simplified if possible, and an existing node computing the
    /// same function of the same inputs is reused instead of creating a new one.
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        self.add_canonical(Gate::and(a, b))
    }

    /// Create an Or2 gate
    pub fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    /// Create a Xor2 gate as a tree of And gates
    pub fn xor(&mut self, a: Signal, b: Signal) -> Signal {
        let d0 = self.and(a, !b);
        let d1 = self.and(!a, b);
        self.or(d0, d1)
    }

    /// Create a Mux (s ? a : b) as a tree of And gates
    pub fn mux(&mut self, s: Signal, a: Signal, b: Signal) -> Signal {
        let t0 = self.and(s, a);
        let t1 = self.and(!s, b);
        self.or(t0, t1)
    }

    /// Create a Maj (a + b + c >= 2) as a tree of And gates
    pub fn maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        let t0 = self.and(a, b);
        let t1 = self.and(a, c);
        let t2 = self.and(b, c);
        let o = self.or(t0, t1);
        self.or(o, t2)
    }

    /// Create an n-ary And as a balanced tree
    pub fn and_n(&mut self, sigs: &[Signal]) -> Signal {
        if sigs.is_empty() {
            Signal::one()
        } else if sigs.len() == 1 {
            sigs[0]
        } else {
            let mut next_sigs = Vec::new();
            for i in (0..sigs.len()).step_by(2) {
                if i + 1 < sigs.len() {
                    next_sigs.push(self.and(sigs[i], sigs[i + 1]));
                } else {
                    next_sigs.push(sigs[i]);
                }
            }
            self.and_n(&next_sigs)
        }
    }

    /// Create an n-ary Or as a balanced tree
    pub fn or_n(&mut self, sigs: &[Signal]) -> Signal {
        let ands: Vec<Signal> = sigs.iter().map(|s| !s).collect();
        !self.and_n(&ands)
    }

    /// Create an n-ary Xor as a balanced tree
    pub fn xor_n(&mut self, sigs: &[Signal]) -> Signal {
        if sigs.is_empty() {
            Signal::zero()
        } else if sigs.len() == 1 {
            sigs[0]
        } else {
            let mut next_sigs = Vec::new();
            for i in (0..sigs.len()).step_by(2) {
                if i + 1 < sigs.len() {
                    next_sigs.push(self.xor(sigs[i], sigs[i + 1]));
                } else {
                    next_sigs.push(sigs[i]);
                }
            }
            self.xor_n(&next_sigs)
        }
    }

    /// Add a new gate in canonical form. The gate may be simplified immediately
    pub fn add_canonical(&mut self, gate: Gate) -> Signal {
        match gate.make_canonical() {
            Normalization::Copy(l) => l,
            Normalization::Node(g, inv) => self.add_unique(g) ^ inv,
        }
    }

    /// Add a canonical gate, reusing an existing node if there is one
    fn add_unique(&mut self, gate: Gate) -> Signal {
        debug_assert!(gate.is_canonical());
        match self.hash.entry(gate.clone()) {
            Entry::Occupied(e) => Signal::from_var(*e.get()),
            Entry::Vacant(e) => {
                let v = self.nodes.len() as u32;
                e.insert(v);
                self.nodes.push(gate);
                Signal::from_var(v)
            }
        }
    }

    /// Add a new gate as-is, without canonization or structural hashing
    pub fn add(&mut self, gate: Gate) -> Signal {
        let l = Signal::from_var(self.nodes.len() as u32);
        if gate.is_and() {
            self.hash.entry(gate.clone()).or_insert(l.var());
        }
        self.nodes.push(gate);
        l
    }

    /// Replace the gate at index i, keeping the same variable index
    pub fn replace(&mut self, i: usize, gate: Gate) {
        self.store_gate(i, gate);
    }

    /// Replace every use of a node's output by another signal, composing polarities
    ///
    /// A rewired gate that collapses to an alias of another signal is
    /// substituted in turn, so no fanin ever points at a Buf afterwards.
    /// The substituted node is left in place without fanout; it is reclaimed by
    /// the next [`Network::sweep`] or [`Network::cleanup`]. The replacement
    /// signal must not depend on the substituted node.
    pub fn substitute(&mut self, old: u32, replacement: Signal) {
        assert!(self.is_valid(replacement), "Invalid signal {replacement}");
        let mut pending = vec![(old, replacement)];
        while let Some((old, replacement)) = pending.pop() {
            let replacement = self.resolve(replacement);
            assert!(
                !replacement.is_var() || replacement.var() != old,
                "Cannot substitute x{old} with itself"
            );
            let t = |s: &Signal| -> Signal {
                if s.is_var() && s.var() == old {
                    replacement ^ s.is_inverted()
                } else {
                    *s
                }
            };
            for i in 0..self.nb_nodes() {
                if i == old as usize {
                    continue;
                }
                let g = self.gate(i).remap(t);
                if g != *self.gate(i) {
                    let g = match g.make_canonical() {
                        Normalization::Copy(s) => {
                            pending.push((i as u32, s));
                            Gate::Buf(s)
                        }
                        Normalization::Node(g, false) => g,
                        Normalization::Node(_, true) => {
                            unreachable!("And gates normalize without inversion")
                        }
                    };
                    self.store_gate(i, g);
                }
            }
            for o in self.outputs.iter_mut() {
                *o = t(o);
            }
        }
    }

    /// Follow Buf aliases until a constant, input or And node is reached
    fn resolve(&self, s: Signal) -> Signal {
        let mut s = s;
        while s.is_var() {
            match self.gate(s.var() as usize) {
                Gate::Buf(t) => s = t ^ s.is_inverted(),
                _ => break,
            }
        }
        s
    }

    /// Store a gate at an index and keep the structural-hash map consistent
    fn store_gate(&mut self, i: usize, gate: Gate) {
        let old = self.nodes[i].clone();
        if old == gate {
            return;
        }
        if let Some(v) = self.hash.get(&old) {
            if *v == i as u32 {
                self.hash.remove(&old);
            }
        }
        if gate.is_and() {
            self.hash.entry(gate.clone()).or_insert(i as u32);
        }
        self.nodes[i] = gate;
    }

    /// Rebuild the structural-hash map from the node list
    fn rebuild_hash(&mut self) {
        self.hash.clear();
        for i in 0..self.nodes.len() {
            if self.nodes[i].is_and() {
                self.hash.entry(self.nodes[i].clone()).or_insert(i as u32);
            }
        }
    }

    /// Return whether the network is already topologically sorted
    pub(crate) fn is_topo_sorted(&self) -> bool {
        for (i, g) in self.nodes.iter().enumerate() {
            let ind = i as u32;
            for v in g.vars() {
                if v >= ind {
                    return false;
                }
            }
        }
        true
    }

    /// Remap nodes; there may be holes in the translation
    fn remap(&mut self, order: &[u32]) -> Box<[Signal]> {
        // Create the translation
        let mut translation = vec![Signal::zero(); self.nb_nodes()];
        for (new_i, old_i) in order.iter().enumerate() {
            translation[*old_i as usize] = Signal::from_var(new_i as u32);
        }

        // Remap the nodes
        let mut new_nodes = Vec::new();
        for o in order {
            let i = *o as usize;
            let g = self.gate(i);
            assert!(translation[i].is_var());
            assert_eq!(translation[i].var(), new_nodes.len() as u32);
            new_nodes.push(g.remap_order(translation.as_slice()));
        }
        self.nodes = new_nodes;

        // Remap the outputs
        self.remap_outputs(&translation);
        self.rebuild_hash();
        translation.into()
    }

    /// Remap outputs
    fn remap_outputs(&mut self, translation: &[Signal]) {
        let new_outputs = self
            .outputs
            .iter()
            .map(|s| s.remap_order(translation))
            .collect();
        self.outputs = new_outputs;
    }

    /// Remove unused logic; this will invalidate all signals
    ///
    /// Returns the mapping of old variable indices to signals, if needed.
    /// Removed signals are mapped to zero.
    pub fn sweep(&mut self) -> Box<[Signal]> {
        // Mark logic reachable from the outputs
        let mut visited = vec![false; self.nb_nodes()];
        let mut to_visit = Vec::<u32>::new();
        for o in 0..self.nb_outputs() {
            let output = self.output(o);
            if output.is_var() {
                to_visit.push(output.var());
            }
        }
        while let Some(node) = to_visit.pop() {
            let node = node as usize;
            if visited[node] {
                continue;
            }
            visited[node] = true;
            to_visit.extend(self.gate(node).vars());
        }

        // Now compute a mapping for all nodes that are reachable
        let mut order = Vec::new();
        for (i, v) in visited.iter().enumerate() {
            if *v {
                order.push(i as u32);
            }
        }
        self.remap(order.as_slice())
    }

    /// Remove duplicate logic and make all gates canonical; this will invalidate all signals
    ///
    /// Buf gates are resolved to the signal they alias. The network must be
    /// topologically sorted. Returns the mapping of old variable indices to
    /// signals, if needed.
    pub fn dedup(&mut self) -> Vec<Signal> {
        // Replace each node, in turn, by a simplified version or an equivalent existing node.
        // The sorting guarantees that the gate inputs are already replaced.
        assert!(self.is_topo_sorted());
        let mut translation = (0..self.nb_nodes())
            .map(|i| Signal::from_var(i as u32))
            .collect::<Vec<Signal>>();

        let mut hsh = FxHashMap::<Gate, Signal>::default();
        let mut new_nodes = Vec::new();
        for i in 0..self.nb_nodes() {
            let g = self.gate(i).remap_order(translation.as_slice());
            translation[i] = match g.make_canonical() {
                Normalization::Copy(sig) => sig,
                Normalization::Node(g, inv) => {
                    let node_s = Signal::from_var(new_nodes.len() as u32);
                    match hsh.entry(g.clone()) {
                        Entry::Occupied(e) => e.get() ^ inv,
                        Entry::Vacant(e) => {
                            e.insert(node_s);
                            new_nodes.push(g);
                            node_s ^ inv
                        }
                    }
                }
            };
        }

        self.nodes = new_nodes;
        self.remap_outputs(&translation);
        self.rebuild_hash();
        self.check();
        translation
    }

    /// Topologically sort the network; this will invalidate all signals
    ///
    /// Ordering may be changed even if already sorted.
    /// Returns the mapping of old variable indices to signals, if needed.
    pub(crate) fn topo_sort(&mut self) -> Box<[Signal]> {
        // Count the output dependencies of each gate
        let mut count_deps = vec![0u32; self.nb_nodes()];
        for g in self.nodes.iter() {
            for v in g.vars() {
                count_deps[v as usize] += 1;
            }
        }

        // Compute the topological sort, starting with gates with no fanout
        let mut rev_order: Vec<u32> = Vec::new();
        let mut visited = vec![false; self.nb_nodes()];
        let mut to_visit: Vec<u32> = (0..self.nb_nodes() as u32)
            .filter(|v| count_deps[*v as usize] == 0)
            .collect();
        while let Some(v) = to_visit.pop() {
            if visited[v as usize] {
                continue;
            }
            visited[v as usize] = true;
            rev_order.push(v);
            for d in self.gate(v as usize).vars() {
                count_deps[d as usize] -= 1;
                if count_deps[d as usize] == 0 {
                    to_visit.push(d);
                }
            }
        }

        if rev_order.len() != self.nb_nodes() {
            panic!("Unable to find a valid topological sort: there must be a combinatorial loop");
        }
        rev_order.reverse();
        let order = rev_order;

        self.remap(order.as_slice())
    }

    /// Sort, canonicalize and garbage-collect the network; this will invalidate all signals
    ///
    /// Resolves Buf gates, deduplicates identical gates and removes logic that
    /// no output depends on.
    pub fn cleanup(&mut self) {
        self.topo_sort();
        self.dedup();
        self.sweep();
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for i in 0..self.nb_nodes() {
            for v in self.gate(i).dependencies() {
                assert!(self.is_valid(*v), "Invalid signal {v}");
            }
        }
        for i in 0..self.nb_outputs() {
            let v = self.output(i);
            assert!(self.is_valid(v), "Invalid output {v}");
        }
    }

    /// Returns whether a signal is valid (within bounds) in the network
    pub(crate) fn is_valid(&self, s: Signal) -> bool {
        if s.is_input() {
            s.input() < self.nb_inputs() as u32
        } else if s.is_var() {
            s.var() < self.nb_nodes() as u32
        } else {
            true
        }
    }
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.nb_inputs == other.nb_inputs
            && self.nodes == other.nodes
            && self.outputs == other.outputs
    }
}

impl Eq for Network {}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for i in 0..self.nb_nodes() {
            writeln!(f, "\t{} = {}", self.node(i), self.gate(i))?;
        }
        for i in 0..self.nb_outputs() {
            writeln!(f, "\to{} = {}", i, self.output(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Gate, Network, Signal};

    #[test]
    fn test_basic() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.and(i0, i1);
        aig.add_output(x);

        // Basic properties
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        assert_eq!(aig.nb_nodes(), 1);
        assert!(aig.is_topo_sorted());

        // Access
        assert_eq!(aig.input(0), i0);
        assert_eq!(aig.input(1), i1);
        assert_eq!(aig.output(0), x);
    }

    #[test]
    fn test_structural_hashing() {
        let mut aig = Network::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x0 = aig.and(i0, i1);
        let x1 = aig.and(i0, i1);
        let x2 = aig.and(i1, i0);
        assert_eq!(x0, x1);
        assert_eq!(x0, x2);
        assert_eq!(aig.nb_nodes(), 1);

        // Simplifications do not create nodes at all
        assert_eq!(aig.and(i0, Signal::zero()), Signal::zero());
        assert_eq!(aig.and(i0, Signal::one()), i0);
        assert_eq!(aig.and(i0, i0), i0);
        assert_eq!(aig.and(i0, !i0), Signal::zero());
        assert_eq!(aig.nb_nodes(), 1);
    }

    #[test]
    fn test_nary() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let i3 = aig.add_input();
        let i4 = aig.add_input();

        assert_eq!(aig.and_n(&[]), Signal::one());
        assert_eq!(aig.and_n(&[i0]), i0);
        aig.and_n(&[i0, i1]);
        aig.and_n(&[i0, i1, i2]);
        aig.and_n(&[i0, i1, i2, i3]);
        aig.and_n(&[i0, i1, i2, i3, i4]);

        assert_eq!(aig.or_n(&[]), Signal::zero());
        assert_eq!(aig.or_n(&[i0]), i0);
        aig.or_n(&[i0, i1]);
        aig.or_n(&[i0, i1, i2, i3, i4]);

        assert_eq!(aig.xor_n(&[]), Signal::zero());
        assert_eq!(aig.xor_n(&[i0]), i0);
        aig.xor_n(&[i0, i1]);
        aig.xor_n(&[i0, i1, i2, i3, i4]);
    }

    #[test]
    fn test_sweep() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x0 = aig.and(i0, i1);
        let x1 = !aig.and(!i0, !i1);
        let _ = aig.and(x0, i1);
        let x3 = !aig.and(!x1, !i1);
        aig.add_output(x3);
        let t = aig.sweep();
        assert_eq!(t.len(), 4);
        assert_eq!(aig.nb_nodes(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        assert_eq!(
            t,
            vec![
                Signal::zero(),
                Signal::from_var(0),
                Signal::zero(),
                Signal::from_var(1)
            ]
            .into()
        );
    }

    #[test]
    fn test_dedup() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        // Create duplicate and unsorted gates directly, bypassing hashing
        let x0 = aig.add(Gate::and(i0, i1));
        let x0_s = aig.add(Gate::and(i1, i0));
        let x1 = aig.add(Gate::and(x0, i2));
        let x1_s = aig.add(Gate::and(x0_s, i2));
        aig.add_output(x1);
        aig.add_output(x1_s);
        aig.dedup();
        assert_eq!(aig.nb_nodes(), 2);
        assert_eq!(aig.output(0), aig.output(1));
    }

    #[test]
    fn test_dedup_buf() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let b = aig.add(Gate::Buf(i0));
        let x = aig.add(Gate::and(b, i1));
        aig.add_output(!x);
        aig.dedup();
        aig.sweep();
        assert_eq!(aig.nb_nodes(), 1);
        let expected = Gate::and(i0, i1).make_canonical();
        assert_eq!(
            crate::network::Normalization::Node(aig.gate(0).clone(), false),
            expected
        );
    }

    #[test]
    fn test_topo_sort() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let n0 = aig.add(Gate::Buf(Signal::zero()));
        let n1 = aig.add(Gate::and(i0, i1));
        aig.replace(0, Gate::and(n1, i2));
        aig.add_output(n0);
        assert!(!aig.is_topo_sorted());
        aig.topo_sort();
        assert!(aig.is_topo_sorted());
        assert_eq!(aig.nb_nodes(), 2);
        // The And over the inputs now comes first
        assert_eq!(aig.gate(0), &Gate::and(i0, i1));
        assert_eq!(aig.output(0), Signal::from_var(1));
    }

    #[test]
    fn test_substitute() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let f1 = aig.and(i0, i1);
        let f2 = aig.and(f1, i2);
        aig.add_output(f2);
        aig.add_output(!f1);

        aig.substitute(f1.var(), i0);
        // The user gate is rewired, with the polarity of each use preserved
        let expected = match Gate::and(i0, i2).make_canonical() {
            crate::network::Normalization::Node(g, false) => g,
            _ => unreachable!(),
        };
        assert_eq!(aig.gate(f2.var() as usize), &expected);
        assert_eq!(aig.output(0), f2);
        assert_eq!(aig.output(1), !i0);

        // The substituted node is reclaimed by cleanup
        aig.cleanup();
        assert_eq!(aig.nb_nodes(), 1);
    }

    #[test]
    fn test_cleanup() {
        let mut aig = Network::default();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x0 = aig.and(i0, i1);
        let _unused = aig.and(!i0, i1);
        let b = aig.add(Gate::Buf(!x0));
        aig.add_output(b);
        aig.cleanup();
        assert_eq!(aig.nb_nodes(), 1);
        assert_eq!(aig.output(0), !Signal::from_var(0));
        assert!(aig.is_topo_sorted());
    }
}
