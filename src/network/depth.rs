use crate::network::gates::Gate;
use crate::network::network::Network;
use crate::network::signal::Signal;

/// Logic levels and critical-path information for a network
///
/// The level of a primary input or constant is 0; the level of an And gate is
/// one more than the highest level among its fanins; a Buf sits at the level
/// of the signal it aliases. The network depth is the highest level among the
/// output signals, and a node is on a critical path when some input-to-output
/// path through it has exactly that length.
///
/// Levels are not kept up to date automatically: call [`DepthView::update`]
/// after mutating the network. Traversal does not rely on index order, so a
/// freshly rewritten, not-yet-sorted network is fine.
#[derive(Debug, Clone)]
pub struct DepthView {
    levels: Vec<u32>,
    critical: Vec<bool>,
    critical_inputs: Vec<bool>,
    depth: u32,
}

/// Marker for levels that are not computed yet
const PENDING: u32 = u32::MAX;

impl DepthView {
    /// Compute levels and critical paths for a network
    pub fn from_network(aig: &Network) -> DepthView {
        let mut view = DepthView {
            levels: Vec::new(),
            critical: Vec::new(),
            critical_inputs: Vec::new(),
            depth: 0,
        };
        view.update(aig);
        view
    }

    /// Recompute levels and critical paths after the network changed
    pub fn update(&mut self, aig: &Network) {
        self.compute_levels(aig);
        self.compute_critical(aig);
    }

    /// Return the network depth: the highest level among the outputs
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Return the level of a signal; constants and inputs are at level 0
    pub fn level(&self, s: Signal) -> u32 {
        if s.is_var() {
            let l = self.levels[s.var() as usize];
            debug_assert!(l != PENDING);
            l
        } else {
            0
        }
    }

    /// Returns whether a signal's node lies on a path realizing the network depth
    ///
    /// The inversion of the signal is ignored; constants are never critical.
    pub fn is_on_critical_path(&self, s: Signal) -> bool {
        if s.is_var() {
            self.critical[s.var() as usize]
        } else if s.is_input() {
            self.critical_inputs[s.input() as usize]
        } else {
            false
        }
    }

    /// Compute the level of every node, walking fanins first
    fn compute_levels(&mut self, aig: &Network) {
        self.levels = vec![PENDING; aig.nb_nodes()];
        for root in 0..aig.nb_nodes() {
            if self.levels[root] != PENDING {
                continue;
            }
            let mut stack = vec![root as u32];
            while let Some(v) = stack.last().copied() {
                if self.levels[v as usize] != PENDING {
                    stack.pop();
                    continue;
                }
                let g = aig.gate(v as usize);
                let mut ready = true;
                for d in g.vars() {
                    if self.levels[d as usize] == PENDING {
                        stack.push(d);
                        ready = false;
                    }
                }
                if !ready {
                    continue;
                }
                stack.pop();
                self.levels[v as usize] = match g {
                    Gate::And([a, b]) => 1 + self.level(*a).max(self.level(*b)),
                    Gate::Buf(s) => self.level(*s),
                };
            }
        }
    }

    /// Mark critical nodes and inputs, walking down from the deepest outputs
    fn compute_critical(&mut self, aig: &Network) {
        self.critical = vec![false; aig.nb_nodes()];
        self.critical_inputs = vec![false; aig.nb_inputs()];
        self.depth = (0..aig.nb_outputs())
            .map(|o| self.level(aig.output(o)))
            .max()
            .unwrap_or(0);

        let mut to_visit = Vec::new();
        for o in 0..aig.nb_outputs() {
            let s = aig.output(o);
            if self.level(s) == self.depth {
                self.mark_critical(s, &mut to_visit);
            }
        }
        while let Some(v) = to_visit.pop() {
            let lv = self.levels[v as usize];
            match aig.gate(v as usize) {
                Gate::And([a, b]) => {
                    for s in [*a, *b] {
                        if self.level(s) + 1 == lv {
                            self.mark_critical(s, &mut to_visit);
                        }
                    }
                }
                Gate::Buf(s) => {
                    if self.level(*s) == lv {
                        self.mark_critical(*s, &mut to_visit);
                    }
                }
            }
        }
    }

    fn mark_critical(&mut self, s: Signal, to_visit: &mut Vec<u32>) {
        if s.is_var() {
            let v = s.var();
            if !self.critical[v as usize] {
                self.critical[v as usize] = true;
                to_visit.push(v);
            }
        } else if s.is_input() {
            self.critical_inputs[s.input() as usize] = true;
        }
    }
}
