//! Depth reduction by re-associating And chains
//!
//! The pass walks the gates that sit on a critical path and looks two levels
//! down the deepest chain. Where `root = x & mid` and `mid = y & top` with
//! `top` carrying the depth, it rebuilds the cone as `(x & y) & top` whenever
//! the new arrangement is strictly shallower, then rewires every use of the
//! old root. Sweeps repeat until a full pass applies no rewrite.

use std::cmp;

use crate::network::DepthView;
use crate::{Gate, Network, Signal};

/// Classify the fanins of a 2-input And by critical-path membership
///
/// Returns how many of the two fanins are on a critical path (0, 1 or 2),
/// followed by the fanin signals with the critical one first. When both or
/// neither are critical, the tie is broken deterministically in favor of the
/// second fanin. Fails if the node is not a 2-input And.
fn critical_fanins(
    aig: &Network,
    depth: &DepthView,
    node: u32,
) -> Result<(usize, Signal, Signal), String> {
    let (a, b) = match aig.gate(node as usize) {
        Gate::And([a, b]) => (*a, *b),
        g => {
            return Err(format!(
                "Node x{node} has {} fanins, expected a 2-input And",
                g.dependencies().len()
            ))
        }
    };
    let ca = depth.is_on_critical_path(a);
    let cb = depth.is_on_critical_path(b);
    Ok(if ca {
        if cb {
            (2, a, b)
        } else {
            (1, a, b)
        }
    } else if cb {
        (1, b, a)
    } else {
        (0, b, a)
    })
}

/// Try the associativity rule on a node. Returns true if the network was updated
///
/// The rewrite only fires when it provably shortens the critical path: the
/// chain through the node must be the only deep branch at both levels, the
/// critical edge must not be inverted, and the rebuilt cone must come out
/// strictly shallower than the current root.
fn try_associativity(aig: &mut Network, depth: &DepthView, root: u32) -> Result<bool, String> {
    if !aig.gate(root as usize).is_and() {
        return Ok(false);
    }
    if !depth.is_on_critical_path(aig.node(root as usize)) {
        return Ok(false);
    }

    let (count_root, crit_root_mid, noncrit_root_mid) = critical_fanins(aig, depth, root)?;

    // Nothing to shorten when both branches carry the depth
    if count_root != 1 {
        return Ok(false);
    }

    // There is nothing deeper to restructure below an input,
    // and the rule only applies to a plain And chain
    if !crit_root_mid.is_var() {
        return Ok(false);
    }
    if crit_root_mid.is_inverted() {
        return Ok(false);
    }
    let mid = crit_root_mid.var();

    let (count_mid, crit_mid_top, noncrit_mid_top) = critical_fanins(aig, depth, mid)?;
    if count_mid != 1 {
        return Ok(false);
    }

    let level_root = depth.level(aig.node(root as usize));
    let level_top = depth.level(crit_mid_top);
    let level_noncrit_mid = depth.level(noncrit_root_mid);
    let level_noncrit_top = depth.level(noncrit_mid_top);

    // Depth of the rebuilt cone: the two non-critical operands are combined
    // first, the deep operand joins last
    let candidate = cmp::max(
        cmp::max(level_noncrit_mid + 1, level_noncrit_top + 1),
        level_top,
    ) + 1;
    if candidate >= level_root {
        return Ok(false);
    }
    if level_noncrit_mid >= level_top {
        return Ok(false);
    }

    let shallow = aig.and(noncrit_root_mid, noncrit_mid_top);
    let new_root = aig.and(shallow, crit_mid_top);
    aig.substitute(root, new_root);
    Ok(true)
}

/// Try the distributivity rule on a node. Returns true if the network was updated
///
/// Not implemented yet: the rule always declines.
fn try_distributivity(_aig: &mut Network, _depth: &DepthView, _root: u32) -> Result<bool, String> {
    Ok(false)
}

/// Try the algebraic rules on a node in priority order, stopping at the first success
fn try_algebraic_rules(aig: &mut Network, depth: &DepthView, root: u32) -> Result<bool, String> {
    if try_associativity(aig, depth, root)? {
        return Ok(true);
    }
    if try_distributivity(aig, depth, root)? {
        return Ok(true);
    }
    Ok(false)
}

/// Reduce the depth of a network by re-associating And chains
///
/// Sweeps all gates until a fixed point, with a sweep budget derived from the
/// initial levels. Returns the number of rewrites applied. The function of
/// the network is preserved and its depth never increases. Substituted nodes
/// are left unreferenced in the arena; run [`Network::cleanup`] afterwards to
/// reclaim them.
///
/// Fails if a node on an inspected critical chain is not a 2-input And; the
/// network is left as it was before the offending inspection.
pub fn rebalance(aig: &mut Network) -> Result<usize, String> {
    let depth = DepthView::from_network(aig);
    let max_sweeps = (0..aig.nb_nodes())
        .map(|i| depth.level(aig.node(i)) as usize)
        .sum::<usize>()
        + 1;
    rebalance_bounded(aig, max_sweeps)
}

/// Reduce the depth of a network, with an explicit bound on the number of sweeps
///
/// Reaching the bound stops the pass quietly, as if a fixed point was reached.
pub fn rebalance_bounded(aig: &mut Network, max_sweeps: usize) -> Result<usize, String> {
    rebalance_with_observer(aig, max_sweeps, |_, _| ())
}

/// Reduce the depth of a network, reporting the state after each sweep
///
/// The observer is called with the sweep number and the current network after
/// every sweep; it has no influence on the result. Useful to dump
/// intermediate networks when debugging.
pub fn rebalance_with_observer<F: FnMut(usize, &Network)>(
    aig: &mut Network,
    max_sweeps: usize,
    mut observer: F,
) -> Result<usize, String> {
    let mut depth = DepthView::from_network(aig);
    let mut nb_rewrites = 0;
    for sweep in 0..max_sweeps {
        let mut changed = false;
        let mut i: u32 = 0;
        // Nodes created during the sweep are visited by the same sweep
        while (i as usize) < aig.nb_nodes() {
            if try_algebraic_rules(aig, &depth, i)? {
                depth.update(aig);
                changed = true;
                nb_rewrites += 1;
            }
            i += 1;
        }
        observer(sweep, aig);
        if !changed {
            break;
        }
    }
    Ok(nb_rewrites)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::{rebalance, rebalance_bounded, rebalance_with_observer};
    use crate::equiv::check_equivalence;
    use crate::network::DepthView;
    use crate::{Gate, Network};

    /// Chain where the deep operand sits below two shallow ones:
    /// `a & (b & c)` with `c` itself a 2-level cone
    fn unbalanced_chain() -> Network {
        let mut aig = Network::new();
        let x = aig.add_input();
        let y = aig.add_input();
        let z = aig.add_input();
        let b = aig.add_input();
        let a = aig.add_input();
        let c1 = aig.and(x, y);
        let c = aig.and(c1, z);
        let mid = aig.and(b, c);
        let root = aig.and(a, mid);
        aig.add_output(root);
        aig
    }

    #[test]
    fn test_accepts_unbalanced_chain() {
        let mut aig = unbalanced_chain();
        let reference = aig.clone();
        assert_eq!(DepthView::from_network(&aig).depth(), 4);

        let nb = rebalance(&mut aig).unwrap();
        assert_eq!(nb, 1);
        assert_eq!(DepthView::from_network(&aig).depth(), 3);

        aig.cleanup();
        check_equivalence(&reference, &aig, 0, 0).unwrap();
    }

    #[test]
    fn test_left_linear_chain() {
        let mut aig = Network::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let e = aig.add_input();
        let t1 = aig.and(a, b);
        let t2 = aig.and(t1, c);
        let t3 = aig.and(t2, d);
        let t4 = aig.and(t3, e);
        aig.add_output(t4);
        let reference = aig.clone();
        assert_eq!(DepthView::from_network(&aig).depth(), 4);

        rebalance(&mut aig).unwrap();
        assert_eq!(DepthView::from_network(&aig).depth(), 3);

        aig.cleanup();
        check_equivalence(&reference, &aig, 0, 0).unwrap();
    }

    #[test]
    fn test_rejects_two_critical_fanins() {
        let mut aig = Network::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let i3 = aig.add_input();
        let m1 = aig.and(i0, i1);
        let m2 = aig.and(i2, i3);
        let root = aig.and(m1, m2);
        aig.add_output(root);
        let reference = aig.clone();

        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, reference);
    }

    #[test]
    fn test_rejects_input_chain() {
        // The critical chain bottoms out on primary inputs right away
        let mut aig = Network::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let m = aig.and(i1, i2);
        let root = aig.and(i0, m);
        aig.add_output(root);
        let reference = aig.clone();

        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, reference);
    }

    /// Chain where only the root is a rewrite candidate: the deep cone below
    /// it is balanced, so nothing below the root can fire
    fn chain_with_balanced_cone(invert_critical_edge: bool) -> Network {
        let mut aig = Network::new();
        let x = aig.add_input();
        let y = aig.add_input();
        let z = aig.add_input();
        let w = aig.add_input();
        let b = aig.add_input();
        let a = aig.add_input();
        let t1 = aig.and(x, y);
        let t2 = aig.and(z, w);
        let top = aig.and(t1, t2);
        let mid = aig.and(b, top);
        let root = aig.and(a, mid ^ invert_critical_edge);
        aig.add_output(root);
        aig
    }

    #[test]
    fn test_rejects_complemented_edge() {
        // The same shape with a plain critical edge is rewritten, so the
        // inversion is the only blocker
        let mut accepted = chain_with_balanced_cone(false);
        assert_eq!(rebalance(&mut accepted).unwrap(), 1);

        let mut aig = chain_with_balanced_cone(true);
        let reference = aig.clone();
        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, reference);
    }

    #[test]
    fn test_rejects_no_improvement() {
        // The non-critical branch is as deep as the grandparent: re-associating
        // would not shorten anything
        let mut aig = Network::new();
        let x = aig.add_input();
        let y = aig.add_input();
        let z = aig.add_input();
        let a = aig.add_input();
        let b = aig.add_input();
        let m = aig.and(a, b);
        let c1 = aig.and(x, y);
        let c = aig.and(c1, z);
        let root = aig.and(m, c);
        aig.add_output(root);
        let reference = aig.clone();

        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, reference);
    }

    #[test]
    fn test_fanout_polarity_preserved() {
        // The rewritten node feeds two outputs with opposite polarities;
        // both must be rewired to the replacement, keeping their polarity
        let mut aig = Network::new();
        let x = aig.add_input();
        let y = aig.add_input();
        let z = aig.add_input();
        let b = aig.add_input();
        let a = aig.add_input();
        let c1 = aig.and(x, y);
        let c = aig.and(c1, z);
        let mid = aig.and(b, c);
        let root = aig.and(a, mid);
        aig.add_output(root);
        aig.add_output(mid);
        aig.add_output(!mid);
        let reference = aig.clone();

        assert_eq!(rebalance(&mut aig).unwrap(), 1);
        assert_ne!(aig.output(1), mid);
        assert_eq!(aig.output(1), !aig.output(2));

        aig.cleanup();
        assert_eq!(aig.output(1), !aig.output(2));
        check_equivalence(&reference, &aig, 0, 0).unwrap();
    }

    #[test]
    fn test_idempotent() {
        let mut aig = unbalanced_chain();
        rebalance(&mut aig).unwrap();
        let after_first = aig.clone();

        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, after_first);

        aig.cleanup();
        let after_cleanup = aig.clone();
        assert_eq!(rebalance(&mut aig).unwrap(), 0);
        assert_eq!(aig, after_cleanup);
    }

    #[test]
    fn test_sweep_bound() {
        let mut aig = unbalanced_chain();
        // A zero budget leaves the network untouched
        let reference = aig.clone();
        assert_eq!(rebalance_bounded(&mut aig, 0).unwrap(), 0);
        assert_eq!(aig, reference);
        // One sweep is enough here
        assert_eq!(rebalance_bounded(&mut aig, 1).unwrap(), 1);
    }

    #[test]
    fn test_observer_called() {
        let mut aig = unbalanced_chain();
        let mut sweeps = Vec::new();
        rebalance_with_observer(&mut aig, 100, |sweep, _| sweeps.push(sweep)).unwrap();
        // One sweep with a rewrite, one to confirm the fixed point
        assert_eq!(sweeps, vec![0, 1]);
    }

    #[test]
    fn test_malformed_chain() {
        let mut aig = Network::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let x = aig.and(i0, i1);
        let b = aig.add(Gate::Buf(x));
        let root = aig.and(b, i2);
        aig.add_output(root);

        assert!(rebalance(&mut aig).is_err());
    }

    fn random_network(nb_inputs: usize, nb_gates: usize, nb_outputs: usize, seed: u64) -> Network {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut aig = Network::new();
        let mut sigs = Vec::new();
        for _ in 0..nb_inputs {
            sigs.push(aig.add_input());
        }
        for _ in 0..nb_gates {
            let a = sigs[rng.gen_range(0..sigs.len())] ^ rng.gen::<bool>();
            let b = sigs[rng.gen_range(0..sigs.len())] ^ rng.gen::<bool>();
            sigs.push(aig.and(a, b));
        }
        for _ in 0..nb_outputs {
            let s = sigs[rng.gen_range(0..sigs.len())] ^ rng.gen::<bool>();
            aig.add_output(s);
        }
        aig
    }

    #[test]
    fn test_random_networks() {
        for seed in 0..20 {
            let mut aig = random_network(6, 30, 4, seed);
            let reference = aig.clone();
            let depth_before = DepthView::from_network(&aig).depth();

            rebalance(&mut aig).unwrap();
            let depth_after = DepthView::from_network(&aig).depth();
            assert!(depth_after <= depth_before);

            aig.cleanup();
            assert_eq!(DepthView::from_network(&aig).depth(), depth_after);
            check_equivalence(&reference, &aig, 0, seed).unwrap();
        }
    }
}
