use core::slice;
use std::fmt;

use crate::network::signal::Signal;

/// Logic gate of an And-Inverter Graph
///
/// Gates have a canonical form, which makes simplification and deduplication
/// straightforward: And inputs are sorted, constant inputs and duplicate
/// inputs are simplified away at creation time. Inversions live on the
/// signals, so there is no inverter gate.
///
/// `Buf` never appears in a canonical network: it is a transient alias kept
/// by node substitution and file loading until the next cleanup resolves it.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Gate {
    /// 2-input And gate
    And([Signal; 2]),
    /// Buf or Not, aliasing another signal
    Buf(Signal),
}

/// Result of normalizing a logic gate
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Normalization {
    /// A gate, with an optional inverted output
    Node(Gate, bool),
    /// The trivial case, where the gate reduces to a single signal or constant
    Copy(Signal),
}

impl Gate {
    /// Create a 2-input And
    pub fn and(a: Signal, b: Signal) -> Gate {
        Gate::And([a, b])
    }

    /// Returns whether the gate is in canonical form
    pub fn is_canonical(&self) -> bool {
        match self {
            Gate::And([a, b]) => a < b && a.ind() != b.ind() && !a.is_constant(),
            Gate::Buf(_) => false,
        }
    }

    /// Obtain the canonical form of the gate
    pub fn make_canonical(&self) -> Normalization {
        match self {
            Gate::And([a, b]) => make_and(*a, *b, false),
            Gate::Buf(s) => Normalization::Copy(*s),
        }
    }

    /// Obtain all signals feeding this gate
    pub fn dependencies(&self) -> &[Signal] {
        match self {
            Gate::And(s) => s,
            Gate::Buf(s) => slice::from_ref(s),
        }
    }

    /// Obtain all internal variables feeding this gate (not inputs or constants)
    pub fn vars(&self) -> impl Iterator<Item = u32> + '_ {
        self.dependencies()
            .iter()
            .filter(|s| s.is_var())
            .map(|s| s.var())
    }

    /// Returns whether the gate is an And
    pub fn is_and(&self) -> bool {
        matches!(self, Gate::And(_))
    }

    /// Returns whether the gate is a Buf
    pub fn is_buf(&self) -> bool {
        matches!(self, Gate::Buf(_))
    }

    /// Apply a remapping of the signals to the gate
    pub(crate) fn remap<F: Fn(&Signal) -> Signal>(&self, t: F) -> Gate {
        match self {
            Gate::And([a, b]) => Gate::And([t(a), t(b)]),
            Gate::Buf(s) => Gate::Buf(t(s)),
        }
    }

    /// Apply a remapping of variable order to the gate
    pub(crate) fn remap_order(&self, t: &[Signal]) -> Gate {
        self.remap(|s| s.remap_order(t))
    }
}

/// Normalize an And: sort the inputs and handle constant and duplicate inputs
fn make_and(a: Signal, b: Signal, inv: bool) -> Normalization {
    use Normalization::*;
    let (i0, i1) = sort_2(a, b);
    if i0 == Signal::zero() || i0 == !i1 {
        Copy(Signal::zero() ^ inv)
    } else if i0 == Signal::one() || i0 == i1 {
        Copy(i1 ^ inv)
    } else {
        Node(Gate::And([i0, i1]), inv)
    }
}

fn sort_2(a: Signal, b: Signal) -> (Signal, Signal) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::And([a, b]) => write!(f, "{a} & {b}"),
            Gate::Buf(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_folding() {
        use Normalization::*;
        let x = Signal::from_var(0);
        let y = Signal::from_var(1);
        assert_eq!(Gate::and(x, Signal::zero()).make_canonical(), Copy(Signal::zero()));
        assert_eq!(Gate::and(x, Signal::one()).make_canonical(), Copy(x));
        assert_eq!(Gate::and(x, x).make_canonical(), Copy(x));
        assert_eq!(Gate::and(x, !x).make_canonical(), Copy(Signal::zero()));
        assert_eq!(Gate::and(!x, !x).make_canonical(), Copy(!x));
        assert_eq!(
            Gate::and(y, x).make_canonical(),
            Node(Gate::And([x, y]), false)
        );
    }

    #[test]
    fn test_and_canonical() {
        let x = Signal::from_var(0);
        let y = Signal::from_var(1);
        assert!(Gate::And([x, y]).is_canonical());
        assert!(Gate::And([x, !y]).is_canonical());
        assert!(!Gate::And([y, x]).is_canonical());
        assert!(!Gate::And([x, x]).is_canonical());
        assert!(!Gate::And([x, !x]).is_canonical());
        assert!(!Gate::And([Signal::zero(), x]).is_canonical());
    }

    #[test]
    fn test_buf() {
        use Normalization::*;
        let x = Signal::from_var(0);
        assert_eq!(Gate::Buf(x).make_canonical(), Copy(x));
        assert_eq!(Gate::Buf(!x).make_canonical(), Copy(!x));
        assert!(!Gate::Buf(x).is_canonical());
        assert!(Gate::Buf(x).is_buf());
        assert!(!Gate::Buf(x).is_and());
    }

    #[test]
    fn test_dependencies() {
        let x = Signal::from_var(0);
        let i = Signal::from_input(0);
        let g = Gate::and(x, !i);
        assert_eq!(g.dependencies(), &[x, !i]);
        assert_eq!(g.vars().collect::<Vec<_>>(), vec![0]);
        let b = Gate::Buf(!x);
        assert_eq!(b.dependencies(), &[!x]);
        assert_eq!(b.vars().collect::<Vec<_>>(), vec![0]);
    }
}
