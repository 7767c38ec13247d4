//! Lattice trait for data flow analysis.
//!
//! A lattice defines how abstract values combine at control flow join points.
//! Every state type used with the solver implements [`JoinSemiLattice`].
//!
//! # Lattice Theory Background
//!
//! For a may-analysis the combining operation is the least upper bound:
//!
//! - **Partial Order**: elements can be compared (⊆)
//! - **Join (∨)**: least upper bound of two elements
//! - **Bottom (⊥)**: the empty, unconstrained element every state starts from
//!
//! The solver only terminates when the join is monotone and the lattice has
//! finite height; both are the caller's responsibility.

use std::fmt::Debug;

/// A join semi-lattice with an in-place join (least upper bound) operation.
///
/// The join combines information from multiple control flow paths. It must
/// satisfy:
///
/// - **Idempotent**: `x.join_from(&x)` leaves `x` unchanged
/// - **Commutative**: joining `a` into `b` and `b` into `a` agree
/// - **Associative**: grouping of successive joins does not matter
/// - **Monotone**: after `x.join_from(&y)`, `x` covers both inputs
///
/// Equality (`PartialEq`) must distinguish any two elements whose join would
/// change the solver's scheduling decisions; inequality after a transfer is
/// what triggers propagation.
pub trait JoinSemiLattice: Clone + Debug + PartialEq {
    /// Joins `other` into `self`, making `self` the least upper bound.
    fn join_from(&mut self, other: &Self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    impl JoinSemiLattice for BTreeSet<u32> {
        fn join_from(&mut self, other: &Self) {
            self.extend(other.iter().copied());
        }
    }

    #[test]
    fn set_join_laws() {
        let a: BTreeSet<u32> = [1, 2].into_iter().collect();
        let b: BTreeSet<u32> = [2, 3].into_iter().collect();
        let c: BTreeSet<u32> = [4].into_iter().collect();

        // Idempotence.
        let mut x = a.clone();
        x.join_from(&a);
        assert_eq!(x, a);

        // Commutativity.
        let mut ab = a.clone();
        ab.join_from(&b);
        let mut ba = b.clone();
        ba.join_from(&a);
        assert_eq!(ab, ba);

        // Associativity.
        let mut left = a.clone();
        left.join_from(&b);
        left.join_from(&c);
        let mut bc = b.clone();
        bc.join_from(&c);
        let mut right = a.clone();
        right.join_from(&bc);
        assert_eq!(left, right);
    }
}
