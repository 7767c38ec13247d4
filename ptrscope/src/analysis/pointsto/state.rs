//! The points-to lattice.
//!
//! [`PointsToState`] tracks two disjoint relations, because SSA temporaries
//! and memory cells behave differently:
//!
//! - **Alias bindings**: `t → {x, y}` means the temporary `t` stands for `x`
//!   or `y`. Written by loads, address computations, casts, argument passing,
//!   and returns. Reads of `t` are forwarded through the binding.
//! - **Points-to**: `p → {a, b}` means the memory cell `p` may currently
//!   contain `a` or `b`. Written by stores and bulk copies, read by loads.
//!
//! An absent key means "unconstrained": joining it with anything yields the
//! other side. Both maps are ordered so every observable iteration is
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::dataflow::JoinSemiLattice;
use crate::ir::ValueId;

/// Per-program-point may-points-to state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToState {
    bindings: BTreeMap<ValueId, BTreeSet<ValueId>>,
    points_to: BTreeMap<ValueId, BTreeSet<ValueId>>,
}

impl PointsToState {
    /// Creates the bottom element: nothing bound, nothing pointed to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `v` has an alias binding.
    #[must_use]
    pub fn has_binding(&self, v: ValueId) -> bool {
        self.bindings.contains_key(&v)
    }

    /// Returns the alias binding of `v`, if any.
    #[must_use]
    pub fn binding(&self, v: ValueId) -> Option<&BTreeSet<ValueId>> {
        self.bindings.get(&v)
    }

    /// Binds `v` to the given set, replacing any previous binding.
    ///
    /// An empty set means "unconstrained" and clears the binding instead.
    pub fn set_binding(&mut self, v: ValueId, targets: BTreeSet<ValueId>) {
        if targets.is_empty() {
            self.bindings.remove(&v);
        } else {
            self.bindings.insert(v, targets);
        }
    }

    /// Unions the given set into the binding of `v` (weak update).
    pub fn merge_binding(&mut self, v: ValueId, targets: &BTreeSet<ValueId>) {
        if targets.is_empty() {
            return;
        }
        self.bindings
            .entry(v)
            .or_default()
            .extend(targets.iter().copied());
    }

    /// Returns the raw points-to entry of a cell, without alias forwarding.
    #[must_use]
    pub fn cell_contents(&self, cell: ValueId) -> Option<&BTreeSet<ValueId>> {
        self.points_to.get(&cell)
    }

    /// Overwrites the contents of a cell (strong update).
    ///
    /// An empty set clears the entry.
    pub fn set_pts(&mut self, cell: ValueId, contents: BTreeSet<ValueId>) {
        if contents.is_empty() {
            self.points_to.remove(&cell);
        } else {
            self.points_to.insert(cell, contents);
        }
    }

    /// Unions contents into a cell (weak update).
    pub fn merge_pts(&mut self, cell: ValueId, contents: &BTreeSet<ValueId>) {
        if contents.is_empty() {
            return;
        }
        self.points_to
            .entry(cell)
            .or_default()
            .extend(contents.iter().copied());
    }

    /// Returns what a load through `v` may observe: the union of the
    /// contents of every concrete cell `v` resolves to.
    ///
    /// Alias bindings are forwarded transparently, so the caller never needs
    /// to normalize `v` first.
    #[must_use]
    pub fn pts(&self, v: ValueId) -> BTreeSet<ValueId> {
        let mut result = BTreeSet::new();
        for cell in self.resolve_pointer(v) {
            if let Some(contents) = self.points_to.get(&cell) {
                result.extend(contents.iter().copied());
            }
        }
        result
    }

    /// Expands alias bindings transitively until reaching concrete cells.
    ///
    /// An unbound value is its own cell. Binding cycles (possible through
    /// recursion) are handled with a visited set.
    #[must_use]
    pub fn resolve_pointer(&self, v: ValueId) -> BTreeSet<ValueId> {
        let mut cells = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut worklist = vec![v];
        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.bindings.get(&current) {
                Some(targets) => worklist.extend(targets.iter().copied()),
                None => {
                    cells.insert(current);
                }
            }
        }
        cells
    }

    /// Returns the binding of `v` when present, else the singleton `{v}`.
    #[must_use]
    pub fn resolve_value(&self, v: ValueId) -> BTreeSet<ValueId> {
        match self.bindings.get(&v) {
            Some(targets) => targets.clone(),
            None => BTreeSet::from([v]),
        }
    }

    /// Returns every cell transitively reachable from `roots` through the
    /// points-to relation, including the roots themselves.
    #[must_use]
    pub fn reachable_cells(&self, roots: &BTreeSet<ValueId>) -> BTreeSet<ValueId> {
        let mut reached = BTreeSet::new();
        let mut worklist: Vec<ValueId> = roots.iter().copied().collect();
        while let Some(cell) = worklist.pop() {
            if !reached.insert(cell) {
                continue;
            }
            if let Some(contents) = self.points_to.get(&cell) {
                worklist.extend(contents.iter().copied());
            }
        }
        reached
    }

    /// Iterates over the alias bindings in deterministic order.
    pub fn bindings(&self) -> impl Iterator<Item = (ValueId, &BTreeSet<ValueId>)> {
        self.bindings.iter().map(|(&v, s)| (v, s))
    }

    /// Iterates over the points-to entries in deterministic order.
    pub fn cells(&self) -> impl Iterator<Item = (ValueId, &BTreeSet<ValueId>)> {
        self.points_to.iter().map(|(&v, s)| (v, s))
    }
}

impl JoinSemiLattice for PointsToState {
    /// Pointwise union over both maps; overlapping keys union their sets.
    fn join_from(&mut self, other: &Self) {
        for (&v, targets) in &other.bindings {
            self.bindings
                .entry(v)
                .or_default()
                .extend(targets.iter().copied());
        }
        for (&cell, contents) in &other.points_to {
            self.points_to
                .entry(cell)
                .or_default()
                .extend(contents.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> ValueId {
        ValueId::new(i)
    }

    fn set(ids: &[usize]) -> BTreeSet<ValueId> {
        ids.iter().map(|&i| v(i)).collect()
    }

    #[test]
    fn transparent_deref_through_bindings() {
        let mut s = PointsToState::new();
        // t aliases the cell p; p holds {f, g}.
        s.set_binding(v(1), set(&[2]));
        s.set_pts(v(2), set(&[3, 4]));

        assert_eq!(s.pts(v(1)), set(&[3, 4]));
        assert_eq!(s.pts(v(2)), set(&[3, 4]));
        assert_eq!(s.resolve_pointer(v(1)), set(&[2]));
        assert_eq!(s.resolve_pointer(v(5)), set(&[5]));
    }

    #[test]
    fn binding_cycles_terminate() {
        let mut s = PointsToState::new();
        s.set_binding(v(1), set(&[2]));
        s.set_binding(v(2), set(&[1, 3]));
        assert_eq!(s.resolve_pointer(v(1)), set(&[3]));
    }

    #[test]
    fn join_is_pointwise_union() {
        let mut a = PointsToState::new();
        a.set_binding(v(1), set(&[10]));
        a.set_pts(v(5), set(&[20]));

        let mut b = PointsToState::new();
        b.set_binding(v(1), set(&[11]));
        b.set_pts(v(6), set(&[21]));

        a.join_from(&b);
        assert_eq!(a.binding(v(1)), Some(&set(&[10, 11])));
        assert_eq!(a.cell_contents(v(5)), Some(&set(&[20])));
        assert_eq!(a.cell_contents(v(6)), Some(&set(&[21])));
    }

    #[test]
    fn join_laws() {
        let mut a = PointsToState::new();
        a.set_binding(v(1), set(&[10]));
        let mut b = PointsToState::new();
        b.set_pts(v(2), set(&[11]));
        let mut c = PointsToState::new();
        c.set_binding(v(1), set(&[12]));

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

        // Monotonicity: the join covers both operands.
        assert_eq!(left.binding(v(1)), Some(&set(&[10, 12])));
        assert_eq!(left.cell_contents(v(2)), Some(&set(&[11])));
    }

    #[test]
    fn reachable_cells_follows_contents() {
        let mut s = PointsToState::new();
        s.set_pts(v(1), set(&[2]));
        s.set_pts(v(2), set(&[3]));
        assert_eq!(s.reachable_cells(&set(&[1])), set(&[1, 2, 3]));
    }
}
