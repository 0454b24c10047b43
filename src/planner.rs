//! # Index planner
//!
//! For a relation of arity *N*, computes a covering set of column
//! permutations: for every non-empty subset `S` of `[0..N)`, at least one
//! planned permutation has `S` as the set of its first `|S|` positions.
//! That is what lets [`crate::store::Store::from`] answer any pattern with
//! a contiguous (after permutation) set of bound columns via a single
//! prefix scan.
//!
//! For arity 3 the planner's output includes `{(0,1,2), (1,2,0), (2,0,1)}`,
//! the literal example in the spec (plus a couple more permutations the
//! construction below also produces). Cyclic rotation alone only covers
//! arity 3, though: it misses e.g. `{0,2}` at arity 4, since the rotation
//! starting at 0 puts column 1 between 0 and 2. A fixed, small permutation
//! set cannot cover every subset for arbitrary *N* — the subset `S` itself
//! has to show up somewhere as a prefix, and the only way to guarantee that
//! for every one of the `2^N - 1` non-empty subsets is to build one
//! permutation *per subset*: `plan` emits, for each non-empty `S ⊆ [0..N)`,
//! the permutation `sorted(S) ++ sorted([0..N) \ S)`. `S`'s own elements
//! are exactly its first `|S|` positions by construction, so the covering
//! contract holds trivially rather than needing a clever rotation scheme.
//! Duplicate permutations (the same ordering produced by two different
//! subsets — every permutation is generated at least once, by its own
//! prefix set) are collapsed, but coverage never depends on that: each
//! subset already covers itself before dedup runs. This is the
//! non-minimal "full" covering set the spec (§3) explicitly allows in
//! place of a minimal one, at the combinatorial write-amplification cost
//! the spec's design notes (§9) already accept.

use std::collections::HashSet;

/// A covering set of column permutations for a relation of a given arity.
#[derive(Debug, Clone)]
pub struct IndexPlan {
    arity: usize,
    permutations: Vec<Vec<usize>>,
}

impl IndexPlan {
    /// Build a plan from a caller-supplied permutation set, bypassing
    /// `plan`'s automatic construction. The caller is responsible for the
    /// covering contract (every non-empty column subset has a prefix
    /// match); `covering` simply returns `None` for subsets it doesn't
    /// find, which the store surfaces as `UsageError::NoCoveringPermutation`.
    pub fn from_permutations(arity: usize, permutations: Vec<Vec<usize>>) -> Self {
        IndexPlan { arity, permutations }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn permutations(&self) -> &[Vec<usize>] {
        &self.permutations
    }

    /// Find a permutation whose first `bound.len()` positions are exactly
    /// `bound` (as a set, any order), along with its index in
    /// `permutations()` (this index is also the on-disk permutation id).
    /// Iteration order over `permutations()` is the documented tie-break
    /// when more than one permutation qualifies.
    pub fn covering(&self, bound: &[usize]) -> Option<(usize, &[usize])> {
        let bound_set: HashSet<usize> = bound.iter().copied().collect();
        self.permutations.iter().enumerate().find_map(|(id, perm)| {
            let prefix: HashSet<usize> = perm[..bound_set.len()].iter().copied().collect();
            (prefix == bound_set).then_some((id, perm.as_slice()))
        })
    }
}

/// Compute a covering permutation set for arity `n`.
///
/// Enumerates every non-empty subset `S` of `[0..n)` (as a bitmask) and
/// emits the permutation `sorted(S) ++ sorted(complement of S)`. `S`'s
/// elements occupy exactly the permutation's first `|S|` positions, so
/// `S` trivially covers itself; every non-empty subset is handled this
/// way, so the whole set covers every subset. `2^n - 1` masks are
/// considered, but distinct subsets can and do produce the same
/// permutation (`{0}` and `{0,1}` both start with `sorted` runs that
/// agree up to where they diverge), so the result is deduplicated; this
/// never drops coverage since a mask's own permutation is still present
/// under some other mask when it collapses.
pub fn plan(n: usize) -> IndexPlan {
    if n == 0 {
        return IndexPlan { arity: 0, permutations: vec![vec![]] };
    }
    let mut seen = HashSet::new();
    let mut permutations = Vec::new();
    for mask in 1u32..(1 << n) {
        let subset = (0..n).filter(|&c| mask & (1 << c) != 0);
        let complement = (0..n).filter(|&c| mask & (1 << c) == 0);
        let perm: Vec<usize> = subset.chain(complement).collect();
        if seen.insert(perm.clone()) {
            permutations.push(perm);
        }
    }
    IndexPlan { arity: n, permutations }
}
