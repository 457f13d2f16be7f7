//! Word equality and boundary matching over compressed words.
//!
//! Equality of two compressed words is decided on their lengths and
//! fingerprints, so it never expands either word. A fingerprint mismatch is a
//! proof of inequality. Matching fingerprints are accepted, which makes the
//! oracle one-sided Monte-Carlo: for distinct words of length at most `n` it
//! answers "equal" with probability at most `(n / (2^61 - 1))^2` over the two
//! independent bases drawn for the process (see [`crate::fingerprint`]). The
//! bound is only informative while `n` stays well below `2^61`; past that the
//! answer rests on the bases being unknown outside the process.
//!
//! The boundary search of free reduction uses the same test at every step of
//! its binary search and inherits the same error bound per step.
//!
//! The `MatchingTable` memoizes the pairs that were actually queried: the two
//! roots of each equality query and the `(left, right)` junction of each
//! reduced node. It does not record verdicts for their subtrees. Its keys are
//! vertex handles, so a table is only meaningful for the pair of programs it
//! was filled from and must not outlive one top-level operation.

use super::{Slp, Vertex};
use crate::symbol::TerminalSymbol;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::HashMap;

/// Memo of equality verdicts and boundary cancellations for queried pairs.
#[derive(Debug, Clone, Default)]
pub struct MatchingTable<S> {
    equalities: HashMap<(Vertex<S>, Vertex<S>), bool>,
    cancellations: HashMap<(Vertex<S>, Vertex<S>), BigUint>,
    hits: usize,
}

impl<S: TerminalSymbol> MatchingTable<S> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            equalities: HashMap::new(),
            cancellations: HashMap::new(),
            hits: 0,
        }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.equalities.len() + self.cancellations.len()
    }

    /// Returns `true` if nothing has been memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups answered from the table.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.equalities.clear();
        self.cancellations.clear();
        self.hits = 0;
    }
}

/// Decides whether `lhs` in `lhs_slp` and `rhs` in `rhs_slp` denote the same word.
pub fn words_equal<S: TerminalSymbol>(
    lhs_slp: &Slp<S>,
    lhs: Vertex<S>,
    rhs_slp: &Slp<S>,
    rhs: Vertex<S>,
    table: &mut MatchingTable<S>,
) -> bool {
    if std::ptr::eq(lhs_slp, rhs_slp) && lhs == rhs {
        return true;
    }
    if let Some(&known) = table.equalities.get(&(lhs, rhs)) {
        table.hits += 1;
        return known;
    }
    let equal = lhs_slp.fingerprint(lhs).matches(&rhs_slp.fingerprint(rhs))
        && *lhs_slp.length_ref(lhs) == *rhs_slp.length_ref(rhs);
    table.equalities.insert((lhs, rhs), equal);
    equal
}

/// Largest `k` such that the last `k` symbols of `left` are the inverse of the
/// first `k` symbols of `right`.
///
/// Cancellation is monotone in `k`, so the boundary is found by binary search
/// over suffix fingerprints of `left` and of the inverse view of `right`.
pub(crate) fn cancellation_length<S: TerminalSymbol>(
    slp: &Slp<S>,
    left: Vertex<S>,
    right: Vertex<S>,
    table: &mut MatchingTable<S>,
) -> BigUint {
    let (Some(last), Some(first)) = (slp.last_symbol(left), slp.first_symbol(right)) else {
        return BigUint::zero();
    };
    if last != -first {
        return BigUint::zero();
    }
    if let Some(known) = table.cancellations.get(&(left, right)) {
        table.hits += 1;
        return known.clone();
    }
    let inverse_right = right.negate();
    let mut lo = BigUint::one();
    let mut hi = slp.length(left).min(slp.length(right));
    while lo < hi {
        let mid: BigUint = (&lo + &hi + 1u32) >> 1u32;
        let tail = slp.suffix_fingerprint(left, &mid);
        let head = slp.suffix_fingerprint(inverse_right, &mid);
        if tail.matches(&head) {
            lo = mid;
        } else {
            hi = mid - 1u32;
        }
    }
    table.cancellations.insert((left, right), lo.clone());
    lo
}
