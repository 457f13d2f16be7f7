//! Free reduction of compressed words.
//!
//! Every stored node is reduced once, bottom-up: with both children already
//! reduced, the only cancellations left sit at the junction, so the reduced
//! node is `prefix(L, |L| - k) · suffix(R, |R| - k)` for the cancellation
//! length `k` of the pair. The reduced form of a negated view is the negated
//! reduced form of its node.

use super::matching::{cancellation_length, MatchingTable};
use super::{Slp, Vertex};
use crate::arena::VertexId;
use crate::symbol::TerminalSymbol;
use num_traits::Zero;
use std::collections::HashMap;

/// Reduced forms of already processed nodes.
#[derive(Debug, Clone, Default)]
pub struct ReductionCache<S> {
    reduced: HashMap<VertexId, Vertex<S>>,
}

impl<S: TerminalSymbol> ReductionCache<S> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            reduced: HashMap::new(),
        }
    }

    /// Number of reduced nodes.
    pub fn len(&self) -> usize {
        self.reduced.len()
    }

    /// Returns `true` if nothing has been reduced yet.
    pub fn is_empty(&self) -> bool {
        self.reduced.is_empty()
    }
}

/// Returns the freely reduced form of `v`, building new nodes in `slp`.
///
/// `table` and `cache` must come from the same `slp` and may be shared across
/// several roots so that common subtrees are reduced once.
pub fn reduce<S: TerminalSymbol>(
    slp: &mut Slp<S>,
    v: Vertex<S>,
    table: &mut MatchingTable<S>,
    cache: &mut ReductionCache<S>,
) -> Vertex<S> {
    let Some(root) = v.node_id() else {
        return v;
    };
    let order = slp.postorder_nodes(v, |id| cache.reduced.contains_key(&id));
    for id in order {
        let (left, right) = {
            let node = slp.node(id);
            (node.left, node.right)
        };
        let left = Slp::translate(left, &cache.reduced);
        let right = Slp::translate(right, &cache.reduced);
        let k = cancellation_length(slp, left, right, table);
        let reduced = if k.is_zero() {
            slp.concat(left, right)
        } else {
            let head_len = &*slp.length_ref(left) - &k;
            let tail_len = &*slp.length_ref(right) - &k;
            let head = slp.prefix(left, &head_len);
            let tail = slp.suffix(right, &tail_len);
            slp.concat(head, tail)
        };
        cache.reduced.insert(id, reduced);
    }
    cache.reduced[&root].negate_if(v.is_negated())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(slp: &mut Slp<i32>, symbols: &[i32]) -> Vertex<i32> {
        symbols
            .iter()
            .fold(Vertex::Empty, |acc, &s| slp.concat(acc, Vertex::Terminal(s)))
    }

    fn reduced_symbols(symbols: &[i32]) -> Vec<i32> {
        let mut slp = Slp::new();
        let v = build(&mut slp, symbols);
        let r = reduce(&mut slp, v, &mut MatchingTable::new(), &mut ReductionCache::new());
        slp.word(r).iter().collect()
    }

    #[test]
    fn reduces_simple_words() {
        assert_eq!(reduced_symbols(&[1, -1]), Vec::<i32>::new());
        assert_eq!(reduced_symbols(&[1, 2, -2, 3]), vec![1, 3]);
        assert_eq!(reduced_symbols(&[1, 2, -2, -1, 4]), vec![4]);
        assert_eq!(reduced_symbols(&[1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(reduced_symbols(&[2, -1, 1, -2, 2, 2]), vec![2, 2]);
    }

    #[test]
    fn reduces_balanced_cancellation() {
        // (x1 x2 x3) (x3^-1 x2^-1 x1^-1) as two separate subtrees
        let mut slp = Slp::new();
        let a = build(&mut slp, &[1, 2, 3]);
        let w = slp.concat(a, a.negate());
        let r = reduce(&mut slp, w, &mut MatchingTable::new(), &mut ReductionCache::new());
        assert_eq!(r, Vertex::Empty);
    }

    #[test]
    fn reduced_single_symbol_is_terminal() {
        let mut slp = Slp::new();
        let v = build(&mut slp, &[5, 1, -1]);
        let r = reduce(&mut slp, v, &mut MatchingTable::new(), &mut ReductionCache::new());
        assert_eq!(r, Vertex::Terminal(5));
    }

    #[test]
    fn negated_view_reduces_to_negated_form() {
        let mut slp = Slp::new();
        let v = build(&mut slp, &[1, 2, -2, 3]);
        let mut table = MatchingTable::new();
        let mut cache = ReductionCache::new();
        assert!(cache.is_empty());
        let r = reduce(&mut slp, v.negate(), &mut table, &mut cache);
        assert_eq!(slp.word(r).iter().collect::<Vec<_>>(), vec![-3, -1]);
        assert!(!cache.is_empty());
        let nodes_reduced = cache.len();
        let again = reduce(&mut slp, v, &mut table, &mut cache);
        assert_eq!(cache.len(), nodes_reduced);
        assert_eq!(again, r.negate());
    }

    #[test]
    fn exponential_word_reduces_without_expansion() {
        // w_0 = x1 x2, w_{i+1} = w_i w_i ; then w_40 · w_40^-1 reduces to empty.
        let mut slp = Slp::new();
        let mut w = slp.concat(Vertex::Terminal(1), Vertex::Terminal(2));
        for _ in 0..40 {
            w = slp.concat(w, w);
        }
        let v = slp.concat(w, w.negate());
        let r = reduce(&mut slp, v, &mut MatchingTable::new(), &mut ReductionCache::new());
        assert_eq!(r, Vertex::Empty);

        // w_40 x2^-1 x1^-1 x1 keeps 2^41 - 1 symbols
        let tail = build(&mut slp, &[-2, -1, 1]);
        let v = slp.concat(w, tail);
        let r = reduce(&mut slp, v, &mut MatchingTable::new(), &mut ReductionCache::new());
        let expected = (num_bigint::BigUint::from(1u32) << 41u32) - 1u32;
        assert_eq!(slp.length(r), expected);
        assert_eq!(slp.last_symbol(r), Some(1));
    }
}
