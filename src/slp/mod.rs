//! Straight-line programs over a free group alphabet.
//!
//! A straight-line program (SLP) is a DAG whose leaves are signed symbols and
//! whose inner nodes denote the concatenation of their two children. A DAG of
//! `n` nodes can denote a word of length `2^n`, so everything here works on the
//! DAG and never on the expanded word.
//!
//! Nodes live in an append-only `VertexArena` and are hash-consed through a
//! unique table keyed by the ordered pair of children, so two requests for the
//! same concatenation return the same `VertexId`. Handles (`Vertex`) carry an
//! orientation bit: a negated handle reads its node back to front with every
//! symbol inverted, which realizes formal inverses without new nodes.
//!
//! # Citations
//! - Plandowski, "Testing equivalence of morphisms on context-free languages" (1994)
//! - Lohrey, "Algorithmics on SLP-compressed strings: A survey" (2012)
//! - Hash-consing: Filliâtre & Conchon, "Type-safe modular hash-consing" (2006)

pub mod matching;
pub mod reduce;
pub mod word;

pub use matching::{words_equal, MatchingTable};
pub use reduce::{reduce, ReductionCache};
pub use word::{VertexWord, WordIter};

use crate::arena::{VertexArena, VertexId};
use crate::fingerprint::WordFingerprint;
use crate::symbol::TerminalSymbol;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Handle to a word stored in (or implied by) an [`Slp`].
///
/// Terminal handles are self-contained; nonterminal handles are only
/// meaningful together with the program that allocated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vertex<S> {
    /// The empty word.
    Empty,
    /// A one-letter word.
    Terminal(S),
    /// A stored concatenation node, read inverted when `negated` is set.
    Nonterminal { id: VertexId, negated: bool },
}

impl<S: TerminalSymbol> Vertex<S> {
    /// Returns the handle of the inverse word.
    #[inline]
    pub fn negate(self) -> Self {
        match self {
            Vertex::Empty => Vertex::Empty,
            Vertex::Terminal(symbol) => Vertex::Terminal(-symbol),
            Vertex::Nonterminal { id, negated } => Vertex::Nonterminal { id, negated: !negated },
        }
    }

    /// Applies `negate` when `flag` is set.
    #[inline]
    pub fn negate_if(self, flag: bool) -> Self {
        if flag {
            self.negate()
        } else {
            self
        }
    }

    /// Returns `true` for the empty word.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Vertex::Empty)
    }

    /// Returns the symbol of a terminal handle.
    #[inline]
    pub fn terminal_symbol(&self) -> Option<S> {
        match self {
            Vertex::Terminal(symbol) => Some(*symbol),
            _ => None,
        }
    }

    /// Returns the stored node behind a nonterminal handle, ignoring orientation.
    #[inline]
    pub fn node_id(&self) -> Option<VertexId> {
        match self {
            Vertex::Nonterminal { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns `true` for a negated nonterminal handle.
    #[inline]
    pub fn is_negated(&self) -> bool {
        matches!(self, Vertex::Nonterminal { negated: true, .. })
    }
}

/// A stored concatenation node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonterminalNode<S> {
    /// Left child as stored (not affected by the orientation of a handle).
    pub left: Vertex<S>,
    /// Right child as stored.
    pub right: Vertex<S>,
    /// `1 + max(height(left), height(right))`.
    pub height: u32,
    /// Length of the denoted word.
    pub length: BigUint,
    /// Fingerprint of the denoted word.
    pub fingerprint: WordFingerprint,
}

/// Hash-consed arena of concatenation nodes.
#[derive(Debug, Clone, Default)]
pub struct Slp<S> {
    arena: VertexArena<NonterminalNode<S>>,
    /// Unique table: `(left, right)` → existing node.
    unique: HashMap<(Vertex<S>, Vertex<S>), VertexId>,
}

impl<S: TerminalSymbol> Slp<S> {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self {
            arena: VertexArena::new(),
            unique: HashMap::new(),
        }
    }

    /// Number of stored nonterminal nodes (reachable or not).
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Returns the stored node behind `id`.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this program.
    pub fn node(&self, id: VertexId) -> &NonterminalNode<S> {
        &self.arena[id]
    }

    /// Builds the handle of the concatenation `left · right`.
    ///
    /// Concatenation with the empty word returns the other operand. An
    /// existing node for the same pair (or for the inverse pair, returned as a
    /// negated handle) is reused.
    pub fn concat(&mut self, left: Vertex<S>, right: Vertex<S>) -> Vertex<S> {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }
        if let Some(&id) = self.unique.get(&(left, right)) {
            return Vertex::Nonterminal { id, negated: false };
        }
        if let Some(&id) = self.unique.get(&(right.negate(), left.negate())) {
            return Vertex::Nonterminal { id, negated: true };
        }
        let node = NonterminalNode {
            left,
            right,
            height: 1 + self.height(left).max(self.height(right)),
            length: &*self.length_ref(left) + &*self.length_ref(right),
            fingerprint: self.fingerprint(left).concat(&self.fingerprint(right)),
        };
        let id = self.arena.allocate(node);
        self.unique.insert((left, right), id);
        Vertex::Nonterminal { id, negated: false }
    }

    /// Height of the DAG below `v` (0 for the empty word, 1 for a terminal).
    pub fn height(&self, v: Vertex<S>) -> u32 {
        match v {
            Vertex::Empty => 0,
            Vertex::Terminal(_) => 1,
            Vertex::Nonterminal { id, .. } => self.arena[id].height,
        }
    }

    /// Length of the word denoted by `v`.
    pub fn length(&self, v: Vertex<S>) -> BigUint {
        match v {
            Vertex::Empty => BigUint::zero(),
            Vertex::Terminal(_) => BigUint::one(),
            Vertex::Nonterminal { id, .. } => self.arena[id].length.clone(),
        }
    }

    /// Length of `v`, borrowed from the node when it is stored.
    pub(crate) fn length_ref(&self, v: Vertex<S>) -> Cow<'_, BigUint> {
        match v {
            Vertex::Nonterminal { id, .. } => Cow::Borrowed(&self.arena[id].length),
            _ => Cow::Owned(self.length(v)),
        }
    }

    /// Fingerprint of the word denoted by `v`.
    pub fn fingerprint(&self, v: Vertex<S>) -> WordFingerprint {
        match v {
            Vertex::Empty => WordFingerprint::EMPTY,
            Vertex::Terminal(symbol) => WordFingerprint::terminal(symbol.code()),
            Vertex::Nonterminal { id, negated } => {
                let fingerprint = self.arena[id].fingerprint;
                if negated {
                    fingerprint.negate()
                } else {
                    fingerprint
                }
            }
        }
    }

    /// Children of a nonterminal handle, as read through its orientation.
    ///
    /// For a negated handle the children are swapped and negated, so that the
    /// concatenation of the returned pair always denotes the handle's word.
    pub fn children(&self, v: Vertex<S>) -> Option<(Vertex<S>, Vertex<S>)> {
        match v {
            Vertex::Nonterminal { id, negated } => {
                let node = &self.arena[id];
                if negated {
                    Some((node.right.negate(), node.left.negate()))
                } else {
                    Some((node.left, node.right))
                }
            }
            _ => None,
        }
    }

    /// Left child of a nonterminal handle.
    pub fn left_child(&self, v: Vertex<S>) -> Option<Vertex<S>> {
        self.children(v).map(|(left, _)| left)
    }

    /// Right child of a nonterminal handle.
    pub fn right_child(&self, v: Vertex<S>) -> Option<Vertex<S>> {
        self.children(v).map(|(_, right)| right)
    }

    /// First symbol of the word, if any.
    pub fn first_symbol(&self, mut v: Vertex<S>) -> Option<S> {
        loop {
            match v {
                Vertex::Empty => return None,
                Vertex::Terminal(symbol) => return Some(symbol),
                Vertex::Nonterminal { .. } => v = self.left_child(v)?,
            }
        }
    }

    /// Last symbol of the word, if any.
    pub fn last_symbol(&self, mut v: Vertex<S>) -> Option<S> {
        loop {
            match v {
                Vertex::Empty => return None,
                Vertex::Terminal(symbol) => return Some(symbol),
                Vertex::Nonterminal { .. } => v = self.right_child(v)?,
            }
        }
    }

    /// Builds the first `n` symbols of `v`.
    ///
    /// Creates at most `height(v)` new nodes.
    pub fn prefix(&mut self, mut v: Vertex<S>, n: &BigUint) -> Vertex<S> {
        let mut remaining = n.clone();
        let mut lefts = Vec::new();
        let mut tail = loop {
            if remaining.is_zero() {
                break Vertex::Empty;
            }
            if remaining >= *self.length_ref(v) {
                break v;
            }
            let Some((left, right)) = self.children(v) else {
                break v;
            };
            let left_len = self.length_ref(left);
            if remaining <= *left_len {
                v = left;
            } else {
                remaining -= &*left_len;
                lefts.push(left);
                v = right;
            }
        };
        for left in lefts.into_iter().rev() {
            tail = self.concat(left, tail);
        }
        tail
    }

    /// Builds the last `n` symbols of `v`.
    ///
    /// Creates at most `height(v)` new nodes.
    pub fn suffix(&mut self, mut v: Vertex<S>, n: &BigUint) -> Vertex<S> {
        let mut remaining = n.clone();
        let mut rights = Vec::new();
        let mut head = loop {
            if remaining.is_zero() {
                break Vertex::Empty;
            }
            if remaining >= *self.length_ref(v) {
                break v;
            }
            let Some((left, right)) = self.children(v) else {
                break v;
            };
            let right_len = self.length_ref(right);
            if remaining <= *right_len {
                v = right;
            } else {
                remaining -= &*right_len;
                rights.push(right);
                v = left;
            }
        };
        for right in rights.into_iter().rev() {
            head = self.concat(head, right);
        }
        head
    }

    /// Fingerprint of the first `n` symbols of `v`, without building nodes.
    pub fn prefix_fingerprint(&self, mut v: Vertex<S>, n: &BigUint) -> WordFingerprint {
        let mut remaining = n.clone();
        let mut acc = WordFingerprint::EMPTY;
        loop {
            if remaining.is_zero() {
                return acc;
            }
            if remaining >= *self.length_ref(v) {
                return acc.concat(&self.fingerprint(v));
            }
            let Some((left, right)) = self.children(v) else {
                return acc.concat(&self.fingerprint(v));
            };
            let left_len = self.length_ref(left);
            if remaining <= *left_len {
                v = left;
            } else {
                remaining -= &*left_len;
                acc = acc.concat(&self.fingerprint(left));
                v = right;
            }
        }
    }

    /// Fingerprint of the last `n` symbols of `v`, without building nodes.
    pub fn suffix_fingerprint(&self, mut v: Vertex<S>, n: &BigUint) -> WordFingerprint {
        let mut remaining = n.clone();
        let mut acc = WordFingerprint::EMPTY;
        loop {
            if remaining.is_zero() {
                return acc;
            }
            if remaining >= *self.length_ref(v) {
                return self.fingerprint(v).concat(&acc);
            }
            let Some((left, right)) = self.children(v) else {
                return self.fingerprint(v).concat(&acc);
            };
            let right_len = self.length_ref(right);
            if remaining <= *right_len {
                v = right;
            } else {
                remaining -= &*right_len;
                acc = self.fingerprint(right).concat(&acc);
                v = left;
            }
        }
    }

    /// Distinct stored nodes below `root` in post-order (left subtree first).
    ///
    /// Nodes for which `skip` returns `true` are neither emitted nor descended
    /// into, which lets a caller share one traversal across several roots by
    /// skipping nodes already present in its memo table. Orientation is
    /// ignored: a node and its negated view are the same entry.
    pub fn postorder_nodes<F>(&self, root: Vertex<S>, mut skip: F) -> Vec<VertexId>
    where
        F: FnMut(VertexId) -> bool,
    {
        let mut order = Vec::new();
        let Some(root) = root.node_id() else {
            return order;
        };
        let mut emitted = HashSet::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if emitted.contains(&id) || skip(id) {
                continue;
            }
            if expanded {
                emitted.insert(id);
                order.push(id);
                continue;
            }
            stack.push((id, true));
            let node = &self.arena[id];
            for child in [node.right, node.left] {
                if let Some(child) = child.node_id() {
                    if !emitted.contains(&child) {
                        stack.push((child, false));
                    }
                }
            }
        }
        order
    }

    /// Distinct oriented vertices below `root` in post-order of first appearance.
    ///
    /// Unlike [`Slp::postorder_nodes`] this treats a node and its negated view
    /// as different vertices, includes terminal (and empty) leaves, and walks
    /// children as read through the orientation. Vertices already in `seen`
    /// are skipped; newly emitted ones are added to it.
    pub fn postorder_vertices(&self, root: Vertex<S>, seen: &mut HashSet<Vertex<S>>) -> Vec<Vertex<S>> {
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((v, expanded)) = stack.pop() {
            if seen.contains(&v) {
                continue;
            }
            match self.children(v) {
                Some((left, right)) if !expanded => {
                    stack.push((v, true));
                    stack.push((right, false));
                    stack.push((left, false));
                }
                _ => {
                    seen.insert(v);
                    order.push(v);
                }
            }
        }
        order
    }

    /// Copies `v` from `source` into this program.
    ///
    /// `memo` maps nodes of `source` to their copies and should be reused
    /// across all roots copied from the same source, so shared nodes are
    /// copied once.
    pub fn import(
        &mut self,
        source: &Slp<S>,
        v: Vertex<S>,
        memo: &mut HashMap<VertexId, Vertex<S>>,
    ) -> Vertex<S> {
        let Some(root) = v.node_id() else {
            return v;
        };
        for id in source.postorder_nodes(v, |id| memo.contains_key(&id)) {
            let node = source.node(id);
            let left = Self::translate(node.left, memo);
            let right = Self::translate(node.right, memo);
            let copy = self.concat(left, right);
            memo.insert(id, copy);
        }
        memo[&root].negate_if(v.is_negated())
    }

    /// Resolves a child handle through a node-to-vertex memo.
    ///
    /// Leaves map to themselves; a negated child maps to the negated image.
    pub(crate) fn translate(child: Vertex<S>, memo: &HashMap<VertexId, Vertex<S>>) -> Vertex<S> {
        match child {
            Vertex::Nonterminal { id, negated } => memo[&id].negate_if(negated),
            leaf => leaf,
        }
    }

    /// Lazy view of the word denoted by `v`.
    pub fn word(&self, v: Vertex<S>) -> VertexWord<'_, S> {
        VertexWord::new(self, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: i32) -> Vertex<i32> {
        Vertex::Terminal(s)
    }

    fn symbols(slp: &Slp<i32>, v: Vertex<i32>) -> Vec<i32> {
        slp.word(v).iter().collect()
    }

    /// Builds `x1 x2 x3 x4` as a balanced tree.
    fn balanced(slp: &mut Slp<i32>) -> Vertex<i32> {
        let a = slp.concat(t(1), t(2));
        let b = slp.concat(t(3), t(4));
        slp.concat(a, b)
    }

    #[test]
    fn concat_is_hash_consed() {
        let mut slp = Slp::new();
        let a = slp.concat(t(1), t(2));
        let b = slp.concat(t(1), t(2));
        assert_eq!(a, b);
        assert_eq!(slp.node_count(), 1);

        // (x2^-1 x1^-1) is the inverse view of (x1 x2)
        let c = slp.concat(t(-2), t(-1));
        assert_eq!(c, a.negate());
        assert_eq!(slp.node_count(), 1);
    }

    #[test]
    fn concat_with_empty_returns_operand() {
        let mut slp = Slp::new();
        assert_eq!(slp.concat(Vertex::Empty, t(3)), t(3));
        assert_eq!(slp.concat(t(3), Vertex::Empty), t(3));
        assert_eq!(slp.node_count(), 0);
    }

    #[test]
    fn heights_and_lengths() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        assert_eq!(slp.height(root), 3);
        assert_eq!(slp.height(t(1)), 1);
        assert_eq!(slp.height(Vertex::Empty), 0);
        assert_eq!(slp.length(root), BigUint::from(4u32));
        let doubled = slp.concat(root, root);
        let quadrupled = slp.concat(doubled, doubled);
        assert_eq!(slp.length(quadrupled), BigUint::from(16u32));
    }

    #[test]
    fn negated_children_are_swapped() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        assert_eq!(symbols(&slp, root.negate()), vec![-4, -3, -2, -1]);
        let (left, right) = slp.children(root.negate()).unwrap();
        assert_eq!(symbols(&slp, left), vec![-4, -3]);
        assert_eq!(symbols(&slp, right), vec![-2, -1]);
    }

    #[test]
    fn first_and_last_symbols() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        assert_eq!(slp.first_symbol(root), Some(1));
        assert_eq!(slp.last_symbol(root), Some(4));
        assert_eq!(slp.first_symbol(root.negate()), Some(-4));
        assert_eq!(slp.last_symbol(Vertex::Empty), None);
    }

    #[test]
    fn prefix_and_suffix() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        for n in 0..=5u32 {
            let p = slp.prefix(root, &BigUint::from(n));
            let s = slp.suffix(root, &BigUint::from(n));
            let k = (n as usize).min(4);
            assert_eq!(symbols(&slp, p), vec![1, 2, 3, 4][..k].to_vec());
            assert_eq!(symbols(&slp, s), vec![1, 2, 3, 4][4 - k..].to_vec());
        }
        let p = slp.prefix(root.negate(), &BigUint::from(3u32));
        assert_eq!(symbols(&slp, p), vec![-4, -3, -2]);
    }

    #[test]
    fn one_symbol_prefix_is_terminal() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        assert_eq!(slp.prefix(root, &BigUint::one()), t(1));
        assert_eq!(slp.suffix(root, &BigUint::one()), t(4));
    }

    #[test]
    fn partial_fingerprints_match_built_words() {
        let mut slp = Slp::new();
        let root = balanced(&mut slp);
        let root = slp.concat(root, t(-1));
        for n in 0..=5u32 {
            let n = BigUint::from(n);
            let p = slp.prefix(root, &n);
            let s = slp.suffix(root, &n);
            assert_eq!(slp.prefix_fingerprint(root, &n), slp.fingerprint(p));
            assert_eq!(slp.suffix_fingerprint(root, &n), slp.fingerprint(s));
            assert_eq!(
                slp.suffix_fingerprint(root.negate(), &n),
                slp.fingerprint(p).negate()
            );
        }
    }

    #[test]
    fn partial_fingerprints_on_exponential_word() {
        let mut slp = Slp::new();
        let base = slp.concat(t(1), t(2));
        let mut root = slp.concat(base, t(-3));
        for _ in 0..80 {
            root = slp.concat(root, root);
        }
        let total = slp.length(root);
        assert_eq!(total, BigUint::from(3u32) << 80u32);
        let half = &total >> 1u32;
        for n in [BigUint::from(7u32), &half - 1u32, &half + 2u32, &total - 1u32] {
            let p = slp.prefix(root, &n);
            let s = slp.suffix(root, &n);
            assert_eq!(slp.length(p), n);
            assert_eq!(slp.length(s), n);
            assert_eq!(slp.prefix_fingerprint(root, &n), slp.fingerprint(p));
            assert_eq!(slp.suffix_fingerprint(root, &n), slp.fingerprint(s));
        }
        assert_eq!(slp.height(root), 83);
    }

    #[test]
    fn postorder_visits_shared_nodes_once() {
        let mut slp = Slp::new();
        let a = slp.concat(t(1), t(2));
        let b = slp.concat(a, a.negate());
        let c = slp.concat(b, a);
        let order = slp.postorder_nodes(c, |_| false);
        assert_eq!(order.len(), 3);
        assert_eq!(Some(order[0]), a.node_id());
        assert_eq!(Some(order[1]), b.node_id());
        assert_eq!(Some(order[2]), c.node_id());

        let skipped = slp.postorder_nodes(c, |id| Some(id) == a.node_id());
        assert_eq!(skipped.len(), 2);
    }

    #[test]
    fn postorder_vertices_distinguishes_orientation() {
        let mut slp = Slp::new();
        let a = slp.concat(t(1), t(2));
        let b = slp.concat(a, a.negate());
        let mut seen = HashSet::new();
        let order = slp.postorder_vertices(b, &mut seen);
        assert_eq!(order, vec![t(1), t(2), a, t(-2), t(-1), a.negate(), b]);
        assert!(slp.postorder_vertices(a, &mut seen).is_empty());
    }

    #[test]
    fn import_preserves_words_and_sharing() {
        let mut source = Slp::new();
        let a = source.concat(t(1), t(2));
        let b = source.concat(a, a);
        let mut target = Slp::new();
        let mut memo = HashMap::new();
        let copied = target.import(&source, b.negate(), &mut memo);
        assert_eq!(target.node_count(), 2);
        assert_eq!(symbols(&target, copied), vec![-2, -1, -2, -1]);
        let again = target.import(&source, a, &mut memo);
        assert_eq!(target.node_count(), 2);
        assert_eq!(symbols(&target, again), vec![1, 2]);
    }
}
