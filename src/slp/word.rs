//! Lazy iteration over compressed words.

use super::{Slp, Vertex};
use crate::slp::matching::{words_equal, MatchingTable};
use crate::symbol::TerminalSymbol;
use num_bigint::BigUint;

/// A word denoted by a vertex of an [`Slp`].
///
/// The view is restartable: every call to [`VertexWord::iter`] starts a fresh
/// left-to-right pass whose memory use is bounded by the DAG height.
#[derive(Debug, Clone, Copy)]
pub struct VertexWord<'a, S> {
    slp: &'a Slp<S>,
    root: Vertex<S>,
}

impl<'a, S: TerminalSymbol> VertexWord<'a, S> {
    /// Creates the view of `root` in `slp`.
    pub fn new(slp: &'a Slp<S>, root: Vertex<S>) -> Self {
        Self { slp, root }
    }

    /// The vertex behind this word.
    pub fn root(&self) -> Vertex<S> {
        self.root
    }

    /// Length of the word.
    pub fn len(&self) -> BigUint {
        self.slp.length(self.root)
    }

    /// Returns `true` for the empty word.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Starts a new pass over the symbols of the word.
    pub fn iter(&self) -> WordIter<'a, S> {
        WordIter {
            slp: self.slp,
            stack: vec![self.root],
        }
    }

    /// Compares two words symbol by symbol without expanding them.
    ///
    /// `table` memoizes pair results and may be shared across several
    /// comparisons between the same two programs.
    pub fn is_equal_to(&self, other: &VertexWord<'_, S>, table: &mut MatchingTable<S>) -> bool {
        words_equal(self.slp, self.root, other.slp, other.root, table)
    }
}

impl<'a, S: TerminalSymbol> IntoIterator for VertexWord<'a, S> {
    type Item = S;
    type IntoIter = WordIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, S: TerminalSymbol> IntoIterator for &VertexWord<'a, S> {
    type Item = S;
    type IntoIter = WordIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Left-to-right iterator over the symbols of a [`VertexWord`].
#[derive(Debug, Clone)]
pub struct WordIter<'a, S> {
    slp: &'a Slp<S>,
    stack: Vec<Vertex<S>>,
}

impl<S: TerminalSymbol> Iterator for WordIter<'_, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        while let Some(v) = self.stack.pop() {
            match v {
                Vertex::Empty => continue,
                Vertex::Terminal(symbol) => return Some(symbol),
                Vertex::Nonterminal { .. } => {
                    if let Some((left, right)) = self.slp.children(v) {
                        self.stack.push(right);
                        self.stack.push(left);
                    }
                }
            }
        }
        None
    }
}
