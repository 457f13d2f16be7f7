//! Free group endomorphisms stored as straight-line programs.
//!
//! An `Endomorphism` maps positive generators to words. Only non-identity
//! images are stored, in ascending symbol order, as roots of one hash-consed
//! [`Slp`]; a missing symbol maps to itself, so the identity is the empty map.
//!
//! Composition substitutes the images of `self` into the DAG of the other
//! operand once per distinct node, so its cost follows the DAG size of the
//! operand rather than the (exponentially larger) word length, and subtrees
//! that do not change keep their handles.
//!
//! # Citations
//! - Nielsen, "Die Isomorphismengruppe der freien Gruppen" (1924) – elementary automorphisms
//! - Lohrey, "Algorithmics on SLP-compressed strings: A survey" (2012) – compressed substitution
//! - Myasnikov, Shpilrain & Ushakov, "Non-commutative Cryptography and Complexity of Group-theoretic Problems" (2011)

use crate::arena::VertexId;
use crate::error::InverseError;
use crate::slp::{reduce, words_equal, MatchingTable, ReductionCache, Slp, Vertex, VertexWord};
use crate::symbol::TerminalSymbol;
use num_bigint::BigUint;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::{Mul, MulAssign};
use tracing::{debug, trace};

/// An endomorphism of the free group, with images stored as SLP roots.
#[derive(Debug, Clone)]
pub struct Endomorphism<S = i32> {
    slp: Slp<S>,
    /// Images of positive symbols, ordered by symbol. Absent symbols are fixed.
    images: BTreeMap<S, Vertex<S>>,
}

impl<S: TerminalSymbol> Endomorphism<S> {
    /// Returns the identity automorphism.
    pub fn identity() -> Self {
        Self {
            slp: Slp::new(),
            images: BTreeMap::new(),
        }
    }

    /// Returns the automorphism mapping `symbol` to its inverse.
    ///
    /// # Panics
    /// Panics if `symbol` is not positive.
    pub fn inverter(symbol: S) -> Self {
        assert!(symbol.is_positive(), "inverted symbol must be positive, got {symbol}");
        let mut result = Self::identity();
        result.images.insert(symbol, Vertex::Terminal(-symbol));
        result
    }

    /// Returns the automorphism mapping `symbol` to `symbol · multiplier`.
    ///
    /// # Panics
    /// Panics if `symbol` is not positive or `multiplier == symbol`.
    pub fn right_multiplier(symbol: S, multiplier: S) -> Self {
        assert!(symbol.is_positive(), "mapped symbol must be positive, got {symbol}");
        assert!(symbol != multiplier, "multiplier must differ from the mapped symbol {symbol}");
        let mut result = Self::identity();
        let image = result
            .slp
            .concat(Vertex::Terminal(symbol), Vertex::Terminal(multiplier));
        result.images.insert(symbol, image);
        result
    }

    /// Returns the automorphism mapping `symbol` to `multiplier · symbol`.
    ///
    /// # Panics
    /// Panics if `symbol` is not positive or `multiplier == symbol`.
    pub fn left_multiplier(multiplier: S, symbol: S) -> Self {
        assert!(symbol.is_positive(), "mapped symbol must be positive, got {symbol}");
        assert!(symbol != multiplier, "multiplier must differ from the mapped symbol {symbol}");
        let mut result = Self::identity();
        let image = result
            .slp
            .concat(Vertex::Terminal(multiplier), Vertex::Terminal(symbol));
        result.images.insert(symbol, image);
        result
    }

    /// Calls `f` on every inverter and every left and right multiplier of the
    /// free group of the given rank, in a fixed order.
    ///
    /// Inverters of `x_1..x_rank` come first; then for each mapped symbol `i`
    /// and each signed multiplier `j ∉ {0, i, -i}` in ascending order, the left
    /// multiplier `x_i ↦ x_j x_i` followed by the right multiplier `x_i ↦ x_i x_j`.
    ///
    /// # Panics
    /// Panics if `rank` is not positive.
    pub fn for_each_basic_morphism<F>(rank: i32, mut f: F)
    where
        F: FnMut(Self),
    {
        assert!(rank > 0, "rank must be positive, got {rank}");
        for i in 1..=rank {
            f(Self::inverter(S::from_index(i)));
        }
        for i in 1..=rank {
            for j in -rank..=rank {
                if j != i && j != -i && j != 0 {
                    f(Self::left_multiplier(S::from_index(j), S::from_index(i)));
                    f(Self::right_multiplier(S::from_index(i), S::from_index(j)));
                }
            }
        }
    }

    /// Returns the composition of the given endomorphisms, `e1 ∘ e2 ∘ … ∘ en`.
    pub fn composition<I>(endomorphisms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Self>,
    {
        let mut result = Self::identity();
        result.compose_with_all(endomorphisms);
        result
    }

    /// Returns the composition of `num` endomorphisms drawn from `generator`.
    pub fn composition_generated<G>(num: usize, generator: G) -> Self
    where
        G: FnMut() -> Self,
    {
        let mut result = Self::identity();
        result.compose_with_generated(num, generator);
        result
    }

    /// Replaces `self` with `self ∘ a` (apply `a` first, then `self`).
    ///
    /// Every stored image of `a` is rewritten by substituting the images of
    /// `self` for its terminals. The substitution visits each distinct node
    /// reachable from the roots of `a` once, post-order, memoized by node;
    /// a node whose children come out unchanged maps to the same handle.
    /// Images of symbols outside the domain of `a` are kept as they are.
    pub fn compose_with(&mut self, a: &Self) -> &mut Self {
        let nodes_before = self.slp.node_count();
        let mut substituted: HashMap<VertexId, Vertex<S>> = HashMap::new();
        let mut new_images = BTreeMap::new();

        for (&symbol, &root) in &a.images {
            for id in a.slp.postorder_nodes(root, |id| substituted.contains_key(&id)) {
                let node = a.slp.node(id);
                let left = self.substitute(node.left, &substituted);
                let right = self.substitute(node.right, &substituted);
                let image = self.slp.concat(left, right);
                substituted.insert(id, image);
            }
            new_images.insert(symbol, self.substitute(root, &substituted));
        }
        for (&symbol, &image) in &self.images {
            new_images.entry(symbol).or_insert(image);
        }
        self.images = new_images;

        trace!(
            roots = a.images.len(),
            substituted = substituted.len(),
            new_nodes = self.slp.node_count() - nodes_before,
            "composed endomorphism"
        );
        self
    }

    /// Image under `self` of a vertex of another program whose nonterminal
    /// nodes have already been substituted.
    fn substitute(&self, v: Vertex<S>, substituted: &HashMap<VertexId, Vertex<S>>) -> Vertex<S> {
        match v {
            Vertex::Terminal(symbol) => {
                let generator = symbol.generator();
                match self.images.get(&generator) {
                    Some(&image) if image != Vertex::Terminal(generator) => {
                        image.negate_if(!symbol.is_positive())
                    }
                    _ => v,
                }
            }
            _ => Slp::translate(v, substituted),
        }
    }

    /// Composes `self` with each endomorphism of the sequence in turn.
    pub fn compose_with_all<I>(&mut self, endomorphisms: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Borrow<Self>,
    {
        for e in endomorphisms {
            self.compose_with(e.borrow());
        }
        self
    }

    /// Composes `self` with `num` endomorphisms drawn from `generator`.
    pub fn compose_with_generated<G>(&mut self, num: usize, mut generator: G) -> &mut Self
    where
        G: FnMut() -> Self,
    {
        for _ in 0..num {
            let e = generator();
            self.compose_with(&e);
        }
        self
    }

    /// Conjugates `self` by the product of the given automorphisms.
    ///
    /// With `g = a1 ∘ a2 ∘ … ∘ an` this returns `g⁻¹ ∘ self ∘ g`: `self` is
    /// composed with every `ai` in draw order, and the result is left-composed
    /// with `an⁻¹ ∘ … ∘ a1⁻¹`. Conjugating the result with the inverses in
    /// reverse order, `an⁻¹, …, a1⁻¹`, gives back `self` up to free reduction.
    ///
    /// Fails if some `ai` is outside the class supported by [`Self::inverse`].
    pub fn conjugate_with<I>(&self, automorphisms: I) -> Result<Self, InverseError>
    where
        I: IntoIterator,
        I::Item: Borrow<Self>,
    {
        let mut conjugated = self.clone();
        let mut inverses = Vec::new();
        for a in automorphisms {
            let a = a.borrow();
            conjugated.compose_with(a);
            inverses.push(a.inverse()?);
        }
        let mut result = Self::composition(inverses.iter().rev());
        result.compose_with(&conjugated);
        Ok(result)
    }

    /// Conjugates `self` by the product of `num` automorphisms drawn from `generator`.
    ///
    /// Same convention as [`Self::conjugate_with`].
    pub fn conjugate_with_generated<G>(&self, num: usize, mut generator: G) -> Result<Self, InverseError>
    where
        G: FnMut() -> Self,
    {
        let drawn: Vec<Self> = (0..num).map(|_| generator()).collect();
        self.conjugate_with(&drawn)
    }

    /// Returns the inverse automorphism.
    ///
    /// Supports the identity, inverters and left/right multipliers only: at
    /// most one non-trivial image, of height at most 2, of the form `s · m` or
    /// `m · s` for its own symbol `s`.
    pub fn inverse(&self) -> Result<Self, InverseError> {
        let non_trivial: Vec<(S, Vertex<S>)> = self.non_trivial_images().collect();
        let (symbol, image) = match non_trivial.as_slice() {
            [] => return Ok(self.clone()),
            [single] => *single,
            _ => {
                debug!(count = non_trivial.len(), "cannot invert endomorphism");
                return Err(InverseError::TooManyImages {
                    count: non_trivial.len(),
                });
            }
        };

        let not_elementary = InverseError::NotElementary {
            symbol: symbol.code(),
        };
        match self.slp.height(image) {
            1 if image == Vertex::Terminal(-symbol) => Ok(self.clone()),
            2 => {
                let (left, right) = self.slp.children(image).ok_or(not_elementary.clone())?;
                let (Some(left), Some(right)) = (left.terminal_symbol(), right.terminal_symbol()) else {
                    return Err(not_elementary);
                };
                if left == symbol && right.generator() != symbol {
                    Ok(Self::right_multiplier(symbol, -right))
                } else if right == symbol && left.generator() != symbol {
                    Ok(Self::left_multiplier(-left, symbol))
                } else {
                    debug!(%symbol, "cannot invert non-elementary image");
                    Err(not_elementary)
                }
            }
            height if height > 2 => {
                debug!(height, "cannot invert endomorphism with a deep image");
                Err(InverseError::HeightExceeded { height })
            }
            _ => Err(not_elementary),
        }
    }

    /// Returns the endomorphism with every image freely reduced.
    ///
    /// Subtrees shared between images are reduced once; the result holds only
    /// the nodes reachable from its images.
    pub fn free_reduction(&self) -> Self {
        let mut slp = self.slp.clone();
        let mut table = MatchingTable::new();
        let mut cache = ReductionCache::new();
        let images = self
            .images
            .iter()
            .map(|(&symbol, &image)| (symbol, reduce(&mut slp, image, &mut table, &mut cache)))
            .collect();
        debug!(
            images = self.images.len(),
            reduced_nodes = cache.len(),
            matching_hits = table.hits(),
            "free reduction"
        );
        Self { slp, images }.compacted()
    }

    /// Drops the nodes no image refers to any more.
    ///
    /// Handles of the remaining nodes change; words do not.
    pub fn shrink_to_reachable(&mut self) {
        let compacted = std::mem::take(self).compacted();
        *self = compacted;
    }

    fn compacted(self) -> Self {
        let mut slp = Slp::new();
        let mut memo = HashMap::new();
        let images = self
            .images
            .iter()
            .map(|(&symbol, &image)| (symbol, slp.import(&self.slp, image, &mut memo)))
            .collect();
        Self { slp, images }
    }

    /// Returns the root of the image of the positive symbol `t`.
    ///
    /// Symbols without a stored image map to their own terminal.
    ///
    /// # Panics
    /// Panics if `t` is not positive.
    pub fn image(&self, t: S) -> Vertex<S> {
        assert!(t.is_positive(), "image requested for non-positive symbol {t}");
        self.images.get(&t).copied().unwrap_or(Vertex::Terminal(t))
    }

    /// Returns the image word of any signed symbol.
    ///
    /// # Panics
    /// Panics if `t` is the zero sentinel.
    pub fn image_word(&self, t: S) -> VertexWord<'_, S> {
        assert!(!t.is_null(), "image requested for the null symbol");
        let root = if t.is_positive() {
            self.image(t)
        } else {
            self.image(-t).negate()
        };
        self.slp.word(root)
    }

    /// Returns the length of the image word of any signed symbol.
    pub fn image_length(&self, t: S) -> BigUint {
        self.image_word(t).len()
    }

    /// Returns the largest symbol with a non-trivial image, or zero for the identity.
    pub fn max_non_trivial_image_symbol(&self) -> S {
        self.non_trivial_images()
            .next_back()
            .map(|(symbol, _)| symbol)
            .unwrap_or_default()
    }

    /// Number of stored images other than the bare terminal of their own symbol.
    pub fn non_trivial_images_num(&self) -> usize {
        self.non_trivial_images().count()
    }

    /// Non-trivial `(symbol, image)` pairs in ascending symbol order.
    pub fn non_trivial_images(&self) -> impl DoubleEndedIterator<Item = (S, Vertex<S>)> + '_ {
        self.iter()
            .filter(|&(symbol, image)| image != Vertex::Terminal(symbol))
    }

    /// All stored `(symbol, image)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (S, Vertex<S>)> + '_ {
        self.images.iter().map(|(&symbol, &image)| (symbol, image))
    }

    /// The program holding the images.
    pub fn slp(&self) -> &Slp<S> {
        &self.slp
    }

    /// Returns `true` if every image freely reduces to its own symbol.
    pub fn is_identity(&self) -> bool {
        if self.non_trivial_images_num() == 0 {
            return true;
        }
        self.free_reduction()
            .iter()
            .all(|(symbol, image)| image == Vertex::Terminal(symbol))
    }

    /// Maximal height of the images (0 for an endomorphism with no stored images).
    pub fn height(&self) -> u32 {
        self.images
            .values()
            .map(|&image| self.slp.height(image))
            .max()
            .unwrap_or(0)
    }

    /// Number of distinct vertices reachable from the images.
    ///
    /// Terminal vertices count once per signed symbol; a node and its
    /// negated view count as two vertices.
    pub fn slp_vertices_num(&self) -> usize {
        let mut seen = HashSet::new();
        self.images
            .values()
            .map(|&image| self.slp.postorder_vertices(image, &mut seen).len())
            .sum()
    }

    pub(crate) fn from_parts(slp: Slp<S>, images: BTreeMap<S, Vertex<S>>) -> Self {
        Self { slp, images }
    }
}

impl<S: TerminalSymbol> Default for Endomorphism<S> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Two endomorphisms are equal if they have non-trivial images for the same
/// symbols and those images are equal words. Words are compared unreduced.
impl<S: TerminalSymbol> PartialEq for Endomorphism<S> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let lhs: Vec<(S, Vertex<S>)> = self.non_trivial_images().collect();
        let rhs: Vec<(S, Vertex<S>)> = other.non_trivial_images().collect();
        if lhs.len() != rhs.len() || lhs.iter().zip(&rhs).any(|(l, r)| l.0 != r.0) {
            return false;
        }
        let mut table = MatchingTable::new();
        lhs.iter()
            .zip(&rhs)
            .all(|(&(_, l), &(_, r))| words_equal(&self.slp, l, &other.slp, r, &mut table))
    }
}

impl<S: TerminalSymbol> Eq for Endomorphism<S> {}

impl<S: TerminalSymbol> MulAssign<&Endomorphism<S>> for Endomorphism<S> {
    fn mul_assign(&mut self, rhs: &Endomorphism<S>) {
        self.compose_with(rhs);
    }
}

impl<S: TerminalSymbol> MulAssign<Endomorphism<S>> for Endomorphism<S> {
    fn mul_assign(&mut self, rhs: Endomorphism<S>) {
        self.compose_with(&rhs);
    }
}

/// `e1 * e2` is `e1 ∘ e2`: the action of `e2` is applied first.
impl<S: TerminalSymbol> Mul<&Endomorphism<S>> for &Endomorphism<S> {
    type Output = Endomorphism<S>;

    fn mul(self, rhs: &Endomorphism<S>) -> Endomorphism<S> {
        let mut result = self.clone();
        result.compose_with(rhs);
        result
    }
}

impl<S: TerminalSymbol> Mul<&Endomorphism<S>> for Endomorphism<S> {
    type Output = Endomorphism<S>;

    fn mul(mut self, rhs: &Endomorphism<S>) -> Endomorphism<S> {
        self.compose_with(rhs);
        self
    }
}

impl<S: TerminalSymbol> Mul<Endomorphism<S>> for Endomorphism<S> {
    type Output = Endomorphism<S>;

    fn mul(mut self, rhs: Endomorphism<S>) -> Endomorphism<S> {
        self.compose_with(&rhs);
        self
    }
}
