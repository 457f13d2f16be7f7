//! Free group endomorphisms represented by straight-line programs.
//!
//! An endomorphism of a free group is determined by the images of its
//! generators. Composing many elementary automorphisms makes those images
//! exponentially long, so every image here is the root of a shared,
//! hash-consed DAG (a straight-line program) in which each node stands for
//! the concatenation of its two children. Composition, free reduction and
//! equality all work on the DAG and never expand the words.
//!
//! This provides:
//! - [`Endomorphism`]: sparse images over one [`Slp`], with composition,
//!   restricted inversion, conjugation, free reduction and equality.
//! - [`UniformAutomorphismSlpGenerator`]: a reproducible sampler of the
//!   elementary (Nielsen) automorphisms, plus exhaustive enumeration through
//!   [`Endomorphism::for_each_basic_morphism`].
//! - A deterministic text layout and CBOR snapshots for persistence.
//!
//! # Mathematical Foundations
//!
//! The elementary automorphisms `x_i ↦ x_i⁻¹`, `x_i ↦ x_i x_j` and
//! `x_i ↦ x_j x_i` generate the automorphism group of a free group. Word
//! equality on compressed words is decided with Karp–Rabin fingerprints, which
//! compose under concatenation and inversion, so every node carries the
//! fingerprint of its word.
//!
//! # References
//!
//! - Nielsen, J. "Die Isomorphismengruppe der freien Gruppen" (1924)
//! - Plandowski, W. "Testing equivalence of morphisms on context-free languages" (1994)
//! - Lohrey, M. "Algorithmics on SLP-compressed strings: A survey" (2012)
//! - Karp, R., Rabin, M. "Efficient randomized pattern-matching algorithms" (1987)
//!
//! # Example
//!
//! ```
//! use free_group_slp::prelude::*;
//!
//! let e1: Endomorphism = Endomorphism::right_multiplier(1, 2);
//! let e2 = Endomorphism::inverter(1);
//! let product = &e1 * &e2;
//! let word: Vec<i32> = product.image_word(1).iter().collect();
//! assert_eq!(word, vec![-2, -1]);
//! assert!((&e1 * &e1.inverse().unwrap()).is_identity());
//! ```

pub mod arena;
pub mod endomorphism;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod serialization;
pub mod slp;
pub mod symbol;

pub use crate::endomorphism::Endomorphism;
pub use crate::error::{InverseError, LoadError, SaveError};
pub use crate::generator::{GeneratorConfig, UniformAutomorphismSlpGenerator};
pub use crate::serialization::SlpDump;
pub use crate::slp::{MatchingTable, Slp, Vertex, VertexWord};
pub use crate::symbol::TerminalSymbol;

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::endomorphism::Endomorphism;
    pub use crate::error::{InverseError, LoadError, SaveError};
    pub use crate::generator::{default_inverters_probability, GeneratorConfig, UniformAutomorphismSlpGenerator};
    pub use crate::serialization::SlpDump;
    pub use crate::slp::{words_equal, MatchingTable, Slp, Vertex, VertexWord};
    pub use crate::symbol::TerminalSymbol;
}
