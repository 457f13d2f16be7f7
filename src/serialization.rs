//! Persistence of endomorphisms.
//!
//! The text layout is line-oriented ASCII, whitespace-separated integers:
//!
//! ```text
//! <roots> <terminals> <nonterminals>
//! <index> <symbol>              one line per terminal vertex
//! <index> <left> <right>        one line per nonterminal vertex
//! <symbol> <index>              one line per root, ascending symbol
//! ```
//!
//! Indices are dense, assigned in post-order of first appearance across all
//! roots, and a vertex reachable from several roots is written once. A node
//! and its negated view are distinct vertices. The empty word is written as a
//! terminal with symbol `0`.
//!
//! The same layout is available as a serde structure, [`SlpDump`], which is
//! also stored as CBOR for binary snapshots.

use crate::endomorphism::Endomorphism;
use crate::error::{LoadError, SaveError};
use crate::fingerprint::HashValue;
use crate::slp::{Slp, Vertex};
use crate::symbol::TerminalSymbol;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufRead, Read, Write};
use std::path::Path;
use tracing::debug;

/// Flattened DAG of an endomorphism, in the persisted vertex order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlpDump {
    /// `(index, symbol)`; symbol `0` stands for the empty word.
    pub terminals: Vec<(u64, i64)>,
    /// `(index, left index, right index)`.
    pub nonterminals: Vec<(u64, u64, u64)>,
    /// `(symbol, index)` in ascending symbol order.
    pub roots: Vec<(i64, u64)>,
}

impl SlpDump {
    /// Deterministic content hash of the dump.
    pub fn fingerprint(&self) -> HashValue {
        let mut out = Vec::with_capacity(
            24 + 16 * self.terminals.len() + 24 * self.nonterminals.len() + 16 * self.roots.len(),
        );
        out.extend_from_slice(&(self.roots.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.terminals.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.nonterminals.len() as u64).to_le_bytes());
        for &(index, symbol) in &self.terminals {
            out.extend_from_slice(&index.to_le_bytes());
            out.extend_from_slice(&symbol.to_le_bytes());
        }
        for &(index, left, right) in &self.nonterminals {
            out.extend_from_slice(&index.to_le_bytes());
            out.extend_from_slice(&left.to_le_bytes());
            out.extend_from_slice(&right.to_le_bytes());
        }
        for &(symbol, index) in &self.roots {
            out.extend_from_slice(&symbol.to_le_bytes());
            out.extend_from_slice(&index.to_le_bytes());
        }
        HashValue::hash_with_domain(b"SLP_DUMP", &out)
    }

    /// Writes the text layout.
    pub fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(
            writer,
            "{} {} {}",
            self.roots.len(),
            self.terminals.len(),
            self.nonterminals.len()
        )?;
        for (index, symbol) in &self.terminals {
            writeln!(writer, "{index} {symbol}")?;
        }
        for (index, left, right) in &self.nonterminals {
            writeln!(writer, "{index} {left} {right}")?;
        }
        for (symbol, index) in &self.roots {
            writeln!(writer, "{symbol} {index}")?;
        }
        Ok(())
    }

    /// Reads the text layout. Line breaks are not significant.
    pub fn read_text<R: BufRead>(reader: &mut R) -> Result<Self, LoadError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let mut tokens = Tokens {
            inner: text.split_whitespace(),
            position: 0,
        };

        let roots = tokens.next_u64("root count")?;
        let terminals = tokens.next_u64("terminal count")?;
        let nonterminals = tokens.next_u64("nonterminal count")?;

        let mut dump = SlpDump::default();
        for _ in 0..terminals {
            let index = tokens.next_u64("terminal index")?;
            let symbol = tokens.next_i64("terminal symbol")?;
            dump.terminals.push((index, symbol));
        }
        for _ in 0..nonterminals {
            let index = tokens.next_u64("nonterminal index")?;
            let left = tokens.next_u64("left child index")?;
            let right = tokens.next_u64("right child index")?;
            dump.nonterminals.push((index, left, right));
        }
        for _ in 0..roots {
            let symbol = tokens.next_i64("root symbol")?;
            let index = tokens.next_u64("root index")?;
            dump.roots.push((symbol, index));
        }
        if let Some(extra) = tokens.inner.next() {
            return Err(LoadError::Parse {
                position: tokens.position,
                message: format!("unexpected trailing token {extra:?}"),
            });
        }
        Ok(dump)
    }
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn next_token(&mut self, expected: &'static str) -> Result<&'a str, LoadError> {
        let token = self.inner.next().ok_or(LoadError::Truncated { expected })?;
        self.position += 1;
        Ok(token)
    }

    fn next_u64(&mut self, expected: &'static str) -> Result<u64, LoadError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|e| LoadError::Parse {
            position: self.position - 1,
            message: format!("{expected}: {token:?}: {e}"),
        })
    }

    fn next_i64(&mut self, expected: &'static str) -> Result<i64, LoadError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|e| LoadError::Parse {
            position: self.position - 1,
            message: format!("{expected}: {token:?}: {e}"),
        })
    }
}

impl<S: TerminalSymbol> Endomorphism<S> {
    /// Flattens the non-trivial images into the persisted vertex order.
    pub fn dump(&self) -> SlpDump {
        let slp = self.slp();
        let mut seen = HashSet::new();
        let mut indices: HashMap<Vertex<S>, u64> = HashMap::new();
        let mut dump = SlpDump::default();

        for (symbol, root) in self.non_trivial_images() {
            for v in slp.postorder_vertices(root, &mut seen) {
                let index = indices.len() as u64;
                indices.insert(v, index);
                match v {
                    Vertex::Empty => dump.terminals.push((index, 0)),
                    Vertex::Terminal(t) => dump.terminals.push((index, t.code())),
                    Vertex::Nonterminal { .. } => {
                        if let Some((left, right)) = slp.children(v) {
                            dump.nonterminals
                                .push((index, indices[&left], indices[&right]));
                        }
                    }
                }
            }
            dump.roots.push((symbol.code(), indices[&root]));
        }
        dump
    }

    /// Rebuilds an endomorphism from a dump.
    ///
    /// Children must refer to vertices listed earlier: all terminals first,
    /// then nonterminals in file order.
    pub fn from_dump(dump: &SlpDump) -> Result<Self, LoadError> {
        let mut slp = Slp::new();
        let mut vertices: HashMap<u64, Vertex<S>> = HashMap::new();

        for &(index, code) in &dump.terminals {
            let vertex = if code == 0 {
                Vertex::Empty
            } else {
                Vertex::Terminal(S::from_code(code).ok_or(LoadError::InvalidSymbol { symbol: code })?)
            };
            if vertices.insert(index, vertex).is_some() {
                return Err(LoadError::DuplicateIndex { index });
            }
        }
        for &(index, left, right) in &dump.nonterminals {
            let left = *vertices
                .get(&left)
                .ok_or(LoadError::DanglingIndex { index: left })?;
            let right = *vertices
                .get(&right)
                .ok_or(LoadError::DanglingIndex { index: right })?;
            let vertex = slp.concat(left, right);
            if vertices.insert(index, vertex).is_some() {
                return Err(LoadError::DuplicateIndex { index });
            }
        }

        let mut images = BTreeMap::new();
        for &(code, index) in &dump.roots {
            let symbol = S::from_code(code)
                .filter(|s| s.is_positive())
                .ok_or(LoadError::InvalidRoot { symbol: code })?;
            let root = *vertices
                .get(&index)
                .ok_or(LoadError::DanglingIndex { index })?;
            match images.entry(symbol) {
                Entry::Occupied(_) => return Err(LoadError::DuplicateRoot { symbol: code }),
                Entry::Vacant(slot) => {
                    slot.insert(root);
                }
            }
        }
        Ok(Self::from_parts(slp, images))
    }

    /// Writes the text layout of the non-trivial images.
    pub fn save_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let dump = self.dump();
        debug!(
            roots = dump.roots.len(),
            terminals = dump.terminals.len(),
            nonterminals = dump.nonterminals.len(),
            "saving endomorphism"
        );
        dump.write_text(writer)
    }

    /// Reads an endomorphism written by [`Endomorphism::save_to`].
    pub fn load_from<R: BufRead>(reader: &mut R) -> Result<Self, LoadError> {
        let dump = SlpDump::read_text(reader)?;
        debug!(
            roots = dump.roots.len(),
            terminals = dump.terminals.len(),
            nonterminals = dump.nonterminals.len(),
            "loading endomorphism"
        );
        Self::from_dump(&dump)
    }

    /// Serializes the dump to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, SaveError> {
        Ok(serde_cbor::to_vec(&self.dump())?)
    }

    /// Deserializes an endomorphism from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, LoadError> {
        let dump: SlpDump = serde_cbor::from_slice(bytes)?;
        Self::from_dump(&dump)
    }

    /// Saves a CBOR snapshot to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SaveError> {
        let bytes = self.to_cbor()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a CBOR snapshot from a file.
    pub fn load_from_file(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path)?;
        Self::from_cbor(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type Endo = Endomorphism<i32>;

    fn text(e: &Endo) -> String {
        let mut out = Vec::new();
        e.save_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn load(text: &str) -> Result<Endo, LoadError> {
        Endo::load_from(&mut text.as_bytes())
    }

    fn random_composition(seed: u64, len: usize) -> Endo {
        let mut basic = Vec::new();
        Endo::for_each_basic_morphism(3, |e| basic.push(e));
        let mut rng = StdRng::seed_from_u64(seed);
        Endo::composition((0..len).map(|_| basic[rng.gen_range(0..basic.len())].clone()))
    }

    #[test]
    fn literal_layouts() {
        assert_eq!(text(&Endo::identity()), "0 0 0\n");
        assert_eq!(text(&Endo::inverter(1)), "1 1 0\n0 -1\n1 0\n");
        assert_eq!(
            text(&Endo::right_multiplier(1, 2)),
            "1 2 1\n0 1\n1 2\n2 0 1\n1 2\n"
        );
    }

    #[test]
    fn shared_vertices_are_written_once() {
        // x1 ↦ x1 x2, x2 ↦ x2 (x1 x2)
        let e = Endo::right_multiplier(1, 2) * Endo::right_multiplier(2, 1);
        assert_eq!(
            text(&e),
            "2 2 2\n0 1\n1 2\n2 0 1\n3 1 2\n1 2\n2 3\n"
        );
    }

    #[test]
    fn identity_round_trip() {
        let loaded = load(&text(&Endo::identity())).unwrap();
        assert_eq!(loaded, Endo::identity());
        assert!(loaded.is_identity());
    }

    #[test]
    fn long_composition_round_trip() {
        let e = random_composition(7, 64);
        let saved = text(&e);
        let loaded = load(&saved).unwrap();
        assert_eq!(loaded, e);
        assert_eq!(text(&loaded), saved);
        assert_eq!(loaded.dump().fingerprint(), e.dump().fingerprint());
    }

    #[test]
    fn empty_image_round_trip() {
        // x1 ↦ x1 x1^-1 reduces to the empty word
        let e = Endo::right_multiplier(1, -1).free_reduction();
        assert!(e.image_word(1).is_empty());
        let saved = text(&e);
        let loaded = load(&saved).unwrap();
        assert_eq!(loaded, e);

        let empty = load("1 1 0\n0 0\n1 0\n").unwrap();
        assert!(empty.image_word(1).is_empty());
        assert_eq!(text(&empty), "1 1 0\n0 0\n1 0\n");
    }

    #[test]
    fn cbor_and_file_round_trip() {
        let e = random_composition(11, 50);
        let bytes = e.to_cbor().unwrap();
        assert_eq!(Endo::from_cbor(&bytes).unwrap(), e);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endomorphism.cbor");
        e.save_to_file(&path).unwrap();
        let loaded = Endo::load_from_file(&path).unwrap();
        assert_eq!(loaded, e);
        assert_eq!(loaded.dump(), e.dump());
    }

    #[test]
    fn corrupt_input_is_rejected() {
        assert!(matches!(load("1 1"), Err(LoadError::Truncated { .. })));
        assert!(matches!(load("1 x 0"), Err(LoadError::Parse { position: 1, .. })));
        assert!(matches!(
            load("1 1 1\n0 1\n1 0 5\n1 1\n"),
            Err(LoadError::DanglingIndex { index: 5 })
        ));
        // forward reference to a nonterminal defined later
        assert!(matches!(
            load("1 2 2\n0 1\n1 2\n3 0 2\n2 0 1\n1 3\n"),
            Err(LoadError::DanglingIndex { index: 2 })
        ));
        assert!(matches!(
            load("0 2 0\n0 1\n0 2\n"),
            Err(LoadError::DuplicateIndex { index: 0 })
        ));
        assert!(matches!(
            load("1 1 0\n0 -1\n-1 0\n"),
            Err(LoadError::InvalidRoot { symbol: -1 })
        ));
        assert!(matches!(
            load("2 1 0\n0 -1\n1 0\n1 0\n"),
            Err(LoadError::DuplicateRoot { symbol: 1 })
        ));
        assert!(matches!(
            Endomorphism::<i8>::load_from(&mut "1 1 0\n0 300\n1 0\n".as_bytes()),
            Err(LoadError::InvalidSymbol { symbol: 300 })
        ));
        assert!(matches!(load("0 0 0\n7"), Err(LoadError::Parse { .. })));
        assert!(matches!(Endo::from_cbor(b"not cbor"), Err(LoadError::Cbor(_))));
    }
}
