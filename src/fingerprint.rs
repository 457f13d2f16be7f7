//! Fingerprints of compressed words.
//!
//! A `WordFingerprint` is a Karp–Rabin polynomial hash of a word evaluated at
//! two bases modulo the Mersenne prime `2^61 - 1`. Alongside the hash of
//! the word it keeps the hash of the inverse word and the base powers
//! `B^|w|`, so fingerprints of concatenations and of inverse views are computed
//! in constant time from the fingerprints of their parts. That makes the
//! fingerprint of an exponentially long word as cheap as the DAG that encodes it.
//!
//! Symbols are mapped to field elements through a domain-separated SHA-256 so
//! that nearby symbols (`x_1`, `x_2`, `x_1^-1`) get unrelated codes.
//!
//! The bases are drawn from system entropy once per process and never
//! persisted, so colliding words cannot be prepared in advance. Two distinct
//! words of length at most `n` collide at a uniformly random base with
//! probability at most `n / (2^61 - 1)`; the two bases are independent.
//!
//! # Citations
//! - Karp & Rabin, "Efficient randomized pattern-matching algorithms" (1987)
//! - Fingerprinting of straight-line programs: Lohrey, "Algorithmics on SLP-compressed strings: A survey" (2012)
//! - SHA-256: NIST FIPS 180-4 (2015)

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// The Mersenne prime `2^61 - 1`.
const MODULUS: u64 = (1 << 61) - 1;

static PROCESS_BASES: OnceLock<FingerprintBases> = OnceLock::new();

/// Evaluation points of the two polynomial hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintBases([u64; 2]);

impl FingerprintBases {
    /// Draws both bases uniformly from `[2, 2^61 - 2]`.
    pub fn from_rng<R: RngCore>(rng: &mut R) -> Self {
        Self([rng.gen_range(2..MODULUS - 1), rng.gen_range(2..MODULUS - 1)])
    }

    /// Reproducible bases, for tests and experiments.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// The bases used by every program in this process, drawn on first use.
    pub fn process() -> &'static Self {
        PROCESS_BASES.get_or_init(|| Self::from_rng(&mut StdRng::from_entropy()))
    }
}

#[inline]
fn add_mod(a: u64, b: u64) -> u64 {
    let s = a + b;
    if s >= MODULUS {
        s - MODULUS
    } else {
        s
    }
}

#[inline]
fn mul_mod(a: u64, b: u64) -> u64 {
    let product = (a as u128) * (b as u128);
    let folded = ((product as u64) & MODULUS) + (product >> 61) as u64;
    let folded = (folded & MODULUS) + (folded >> 61);
    if folded >= MODULUS {
        folded - MODULUS
    } else {
        folded
    }
}

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of the given data with domain separation.
    ///
    /// Domain separation prefix is applied as `b"SLP:<domain>:v1" || length_prefix(data) || data`.
    /// Length prefix is a 64-bit little-endian count of bytes.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"SLP:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Reads the `lane`-th little-endian 64-bit word of the digest.
    fn lane(&self, lane: usize) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.as_bytes()[lane * 8..lane * 8 + 8]);
        u64::from_le_bytes(word)
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Field elements assigned to a signed symbol code, one per base.
///
/// Never zero, so a symbol always contributes to the hash.
fn symbol_code(code: i64) -> [u64; 2] {
    let digest = HashValue::hash_with_domain(b"SYMBOL", &code.to_le_bytes());
    let mut out = [0u64; 2];
    for (lane, slot) in out.iter_mut().enumerate() {
        let value = digest.lane(lane) % MODULUS;
        *slot = if value == 0 { 1 } else { value };
    }
    out
}

/// Constant-size summary of a word that composes under concatenation and inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordFingerprint {
    forward: [u64; 2],
    inverse: [u64; 2],
    power: [u64; 2],
}

impl WordFingerprint {
    /// Fingerprint of the empty word.
    pub const EMPTY: WordFingerprint = WordFingerprint {
        forward: [0, 0],
        inverse: [0, 0],
        power: [1, 1],
    };

    /// Fingerprint of the one-letter word with the given signed symbol code,
    /// at the bases of this process.
    pub fn terminal(code: i64) -> Self {
        Self::terminal_with(code, FingerprintBases::process())
    }

    /// Fingerprint of a one-letter word at explicit bases.
    ///
    /// Fingerprints taken at different bases must not be combined.
    pub fn terminal_with(code: i64, bases: &FingerprintBases) -> Self {
        Self {
            forward: symbol_code(code),
            inverse: symbol_code(-code),
            power: bases.0,
        }
    }

    /// Fingerprint of the concatenation `self · right`.
    pub fn concat(&self, right: &WordFingerprint) -> Self {
        let mut out = WordFingerprint::EMPTY;
        for i in 0..2 {
            out.forward[i] = add_mod(mul_mod(self.forward[i], right.power[i]), right.forward[i]);
            // (uv)^-1 = v^-1 u^-1
            out.inverse[i] = add_mod(mul_mod(right.inverse[i], self.power[i]), self.inverse[i]);
            out.power[i] = mul_mod(self.power[i], right.power[i]);
        }
        out
    }

    /// Fingerprint of the inverse word (read back to front, every symbol inverted).
    #[inline]
    pub fn negate(&self) -> Self {
        Self {
            forward: self.inverse,
            inverse: self.forward,
            power: self.power,
        }
    }

    /// Returns `true` if both fingerprints may denote the same word.
    ///
    /// A `false` answer is a proof of inequality.
    #[inline]
    pub fn matches(&self, other: &WordFingerprint) -> bool {
        self.forward == other.forward && self.power == other.power
    }
}

impl Default for WordFingerprint {
    fn default() -> Self {
        Self::EMPTY
    }
}
