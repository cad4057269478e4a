//! 160-bit node/value identifiers: canonical hex encoding and XOR distance.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;

use crate::error::{Result, RoutingError};
use crate::random::RandomSource;
use crate::{BIT_NODE_ID_LEN, HEX_NODE_ID_LEN};

/// A 160-bit Kademlia identifier (node guid or value key).
///
/// The canonical textual form is a lowercase, zero-padded 40-character hex
/// string; the canonical numeric form (used for XOR distance) is a `U256`
/// restricted to its low 160 bits. Both are kept and converted at the
/// boundary rather than re-parsed in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(U256);

impl Identifier {
    /// The identifier `0`.
    pub fn zero() -> Self {
        Identifier(U256::zero())
    }

    /// One past the largest representable identifier, `2^160`. Bucket
    /// ranges use this as an upper bound even though it is not itself a
    /// valid `Identifier`.
    pub fn space_size() -> U256 {
        U256::one() << BIT_NODE_ID_LEN
    }

    /// Builds an identifier from its numeric form.
    ///
    /// Fails with [`RoutingError::BadIdentifier`] if `n` does not fit in
    /// `BIT_NODE_ID_LEN` bits.
    pub fn from_u256(n: U256) -> Result<Self> {
        if n >= Self::space_size() {
            return Err(RoutingError::BadIdentifier(format!(
                "identifier {n:#x} exceeds the {BIT_NODE_ID_LEN}-bit identifier space"
            )));
        }
        Ok(Identifier(n))
    }

    /// The numeric form of this identifier.
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// The big-endian byte form of this identifier (20 bytes).
    pub fn to_bytes(self) -> [u8; HEX_NODE_ID_LEN / 2] {
        let mut wide = [0u8; 32];
        self.0.to_big_endian(&mut wide);
        let mut out = [0u8; HEX_NODE_ID_LEN / 2];
        out.copy_from_slice(&wide[32 - HEX_NODE_ID_LEN / 2..]);
        out
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for Identifier {
    type Err = RoutingError;

    /// Parses the canonical hex form, accepting an optional `0x`/`0X`
    /// prefix and an optional trailing legacy `L`/`l` marker (the big
    /// integer notation carried over from the source corpus), but never
    /// producing them in the canonical form.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let trimmed = trimmed.strip_suffix('L').or_else(|| trimmed.strip_suffix('l')).unwrap_or(trimmed);

        if trimmed.len() != HEX_NODE_ID_LEN {
            return Err(RoutingError::BadIdentifier(format!(
                "identifier {s:?} has length {}, expected {HEX_NODE_ID_LEN} hex chars",
                trimmed.len()
            )));
        }

        let mut bytes = [0u8; HEX_NODE_ID_LEN / 2];
        hex::decode_to_slice(trimmed, &mut bytes)
            .map_err(|err| RoutingError::BadIdentifier(format!("identifier {s:?} is not valid hex: {err}")))?;
        Ok(Identifier(U256::from_big_endian(&bytes)))
    }
}

/// XOR distance between two identifiers, interpreted as an unsigned integer.
///
/// `distance(g, g) == 0`, `distance(a, b) == distance(b, a)`, and XOR
/// satisfies the triangle inequality that makes it a valid metric for
/// Kademlia's notion of "closeness".
pub fn distance(a: &Identifier, b: &Identifier) -> U256 {
    a.0 ^ b.0
}

/// Draws a uniformly random identifier from the half-open integer range
/// `[lo, hi)`. Requires `lo < hi`; `lo`/`hi` are raw integers (typically a
/// bucket's range) rather than `Identifier`s, since a bucket's `range_max`
/// may legitimately equal `2^160`, one past the last valid identifier.
///
/// The randomness source is injected (see [`RandomSource`]) so refresh
/// scenarios are deterministic in tests.
pub fn random_in_range(lo: U256, hi: U256, random: &dyn RandomSource) -> Result<Identifier> {
    if lo >= hi {
        return Err(RoutingError::BadIdentifier(format!(
            "empty or inverted range [{lo:#x}, {hi:#x})"
        )));
    }
    let width = hi - lo;
    let offset = random.uniform_below(width);
    Identifier::from_u256(lo + offset)
}
