use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// 256-bit digest.
///
/// `Hash256` is both the content address of a stored object and the index
/// of a typed entry inside a ledger's state map. Ordering is the natural
/// big-endian byte order: indices print as hex exactly as they sort.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// Wrap a pre-computed 32-byte digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The zero hash. Represents "no hash" (e.g. a genesis parent).
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Mutable access to the raw bytes.
    ///
    /// Needed by the directory-page index layout, which overwrites the
    /// trailing 8 bytes of a derived index in place.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; 32] {
        &mut self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for log output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.short_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash256> for [u8; 32] {
    fn from(h: Hash256) -> Self {
        h.0
    }
}

/// 160-bit digest.
///
/// Used where the storage format prescribes a short index, most
/// notably the offer-book base derived from an order's two legs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash160([u8; 20]);

impl Hash160 {
    /// Wrap a pre-computed 20-byte digest.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The zero hash.
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Hash160 {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Hash160> for [u8; 20] {
    fn from(h: Hash160) -> Self {
        h.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_all_zeros() {
        let zero = Hash256::zero();
        assert!(zero.is_zero());
        assert_eq!(zero.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash256::from_bytes([0xab; 32]);
        let hex = h.to_hex();
        let parsed = Hash256::from_hex(&hex).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Hash256::from_hex("abcd").unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { expected: 32, .. }));
    }

    #[test]
    fn from_hex_rejects_bad_characters() {
        let err = Hash256::from_hex("zz").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let h = Hash256::from_bytes([0x12; 32]);
        assert_eq!(h.short_hex().len(), 8);
    }

    #[test]
    fn display_is_full_hex() {
        let h = Hash256::from_bytes([7; 32]);
        let display = format!("{h}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, h.to_hex());
    }

    #[test]
    fn ordering_is_big_endian_lexicographic() {
        let mut lo = [0u8; 32];
        let mut hi = [0u8; 32];
        lo[31] = 1; // differs only in the last byte
        hi[0] = 1; // differs in the first byte
        assert!(Hash256::from_bytes(lo) < Hash256::from_bytes(hi));
    }

    #[test]
    fn serde_roundtrip() {
        let h = Hash256::from_bytes([0x5a; 32]);
        let json = serde_json::to_string(&h).unwrap();
        let parsed: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn hash160_roundtrip_and_zero() {
        let h = Hash160::from_bytes([0xcd; 20]);
        assert_eq!(Hash160::from_hex(&h.to_hex()).unwrap(), h);
        assert!(Hash160::zero().is_zero());
        assert!(!h.is_zero());
    }

    #[test]
    fn hash160_rejects_wrong_length() {
        let err = Hash160::from_hex("abcdef").unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { expected: 20, .. }));
    }

    #[test]
    fn as_bytes_mut_overwrites_in_place() {
        let mut h = Hash256::zero();
        h.as_bytes_mut()[31] = 0xff;
        assert_eq!(h.as_bytes()[31], 0xff);
        assert!(!h.is_zero());
    }
}
