use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// 160-bit account identifier.
///
/// Derived from account key material by the wallet layer; this crate treats
/// it as an opaque fixed-width identifier with a total order (the order
/// matters: trust-line indices canonicalize the account pair by it).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Wrap a raw 20-byte account identifier.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The zero account. Used as the issuer of native-unit legs.
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` if this is the zero account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte identifier.
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

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// 160-bit currency tag.
///
/// The all-zero tag denotes the native unit; any other value names an
/// issued currency. Index derivation treats the two cases differently
/// (native legs encode as fixed zero padding), so the distinction is
/// load-bearing for the storage format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency([u8; 20]);

impl Currency {
    /// Wrap a raw 20-byte currency tag.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The native unit (all-zero tag).
    pub const fn native() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` if this is the native unit.
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte tag.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Currency {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_hex_roundtrip() {
        let id = AccountId::from_bytes([0x42; 20]);
        assert_eq!(AccountId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn account_rejects_wrong_length() {
        let err = AccountId::from_hex("00ff").unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { expected: 20, .. }));
    }

    #[test]
    fn account_ordering_is_byte_order() {
        let mut lo = [0u8; 20];
        let mut hi = [0u8; 20];
        lo[19] = 9;
        hi[0] = 1;
        assert!(AccountId::from_bytes(lo) < AccountId::from_bytes(hi));
    }

    #[test]
    fn native_currency_is_all_zero() {
        assert!(Currency::native().is_native());
        assert!(!Currency::from_bytes([1; 20]).is_native());
    }

    #[test]
    fn zero_account() {
        assert!(AccountId::zero().is_zero());
        assert!(!AccountId::from_bytes([3; 20]).is_zero());
    }
}
