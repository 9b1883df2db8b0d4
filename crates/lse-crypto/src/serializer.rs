use lse_types::{AccountId, Currency, Hash160, Hash256};

use crate::digest::{sha512_half, sha512_half_160};

/// Fixed-order byte builder for index derivation.
///
/// Index functions hash a sequence of fixed-width, big-endian fields.
/// The field order and widths are part of the storage format: changing
/// either silently re-keys every derived index. All integers are written
/// big-endian so derived indices sort the way they print.
#[derive(Clone, Debug, Default)]
pub struct IndexSerializer {
    buf: Vec<u8>,
}

impl IndexSerializer {
    /// Create an empty serializer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append a big-endian u16 (namespace tags).
    pub fn add_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian u32.
    pub fn add_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian u64.
    pub fn add_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a 160-bit account identifier.
    pub fn add_account(&mut self, id: &AccountId) -> &mut Self {
        self.buf.extend_from_slice(id.as_bytes());
        self
    }

    /// Append a 160-bit currency tag.
    pub fn add_currency(&mut self, c: &Currency) -> &mut Self {
        self.buf.extend_from_slice(c.as_bytes());
        self
    }

    /// Append a 160-bit digest.
    pub fn add_hash160(&mut self, h: &Hash160) -> &mut Self {
        self.buf.extend_from_slice(h.as_bytes());
        self
    }

    /// Append a 256-bit digest.
    pub fn add_hash256(&mut self, h: &Hash256) -> &mut Self {
        self.buf.extend_from_slice(h.as_bytes());
        self
    }

    /// Append raw bytes (fixed-width padding fields).
    pub fn add_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes accumulated.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// SHA-512-half of the accumulated bytes.
    pub fn sha512_half(&self) -> Hash256 {
        sha512_half(&self.buf)
    }

    /// 160-bit SHA-512 truncation of the accumulated bytes.
    pub fn sha512_half_160(&self) -> Hash160 {
        sha512_half_160(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_big_endian() {
        let mut s = IndexSerializer::with_capacity(14);
        s.add_u16(0x0102).add_u32(0x03040506).add_u64(0x0708090a0b0c0d0e);
        assert_eq!(
            s.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e]
        );
    }

    #[test]
    fn field_order_changes_digest() {
        let a = AccountId::from_bytes([1; 20]);
        let b = AccountId::from_bytes([2; 20]);

        let mut fwd = IndexSerializer::with_capacity(40);
        fwd.add_account(&a).add_account(&b);
        let mut rev = IndexSerializer::with_capacity(40);
        rev.add_account(&b).add_account(&a);

        assert_ne!(fwd.sha512_half(), rev.sha512_half());
    }

    #[test]
    fn digest_matches_plain_hash_of_bytes() {
        let mut s = IndexSerializer::with_capacity(2);
        s.add_u16(0x0061);
        assert_eq!(s.sha512_half(), crate::sha512_half(&[0x00, 0x61]));
        assert_eq!(s.sha512_half_160(), crate::sha512_half_160(&[0x00, 0x61]));
    }

    #[test]
    fn empty_serializer() {
        let s = IndexSerializer::default();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }
}
