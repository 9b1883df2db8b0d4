use serde::{Deserialize, Serialize};

use lse_crypto::sha512_half;
use lse_types::Hash256;

use crate::error::{BackendError, StoreError};

/// The kind of hashed object stored.
///
/// The tag values are part of the persisted record format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashedObjectKind {
    /// Kind lost or not yet known (legacy records).
    Unknown,
    /// A serialized ledger header.
    Ledger,
    /// A raw transaction blob.
    Transaction,
    /// An inner node of an account-state tree.
    AccountNode,
    /// An inner node of a transaction tree.
    TransactionNode,
}

impl HashedObjectKind {
    /// The persisted tag byte.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Ledger => 1,
            Self::Transaction => 2,
            Self::AccountNode => 3,
            Self::TransactionNode => 4,
        }
    }

    /// Decode a persisted tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Unknown),
            1 => Some(Self::Ledger),
            2 => Some(Self::Transaction),
            3 => Some(Self::AccountNode),
            4 => Some(Self::TransactionNode),
            _ => None,
        }
    }
}

impl std::fmt::Display for HashedObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Ledger => "ledger",
            Self::Transaction => "transaction",
            Self::AccountNode => "account_node",
            Self::TransactionNode => "transaction_node",
        };
        f.write_str(name)
    }
}

/// An immutable, content-addressed blob.
///
/// The hash is always the SHA-512-half of the data; construction enforces
/// it and no mutator exists. Objects are shared by reference count inside
/// the store's cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashedObject {
    kind: HashedObjectKind,
    hash: Hash256,
    ledger_index: u32,
    data: Vec<u8>,
}

impl HashedObject {
    /// Build an object from its parts, verifying the caller-supplied hash
    /// against the content digest.
    pub fn new(
        kind: HashedObjectKind,
        ledger_index: u32,
        data: Vec<u8>,
        hash: Hash256,
    ) -> Result<Self, StoreError> {
        let computed = sha512_half(&data);
        if computed != hash {
            return Err(StoreError::HashMismatch {
                expected: hash,
                computed,
            });
        }
        Ok(Self {
            kind,
            hash,
            ledger_index,
            data,
        })
    }

    /// Build an object from raw content, computing the hash.
    pub fn from_content(kind: HashedObjectKind, ledger_index: u32, data: Vec<u8>) -> Self {
        let hash = sha512_half(&data);
        Self {
            kind,
            hash,
            ledger_index,
            data,
        }
    }

    /// The object kind.
    pub fn kind(&self) -> HashedObjectKind {
        self.kind
    }

    /// The content address.
    pub fn hash(&self) -> &Hash256 {
        &self.hash
    }

    /// The ledger sequence this object is associated with.
    pub fn ledger_index(&self) -> u32 {
        self.ledger_index
    }

    /// The raw content bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Recompute the content digest and compare it to the stored hash.
    pub fn verify(&self) -> bool {
        sha512_half(&self.data) == self.hash
    }
}

/// The logical persisted record shape: `{ hash, ledger_index, type tag,
/// raw bytes }`, keyed by the 256-bit hash.
///
/// Backends serialize this struct; interoperating with existing stored
/// data requires preserving it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub hash: Hash256,
    pub ledger_index: u32,
    pub kind_tag: u8,
    pub data: Vec<u8>,
}

impl StoredRecord {
    /// Capture an object into its persisted shape.
    pub fn from_object(object: &HashedObject) -> Self {
        Self {
            hash: *object.hash(),
            ledger_index: object.ledger_index(),
            kind_tag: object.kind().tag(),
            data: object.data().to_vec(),
        }
    }

    /// Reconstruct the object, verifying the stored digest.
    pub fn into_object(self) -> Result<HashedObject, BackendError> {
        let kind = HashedObjectKind::from_tag(self.kind_tag).ok_or(BackendError::Corrupt {
            hash: self.hash,
            reason: format!("unknown kind tag {}", self.kind_tag),
        })?;
        let computed = sha512_half(&self.data);
        if computed != self.hash {
            return Err(BackendError::Corrupt {
                hash: self.hash,
                reason: format!("content digest mismatch (computed {})", computed.short_hex()),
            });
        }
        Ok(HashedObject {
            kind,
            hash: self.hash,
            ledger_index: self.ledger_index,
            data: self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_matching_hash() {
        let data = b"abc".to_vec();
        let hash = sha512_half(&data);
        let obj = HashedObject::new(HashedObjectKind::Ledger, 100, data, hash).unwrap();
        assert_eq!(obj.ledger_index(), 100);
        assert_eq!(obj.data(), b"abc");
        assert!(obj.verify());
    }

    #[test]
    fn new_rejects_wrong_hash() {
        let err = HashedObject::new(
            HashedObjectKind::Transaction,
            1,
            b"abc".to_vec(),
            Hash256::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn from_content_computes_hash() {
        let obj = HashedObject::from_content(HashedObjectKind::Transaction, 7, b"tx".to_vec());
        assert_eq!(*obj.hash(), sha512_half(b"tx"));
    }

    #[test]
    fn kind_tags_roundtrip() {
        for tag in 0..=4u8 {
            let kind = HashedObjectKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert!(HashedObjectKind::from_tag(5).is_none());
    }

    #[test]
    fn record_roundtrip() {
        let obj = HashedObject::from_content(HashedObjectKind::AccountNode, 42, b"node".to_vec());
        let record = StoredRecord::from_object(&obj);
        let back = record.into_object().unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn record_with_bad_tag_is_corrupt() {
        let obj = HashedObject::from_content(HashedObjectKind::Ledger, 1, b"x".to_vec());
        let mut record = StoredRecord::from_object(&obj);
        record.kind_tag = 99;
        let err = record.into_object().unwrap_err();
        assert!(matches!(err, BackendError::Corrupt { .. }));
    }

    #[test]
    fn record_with_tampered_data_is_corrupt() {
        let obj = HashedObject::from_content(HashedObjectKind::Ledger, 1, b"x".to_vec());
        let mut record = StoredRecord::from_object(&obj);
        record.data = b"tampered".to_vec();
        let err = record.into_object().unwrap_err();
        assert!(matches!(err, BackendError::Corrupt { .. }));
    }
}
