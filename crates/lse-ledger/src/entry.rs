use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lse_types::{AccountId, Currency, Hash256, LedgerEntryType};

use crate::error::LedgerError;

/// A field slot inside a ledger entry.
///
/// Each entry type populates a subset of these. The set is deliberately
/// flat: an entry is a typed bag of named values, and the state map only
/// ever sees the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    /// Owning account (account roots, offers).
    Account,
    /// Native balance of an account root.
    Balance,
    /// Next transaction sequence expected from the account.
    Sequence,
    /// Count of owned objects charged against the account's reserve.
    OwnerCount,
    /// Entry-specific bit flags.
    Flags,
    /// Currency code (ripple states, offers).
    Currency,
    /// Credit limit extended by the numerically lower account.
    LowLimit,
    /// Credit limit extended by the numerically higher account.
    HighLimit,
    /// Signed balance of a ripple state, from the low account's view.
    RippleBalance,
    /// Amount an offer owner wants to receive.
    TakerPays,
    /// Amount an offer owner will give.
    TakerGets,
    /// Public generator for a generator-map entry.
    GeneratorKey,
    /// Account a nickname resolves to.
    NicknameOwner,
    /// Index of the first page of a directory.
    RootIndex,
    /// Indexes listed in a directory page.
    Indexes,
    /// Previous page of a chained directory.
    PreviousPage,
    /// Next page of a chained directory.
    NextPage,
    /// Hash of the transaction that last touched this entry.
    PreviousTxnId,
    /// Ledger sequence of that transaction.
    PreviousTxnSeq,
}

/// A value stored in a field slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    U32(u32),
    U64(u64),
    Hash(Hash256),
    Account(AccountId),
    Currency(Currency),
    Blob(Vec<u8>),
    IndexList(Vec<Hash256>),
}

/// A typed, decoded ledger state entry.
///
/// An entry is addressed by its deterministic index and carries its type
/// tag inside the serialized blob, so a decoded entry can always be checked
/// against the type the caller expected. The index itself is never part of
/// the blob; it is recomputable from the entry's identifying fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    entry_type: LedgerEntryType,
    index: Hash256,
    fields: BTreeMap<Field, FieldValue>,
}

/// Serialized shape of an entry. The index is external addressing data and
/// is intentionally not stored.
#[derive(Serialize, Deserialize)]
struct EntryBlob {
    entry_type: LedgerEntryType,
    fields: BTreeMap<Field, FieldValue>,
}

impl LedgerEntry {
    /// Create an empty entry of the given type at the given index.
    pub fn new(entry_type: LedgerEntryType, index: Hash256) -> Self {
        Self {
            entry_type,
            index,
            fields: BTreeMap::new(),
        }
    }

    pub fn entry_type(&self) -> LedgerEntryType {
        self.entry_type
    }

    pub fn index(&self) -> &Hash256 {
        &self.index
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: Field, value: FieldValue) -> &mut Self {
        self.fields.insert(field, value);
        self
    }

    /// Remove a field. Returns the previous value if one was set.
    pub fn clear(&mut self, field: Field) -> Option<FieldValue> {
        self.fields.remove(&field)
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Fetch a `u32` field, or `None` if absent or differently typed.
    pub fn get_u32(&self, field: Field) -> Option<u32> {
        match self.fields.get(&field) {
            Some(FieldValue::U32(v)) => Some(*v),
            _ => None,
        }
    }

    /// Fetch a `u64` field, or `None` if absent or differently typed.
    pub fn get_u64(&self, field: Field) -> Option<u64> {
        match self.fields.get(&field) {
            Some(FieldValue::U64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Fetch an account field, or `None` if absent or differently typed.
    pub fn get_account(&self, field: Field) -> Option<&AccountId> {
        match self.fields.get(&field) {
            Some(FieldValue::Account(a)) => Some(a),
            _ => None,
        }
    }

    /// Number of populated fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Serialize the entry to the blob form held by the state map.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let blob = EntryBlob {
            entry_type: self.entry_type,
            fields: self.fields.clone(),
        };
        bincode::serialize(&blob).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Decode an entry from a state-map blob at the given index.
    pub fn from_bytes(index: Hash256, bytes: &[u8]) -> Result<Self, LedgerError> {
        let blob: EntryBlob =
            bincode::deserialize(bytes).map_err(|e| LedgerError::Corrupt {
                index,
                reason: e.to_string(),
            })?;
        Ok(Self {
            entry_type: blob.entry_type,
            index,
            fields: blob.fields,
        })
    }

    /// JSON rendering for diagnostics and RPC responses.
    pub fn to_json(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        for (field, value) in &self.fields {
            let rendered = match value {
                FieldValue::U32(v) => serde_json::json!(v),
                FieldValue::U64(v) => serde_json::json!(v.to_string()),
                FieldValue::Hash(h) => serde_json::json!(h.to_hex()),
                FieldValue::Account(a) => serde_json::json!(a.to_hex()),
                FieldValue::Currency(c) => serde_json::json!(c.to_hex()),
                FieldValue::Blob(b) => serde_json::json!(hex::encode(b)),
                FieldValue::IndexList(list) => {
                    serde_json::json!(list.iter().map(|h| h.to_hex()).collect::<Vec<_>>())
                }
            };
            fields.insert(format!("{field:?}"), rendered);
        }
        serde_json::json!({
            "type": self.entry_type.name(),
            "index": self.index.to_hex(),
            "fields": fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- serialization ----

    #[test]
    fn round_trips_through_blob_form() {
        let index = Hash256::from_bytes([3; 32]);
        let mut entry = LedgerEntry::new(LedgerEntryType::AccountRoot, index);
        entry
            .set(Field::Balance, FieldValue::U64(1_000_000))
            .set(Field::Sequence, FieldValue::U32(7))
            .set(
                Field::Account,
                FieldValue::Account(AccountId::from_bytes([5; 20])),
            );

        let bytes = entry.to_bytes().unwrap();
        let decoded = LedgerEntry::from_bytes(index, &bytes).unwrap();
        assert_eq!(decoded, entry);
        assert_eq!(decoded.get_u64(Field::Balance), Some(1_000_000));
        assert_eq!(decoded.get_u32(Field::Sequence), Some(7));
    }

    #[test]
    fn decode_of_garbage_is_corrupt() {
        let index = Hash256::from_bytes([1; 32]);
        let err = LedgerEntry::from_bytes(index, &[0xff; 3]).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[test]
    fn index_survives_round_trip_without_being_stored() {
        let index = Hash256::from_bytes([9; 32]);
        let entry = LedgerEntry::new(LedgerEntryType::Offer, index);
        let bytes = entry.to_bytes().unwrap();

        let other_index = Hash256::from_bytes([8; 32]);
        let decoded = LedgerEntry::from_bytes(other_index, &bytes).unwrap();
        assert_eq!(*decoded.index(), other_index);
        assert_eq!(decoded.entry_type(), LedgerEntryType::Offer);
    }

    // ---- field access ----

    #[test]
    fn typed_getters_reject_mismatched_values() {
        let mut entry =
            LedgerEntry::new(LedgerEntryType::AccountRoot, Hash256::from_bytes([2; 32]));
        entry.set(Field::Balance, FieldValue::U32(10));
        assert_eq!(entry.get_u64(Field::Balance), None);
        assert_eq!(entry.get_u32(Field::Balance), Some(10));
        assert_eq!(entry.get_u32(Field::Sequence), None);
    }

    #[test]
    fn clear_removes_a_field() {
        let mut entry =
            LedgerEntry::new(LedgerEntryType::AccountRoot, Hash256::from_bytes([2; 32]));
        entry.set(Field::Flags, FieldValue::U32(1));
        assert_eq!(entry.field_count(), 1);
        assert!(entry.clear(Field::Flags).is_some());
        assert_eq!(entry.field_count(), 0);
        assert!(entry.clear(Field::Flags).is_none());
    }

    #[test]
    fn json_rendering_names_the_type() {
        let entry =
            LedgerEntry::new(LedgerEntryType::RippleState, Hash256::from_bytes([4; 32]));
        let json = entry.to_json();
        assert_eq!(json["type"], "ripple_state");
    }
}
