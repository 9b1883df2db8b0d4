use lse_crypto::prefixed_sha512_half;
use lse_types::Hash256;

use crate::error::LedgerError;

/// Domain prefix mixed into every ledger header hash.
pub const LEDGER_HASH_PREFIX: [u8; 4] = *b"LGR\0";

/// Fixed-width ledger header.
///
/// The wire encoding is the exact byte sequence the ledger hash is computed
/// over and the payload stored in the hashed-object store, so the layout is
/// a storage-format contract: all integers big-endian, fields in the order
/// they appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerHeader {
    /// Position in the chain; the genesis ledger is sequence zero.
    pub ledger_seq: u32,
    /// Total native units in existence.
    pub total_coins: u64,
    /// Hash of the previous ledger's header.
    pub parent_hash: Hash256,
    /// Root of the transaction map.
    pub trans_hash: Hash256,
    /// Root of the account-state map.
    pub account_hash: Hash256,
    /// Close time, seconds since the network epoch.
    pub close_time: u64,
    /// Target seconds between closes.
    pub ledger_interval: u16,
}

/// Encoded header length: 4 + 8 + 32 + 32 + 32 + 8 + 2.
pub const HEADER_LEN: usize = 118;

impl LedgerHeader {
    /// Serialize to the canonical wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(&self.ledger_seq.to_be_bytes());
        buf.extend_from_slice(&self.total_coins.to_be_bytes());
        buf.extend_from_slice(self.parent_hash.as_bytes());
        buf.extend_from_slice(self.trans_hash.as_bytes());
        buf.extend_from_slice(self.account_hash.as_bytes());
        buf.extend_from_slice(&self.close_time.to_be_bytes());
        buf.extend_from_slice(&self.ledger_interval.to_be_bytes());
        buf
    }

    /// Decode from the canonical wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        if bytes.len() != HEADER_LEN {
            return Err(LedgerError::BadHeader(format!(
                "expected {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut hash = [0u8; 32];
        let ledger_seq = u32::from_be_bytes(bytes[0..4].try_into().expect("fixed slice"));
        let total_coins = u64::from_be_bytes(bytes[4..12].try_into().expect("fixed slice"));
        hash.copy_from_slice(&bytes[12..44]);
        let parent_hash = Hash256::from_bytes(hash);
        hash.copy_from_slice(&bytes[44..76]);
        let trans_hash = Hash256::from_bytes(hash);
        hash.copy_from_slice(&bytes[76..108]);
        let account_hash = Hash256::from_bytes(hash);
        let close_time = u64::from_be_bytes(bytes[108..116].try_into().expect("fixed slice"));
        let ledger_interval = u16::from_be_bytes(bytes[116..118].try_into().expect("fixed slice"));
        Ok(Self {
            ledger_seq,
            total_coins,
            parent_hash,
            trans_hash,
            account_hash,
            close_time,
            ledger_interval,
        })
    }

    /// The ledger hash: domain-prefixed digest of the wire form.
    pub fn hash(&self) -> Hash256 {
        prefixed_sha512_half(LEDGER_HASH_PREFIX, &self.to_bytes())
    }

    /// JSON rendering for RPC responses and logs.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ledger_seq": self.ledger_seq,
            "total_coins": self.total_coins.to_string(),
            "parent_hash": self.parent_hash.to_hex(),
            "trans_hash": self.trans_hash.to_hex(),
            "account_hash": self.account_hash.to_hex(),
            "close_time": self.close_time,
            "ledger_interval": self.ledger_interval,
            "hash": self.hash().to_hex(),
        })
    }
}
