use serde::{Deserialize, Serialize};

/// Variant tag of a typed state object (serialized ledger entry).
///
/// The tag is embedded in the serialized blob, so reading an index back
/// as the wrong variant is detectable instead of silently reinterpreting
/// the bytes. The discriminants are part of the storage format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum LedgerEntryType {
    /// An account's root object: balance, sequence, flags.
    AccountRoot = 0x0061, // 'a'
    /// One page of a directory (owner directory or order book).
    DirectoryNode = 0x0064, // 'd'
    /// A generator map (account-family key generator).
    GeneratorMap = 0x0067, // 'g'
    /// A nickname registration.
    Nickname = 0x006e, // 'n'
    /// An offer on the order book.
    Offer = 0x006f, // 'o'
    /// A trust line between two accounts in one currency.
    RippleState = 0x0072, // 'r'
}

impl LedgerEntryType {
    /// All variants, in tag order. Handy for exhaustive tests.
    pub const ALL: [LedgerEntryType; 6] = [
        LedgerEntryType::AccountRoot,
        LedgerEntryType::DirectoryNode,
        LedgerEntryType::GeneratorMap,
        LedgerEntryType::Nickname,
        LedgerEntryType::Offer,
        LedgerEntryType::RippleState,
    ];

    /// The storage-format tag value.
    pub fn tag(&self) -> u16 {
        *self as u16
    }

    /// Stable lower-case name, used in JSON views and log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountRoot => "account_root",
            Self::DirectoryNode => "directory_node",
            Self::GeneratorMap => "generator_map",
            Self::Nickname => "nickname",
            Self::Offer => "offer",
            Self::RippleState => "ripple_state",
        }
    }
}

impl std::fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
