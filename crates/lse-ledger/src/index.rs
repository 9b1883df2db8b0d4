//! Deterministic index derivation.
//!
//! Every state entry lives at a 256-bit index computed from its identifying
//! fields under a per-type namespace tag. The tags, field order, and widths
//! are part of the storage format; any change re-keys the entire state map.

use lse_crypto::IndexSerializer;
use lse_types::{AccountId, Currency, Hash160, Hash256};

use crate::error::IndexError;

/// Namespace tag mixed into every derived index.
///
/// Distinct tags keep the index spaces disjoint even when the identifying
/// fields collide (an account's root and its owner directory both derive
/// from the bare account identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum IndexSpace {
    /// Account root entries.
    Account = 0x0061, // 'a'
    /// Directory pages past the root page.
    DirectoryNode = 0x0064, // 'd'
    /// Generator maps.
    Generator = 0x0067, // 'g'
    /// Nickname registrations.
    Nickname = 0x006e, // 'n'
    /// Offers.
    Offer = 0x006f, // 'o'
    /// Owner directories (root page).
    OwnerDirectory = 0x004f, // 'O'
    /// Order-book directories (root page).
    Book = 0x0042, // 'B'
    /// Trust lines.
    RippleState = 0x0072, // 'r'
}

impl IndexSpace {
    /// The tag value written into the derivation preimage.
    pub fn tag(self) -> u16 {
        self as u16
    }
}

/// Width of one encoded offer leg: 20-byte currency plus 20-byte issuer.
const LEG_LEN: usize = 40;

/// Fixed padding standing in for a native leg in a book base preimage.
/// Four zero bytes, deliberately narrower than any issued-currency leg so
/// the two encodings can never alias.
const NATIVE_LEG_PAD: [u8; 4] = [0u8; 4];

/// Number of trailing bytes of a directory index that carry the page
/// number.
const DIR_PAGE_BYTES: usize = 8;

/// Modulus for the skip distance read from an offer index.
const SKIP_RANGE: u8 = 16;

/// Index of an account's root entry.
pub fn account_root_index(account: &AccountId) -> Hash256 {
    IndexSerializer::with_capacity(22)
        .add_u16(IndexSpace::Account.tag())
        .add_account(account)
        .sha512_half()
}

/// Index of an account's owner directory (root page).
pub fn owner_dir_index(account: &AccountId) -> Hash256 {
    IndexSerializer::with_capacity(22)
        .add_u16(IndexSpace::OwnerDirectory.tag())
        .add_account(account)
        .sha512_half()
}

/// Index of a generator-map entry, from the 160-bit generator identifier.
pub fn generator_index(generator: &Hash160) -> Hash256 {
    IndexSerializer::with_capacity(22)
        .add_u16(IndexSpace::Generator.tag())
        .add_hash160(generator)
        .sha512_half()
}

/// Index of a nickname entry, from the 256-bit nickname digest.
pub fn nickname_index(nickname: &Hash256) -> Hash256 {
    IndexSerializer::with_capacity(34)
        .add_u16(IndexSpace::Nickname.tag())
        .add_hash256(nickname)
        .sha512_half()
}

/// Index of the trust line between two accounts in one currency.
///
/// The account pair is canonicalized low-account-first before hashing, so
/// both participants derive the same index regardless of argument order.
pub fn ripple_state_index(a: &AccountId, b: &AccountId, currency: &Currency) -> Hash256 {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    IndexSerializer::with_capacity(62)
        .add_u16(IndexSpace::RippleState.tag())
        .add_account(low)
        .add_account(high)
        .add_currency(currency)
        .sha512_half()
}

/// Trust-line index for the native unit (two-account shorthand).
pub fn ripple_state_index_native(a: &AccountId, b: &AccountId) -> Hash256 {
    ripple_state_index(a, b, &Currency::native())
}

/// 160-bit base shared by every offer trading one asset pair.
///
/// Each leg is `(currency, issuer)`. A native leg must carry the zero
/// issuer and encodes as fixed four-byte padding; an issued leg must carry
/// a non-zero issuer and encodes as currency followed by issuer. Both legs
/// native, or two identical legs, is a contract violation.
pub fn book_base(
    pays_currency: &Currency,
    pays_issuer: &AccountId,
    gets_currency: &Currency,
    gets_issuer: &AccountId,
) -> Result<Hash160, IndexError> {
    check_leg("pays", pays_currency, pays_issuer)?;
    check_leg("gets", gets_currency, gets_issuer)?;
    if pays_currency.is_native() && gets_currency.is_native() {
        return Err(IndexError::BothLegsNative);
    }
    if pays_currency == gets_currency && pays_issuer == gets_issuer {
        return Err(IndexError::IdenticalLegs);
    }

    let mut s = IndexSerializer::with_capacity(2 + 2 * LEG_LEN);
    s.add_u16(IndexSpace::Book.tag());
    add_leg(&mut s, pays_currency, pays_issuer);
    add_leg(&mut s, gets_currency, gets_issuer);
    Ok(s.sha512_half_160())
}

fn check_leg(
    leg: &'static str,
    currency: &Currency,
    issuer: &AccountId,
) -> Result<(), IndexError> {
    if currency.is_native() && !issuer.is_zero() {
        return Err(IndexError::NativeLegWithIssuer { leg });
    }
    if !currency.is_native() && issuer.is_zero() {
        return Err(IndexError::IssuedLegWithoutIssuer { leg });
    }
    Ok(())
}

fn add_leg(s: &mut IndexSerializer, currency: &Currency, issuer: &AccountId) {
    if currency.is_native() {
        s.add_raw(&NATIVE_LEG_PAD);
    } else {
        s.add_currency(currency).add_account(issuer);
    }
}

/// Index of a specific offer within a book, from its base, exchange rate,
/// and skip distance.
pub fn offer_index(base: &Hash160, rate: u64, skip: u8) -> Hash256 {
    IndexSerializer::with_capacity(31)
        .add_u16(IndexSpace::Offer.tag())
        .add_hash160(base)
        .add_u64(rate)
        .add_raw(&[skip])
        .sha512_half()
}

/// Skip distance an offer occupies in its quality bucket, read from the
/// leading byte of its index. Always in `1..=SKIP_RANGE` so a probe walk
/// terminates.
pub fn offer_skip(offer: &Hash256) -> u8 {
    (offer.as_bytes()[0] % SKIP_RANGE) + 1
}

/// Index of directory page `page` chained under `base`.
///
/// The base and namespace are hashed together, then the page number is
/// written big-endian over the trailing eight bytes. Consecutive pages of
/// one directory therefore sort adjacently in the state map.
pub fn dir_page_index(base: &Hash256, space: IndexSpace, page: u64) -> Hash256 {
    let mut index = IndexSerializer::with_capacity(34)
        .add_u16(space.tag())
        .add_hash256(base)
        .sha512_half();
    index.as_bytes_mut()[32 - DIR_PAGE_BYTES..].copy_from_slice(&page.to_be_bytes());
    index
}

/// Page number carried in a directory index's trailing bytes.
pub fn dir_page(index: &Hash256) -> u64 {
    let mut raw = [0u8; DIR_PAGE_BYTES];
    raw.copy_from_slice(&index.as_bytes()[32 - DIR_PAGE_BYTES..]);
    u64::from_be_bytes(raw)
}

/// First index past every page of the directory `base` belongs to.
///
/// Adds one to the 192-bit prefix (the index with the page bytes treated
/// as fractional), which is the smallest index no page of this directory
/// can have. Book walks use it to hop to the next quality bucket.
pub fn quality_next(base: &Hash256) -> Hash256 {
    let mut bytes = *base.as_bytes();
    for byte in bytes[..32 - DIR_PAGE_BYTES].iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    Hash256::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn acct(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 20])
    }

    fn curr(seed: u8) -> Currency {
        Currency::from_bytes([seed; 20])
    }

    // ---- determinism and disjointness ----

    #[test]
    fn account_root_is_deterministic() {
        let a = acct(7);
        assert_eq!(account_root_index(&a), account_root_index(&a));
        assert_ne!(account_root_index(&a), account_root_index(&acct(8)));
    }

    #[test]
    fn namespaces_are_disjoint_for_the_same_account() {
        let a = acct(7);
        assert_ne!(account_root_index(&a), owner_dir_index(&a));
    }

    #[test]
    fn generator_and_nickname_spaces_differ() {
        let g = Hash160::from_bytes([1; 20]);
        let n = Hash256::from_bytes([1; 32]);
        // Different preimage widths already separate these; the tag keeps
        // them apart even against future same-width additions.
        assert_ne!(generator_index(&g), nickname_index(&n));
    }

    // ---- trust lines ----

    #[test]
    fn ripple_state_is_symmetric_in_the_account_pair() {
        let (a, b) = (acct(1), acct(2));
        let c = curr(9);
        assert_eq!(ripple_state_index(&a, &b, &c), ripple_state_index(&b, &a, &c));
    }

    #[test]
    fn ripple_state_distinguishes_currencies() {
        let (a, b) = (acct(1), acct(2));
        assert_ne!(
            ripple_state_index(&a, &b, &curr(1)),
            ripple_state_index(&a, &b, &curr(2))
        );
        assert_eq!(
            ripple_state_index_native(&a, &b),
            ripple_state_index(&a, &b, &Currency::native())
        );
    }

    // ---- book bases ----

    #[test]
    fn book_base_rejects_two_native_legs() {
        let err = book_base(
            &Currency::native(),
            &AccountId::zero(),
            &Currency::native(),
            &AccountId::zero(),
        )
        .unwrap_err();
        assert_eq!(err, IndexError::BothLegsNative);
    }

    #[test]
    fn book_base_rejects_inconsistent_legs() {
        assert_eq!(
            book_base(&Currency::native(), &acct(1), &curr(2), &acct(2)).unwrap_err(),
            IndexError::NativeLegWithIssuer { leg: "pays" }
        );
        assert_eq!(
            book_base(&curr(1), &acct(1), &curr(2), &AccountId::zero()).unwrap_err(),
            IndexError::IssuedLegWithoutIssuer { leg: "gets" }
        );
        assert_eq!(
            book_base(&curr(1), &acct(1), &curr(1), &acct(1)).unwrap_err(),
            IndexError::IdenticalLegs
        );
    }

    #[test]
    fn book_base_orients_the_pair() {
        // A/B and B/A are different books.
        let ab = book_base(&curr(1), &acct(1), &curr(2), &acct(2)).unwrap();
        let ba = book_base(&curr(2), &acct(2), &curr(1), &acct(1)).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn native_leg_padding_cannot_alias_an_issued_leg() {
        // native/issued vs issued/native with the same issued leg.
        let fwd = book_base(&Currency::native(), &AccountId::zero(), &curr(3), &acct(3)).unwrap();
        let rev = book_base(&curr(3), &acct(3), &Currency::native(), &AccountId::zero()).unwrap();
        assert_ne!(fwd, rev);
    }

    // ---- offers ----

    #[test]
    fn offer_index_varies_with_rate_and_skip() {
        let base = Hash160::from_bytes([5; 20]);
        let a = offer_index(&base, 1_000, 1);
        assert_ne!(a, offer_index(&base, 1_001, 1));
        assert_ne!(a, offer_index(&base, 1_000, 2));
    }

    proptest! {
        #[test]
        fn offer_skip_is_always_in_range(bytes in prop::array::uniform32(any::<u8>())) {
            let skip = offer_skip(&Hash256::from_bytes(bytes));
            prop_assert!((1..=SKIP_RANGE).contains(&skip));
        }

        #[test]
        fn dir_page_round_trips(seed in prop::array::uniform32(any::<u8>()), page in any::<u64>()) {
            let base = Hash256::from_bytes(seed);
            let index = dir_page_index(&base, IndexSpace::Book, page);
            prop_assert_eq!(dir_page(&index), page);
        }

        #[test]
        fn book_bases_separate_native_and_issued_pays_legs(
            c_in in prop::array::uniform20(any::<u8>()),
            a_in in prop::array::uniform20(any::<u8>()),
            c_out in prop::array::uniform20(any::<u8>()),
            a_out in prop::array::uniform20(any::<u8>()),
        ) {
            let mut c_in = c_in;
            let mut a_in = a_in;
            let mut c_out = c_out;
            let mut a_out = a_out;
            // Both legs issued: non-zero currencies and issuers, and the
            // legs forced distinct so neither variant hits a contract error.
            c_in[0] |= 1;
            a_in[0] |= 1;
            c_out[0] |= 1;
            a_out[0] |= 1;
            c_out[1] = c_in[1].wrapping_add(1);
            let c_in = Currency::from_bytes(c_in);
            let a_in = AccountId::from_bytes(a_in);
            let c_out = Currency::from_bytes(c_out);
            let a_out = AccountId::from_bytes(a_out);

            let native =
                book_base(&Currency::native(), &AccountId::zero(), &c_out, &a_out).unwrap();
            let issued = book_base(&c_in, &a_in, &c_out, &a_out).unwrap();
            prop_assert_ne!(native, issued);
        }
    }

    // ---- directories ----

    #[test]
    fn dir_pages_share_a_prefix_and_differ_in_the_tail() {
        let base = Hash256::from_bytes([6; 32]);
        let p0 = dir_page_index(&base, IndexSpace::OwnerDirectory, 0);
        let p1 = dir_page_index(&base, IndexSpace::OwnerDirectory, 1);
        assert_eq!(p0.as_bytes()[..24], p1.as_bytes()[..24]);
        assert!(p0 < p1);
        assert_eq!(dir_page(&p0), 0);
        assert_eq!(dir_page(&p1), 1);
    }

    #[test]
    fn dir_space_changes_the_prefix() {
        let base = Hash256::from_bytes([6; 32]);
        let owner = dir_page_index(&base, IndexSpace::OwnerDirectory, 0);
        let book = dir_page_index(&base, IndexSpace::Book, 0);
        assert_ne!(owner.as_bytes()[..24], book.as_bytes()[..24]);
    }

    #[test]
    fn quality_next_bounds_every_page() {
        let base = Hash256::from_bytes([0xab; 32]);
        let root = dir_page_index(&base, IndexSpace::Book, 0);
        let next = quality_next(&root);
        assert!(dir_page_index(&base, IndexSpace::Book, u64::MAX) < next);
        assert!(root < next);
    }

    #[test]
    fn quality_next_carries_through_saturated_prefix_bytes() {
        let mut bytes = [0u8; 32];
        for b in bytes[..24].iter_mut() {
            *b = 0xff;
        }
        let next = quality_next(&Hash256::from_bytes(bytes));
        assert_eq!(&next.as_bytes()[..24], &[0u8; 24]);
        assert_eq!(&next.as_bytes()[24..], &[0u8; 8]);
    }
}
