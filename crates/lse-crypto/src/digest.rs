use sha2::{Digest, Sha512};

use lse_types::{Hash160, Hash256};

/// SHA-512-half: the first 32 bytes of SHA-512 over `data`.
pub fn sha512_half(data: &[u8]) -> Hash256 {
    let digest = Sha512::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    Hash256::from_bytes(out)
}

/// 160-bit truncation of SHA-512 over `data`.
///
/// Used where the storage format prescribes a short index (offer-book
/// bases). Truncation point is the leading 20 bytes; a format constant.
pub fn sha512_half_160(data: &[u8]) -> Hash160 {
    let digest = Sha512::digest(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    Hash160::from_bytes(out)
}

/// SHA-512-half of a 4-byte domain prefix followed by `data`.
///
/// Ledger headers and other hashed structures are domain-separated by a
/// fixed prefix so that two structures with coincidentally equal encodings
/// cannot share a hash.
pub fn prefixed_sha512_half(prefix: [u8; 4], data: &[u8]) -> Hash256 {
    let mut hasher = Sha512::new();
    hasher.update(prefix);
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    Hash256::from_bytes(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_half_is_deterministic() {
        assert_eq!(sha512_half(b"hello"), sha512_half(b"hello"));
        assert_ne!(sha512_half(b"hello"), sha512_half(b"world"));
    }

    #[test]
    fn sha512_half_is_sha512_prefix() {
        // Independently computed: SHA-512("abc") begins with these bytes.
        let h = sha512_half(b"abc");
        let expected =
            hex::decode("ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a")
                .unwrap();
        assert_eq!(h.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn hash160_is_prefix_of_hash256() {
        let long = sha512_half(b"prefix check");
        let short = sha512_half_160(b"prefix check");
        assert_eq!(&long.as_bytes()[..20], short.as_bytes().as_slice());
    }

    #[test]
    fn prefix_separates_domains() {
        let a = prefixed_sha512_half(*b"LGR\0", b"payload");
        let b = prefixed_sha512_half(*b"TXN\0", b"payload");
        assert_ne!(a, b);
        assert_ne!(a, sha512_half(b"payload"));
    }

    proptest::proptest! {
        #[test]
        fn digests_agree_across_widths(data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256)) {
            let long = sha512_half(&data);
            let short = sha512_half_160(&data);
            proptest::prop_assert_eq!(long, sha512_half(&data));
            proptest::prop_assert_eq!(&long.as_bytes()[..20], short.as_bytes().as_slice());
        }
    }
}
