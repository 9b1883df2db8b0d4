//! Digest primitives for the ledger state engine.
//!
//! Every deterministic index and content address in the engine is a
//! SHA-512-half: the leading bytes of a single SHA-512 computation. One
//! SHA-512 round is cheaper than two SHA-256 rounds on 64-bit hardware
//! while keeping the full 256-bit collision margin.
//!
//! All digest operations wrap `sha2` — no custom cryptography.

pub mod digest;
pub mod serializer;

pub use digest::{prefixed_sha512_half, sha512_half, sha512_half_160};
pub use serializer::IndexSerializer;
