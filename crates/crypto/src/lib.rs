//! GateCraft Cryptography
//!
//! Ed25519 primitives for LeaseSet signing and verification.
//!
//! Signing goes through `ed25519-dalek`. Verification runs on this crate's own
//! curve arithmetic: GF(2^255 - 19) field elements, Edwards point
//! representations, and a variable-time double scalar multiplication.

pub mod ed25519;
pub mod edwards;
pub mod field;
mod keys;
mod sign;

pub use ed25519::{verify, VerifyError, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
pub use keys::*;
pub use sign::*;
