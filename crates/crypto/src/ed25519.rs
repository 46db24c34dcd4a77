//! Ed25519 signature verification
//!
//! Verification recomputes R' = h·(-A) + S·B with h = SHA-512(R || A || M)
//! mod ℓ and accepts when R' encodes to the signature's R. The double scalar
//! multiplication is variable-time; signing stays on the constant-time
//! `ed25519-dalek` path (see `keys.rs`).

use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::edwards::{double_scalar_mul_vartime, ExtendedPoint};

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Signature scalar is not canonically encoded")]
    NonCanonicalScalar,
    #[error("Invalid public key encoding")]
    InvalidPublicKey,
    #[error("Signature does not match")]
    Mismatch,
}

/// Verify an Ed25519 signature over `message`.
pub fn verify(
    signature: &[u8; SIGNATURE_LENGTH],
    message: &[u8],
    public_key: &[u8; PUBLIC_KEY_LENGTH],
) -> Result<(), VerifyError> {
    if signature[63] & 0xe0 != 0 {
        return Err(VerifyError::NonCanonicalScalar);
    }

    let minus_a = ExtendedPoint::decompress_negate_vartime(public_key)
        .ok_or(VerifyError::InvalidPublicKey)?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..]);

    let mut hasher = Sha512::new();
    hasher.update(r);
    hasher.update(public_key);
    hasher.update(message);
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    let h = Scalar::from_bytes_mod_order_wide(&wide).to_bytes();

    let r_check = double_scalar_mul_vartime(&h, &minus_a, &s).to_bytes();
    if bool::from(r_check.ct_eq(&r)) {
        Ok(())
    } else {
        Err(VerifyError::Mismatch)
    }
}
