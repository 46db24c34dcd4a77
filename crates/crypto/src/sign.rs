use crate::ed25519;

/// Verify a signature
///
/// Slices of the wrong length are rejected rather than padded, so callers
/// can hand over raw buffer regions.
pub fn verify_signature(pubkey: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let Ok(pubkey) = <&[u8; ed25519::PUBLIC_KEY_LENGTH]>::try_from(pubkey) else {
        return false;
    };
    let Ok(signature) = <&[u8; ed25519::SIGNATURE_LENGTH]>::try_from(signature) else {
        return false;
    };

    ed25519::verify(signature, data, pubkey).is_ok()
}
