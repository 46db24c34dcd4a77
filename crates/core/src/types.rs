use std::time::{SystemTime, UNIX_EPOCH};

/// 32-byte SHA-256 hash of an encoded identity (router or destination)
pub type IdentHash = [u8; 32];

/// Tunnel ID registered with a gateway
pub type TunnelId = u32;

/// Length of the ElGamal encryption public key carried in identities and LeaseSets
pub const ENCRYPTION_KEY_LEN: usize = 256;

/// 256-byte encryption public key
pub type EncryptionKey = [u8; ENCRYPTION_KEY_LEN];

/// 32-byte Ed25519 public key
pub type PublicKey = [u8; 32];

/// Wall-clock milliseconds since the Unix epoch
pub fn milliseconds_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
