//! Destination identities
//!
//! The LeaseSet codec only sees identities through the [`Identity`] trait.
//! [`DestinationIdentity`] is the Ed25519 destination format:
//!
//! ```text
//! [encryption public key: 256]
//! [signing key field: 128 = 96 padding + 32-byte Ed25519 key]
//! [certificate: type 5 (1) | length 4 (2) | signing type 7 (2) | crypto type 0 (2)]
//! ```

use bytes::{Buf, BufMut, BytesMut};
use gatecraft_crypto::{hash, verify_signature, SigningKeypair};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::error::IdentityError;
use crate::types::{EncryptionKey, IdentHash, PublicKey, ENCRYPTION_KEY_LEN};

/// Public identity of a destination or router
pub trait Identity: Sized {
    /// Parse an identity prefix from `buf`, returning it and the bytes consumed
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), IdentityError>;

    fn to_bytes(&self) -> Vec<u8>;

    /// Length of the signing-key region a LeaseSet reserves after the encryption key
    fn signing_key_length(&self) -> usize;

    fn signature_length(&self) -> usize;

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;

    /// SHA-256 of the encoded identity
    fn ident_hash(&self) -> IdentHash {
        hash(&self.to_bytes())
    }
}

/// A local destination that can sign what it publishes
pub trait LocalDestination {
    type Identity: Identity;

    fn identity(&self) -> &Self::Identity;

    fn encryption_public_key(&self) -> &EncryptionKey;

    /// Signature of `identity().signature_length()` bytes
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

const SIGNING_KEY_FIELD_LEN: usize = 128;
const ED25519_KEY_LEN: usize = 32;
/// Length of the padding in front of an Ed25519 key in the signing key field
pub const SIGNING_KEY_PADDING_LEN: usize = SIGNING_KEY_FIELD_LEN - ED25519_KEY_LEN;
const CERTIFICATE_HEADER_LEN: usize = 3;
const KEY_CERTIFICATE_PAYLOAD_LEN: u16 = 4;

const CERTIFICATE_TYPE_KEY: u8 = 5;
const SIGNING_KEY_TYPE_ED25519: u16 = 7;
const CRYPTO_KEY_TYPE_ELGAMAL: u16 = 0;

/// Encoded length of a [`DestinationIdentity`]
pub const DESTINATION_IDENTITY_LEN: usize = ENCRYPTION_KEY_LEN
    + SIGNING_KEY_FIELD_LEN
    + CERTIFICATE_HEADER_LEN
    + KEY_CERTIFICATE_PAYLOAD_LEN as usize;

/// Ed25519 destination identity with a key certificate
///
/// The padding in front of the signing key is kept as received, so
/// [`Identity::to_bytes`] reproduces the exact encoding and the identity hash
/// matches the one other routers compute.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationIdentity {
    #[serde(with = "BigArray")]
    encryption_key: EncryptionKey,
    #[serde(with = "BigArray")]
    padding: [u8; SIGNING_KEY_PADDING_LEN],
    signing_key: PublicKey,
}

impl std::fmt::Debug for DestinationIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationIdentity")
            .field("signing_key", &hex::encode(self.signing_key))
            .finish_non_exhaustive()
    }
}

impl DestinationIdentity {
    /// Identity with zeroed signing-key padding
    pub fn new(encryption_key: EncryptionKey, signing_key: PublicKey) -> Self {
        Self::with_padding(encryption_key, [0u8; SIGNING_KEY_PADDING_LEN], signing_key)
    }

    pub fn with_padding(
        encryption_key: EncryptionKey,
        padding: [u8; SIGNING_KEY_PADDING_LEN],
        signing_key: PublicKey,
    ) -> Self {
        Self {
            encryption_key,
            padding,
            signing_key,
        }
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption_key
    }

    pub fn signing_key(&self) -> &PublicKey {
        &self.signing_key
    }

    /// Bytes preceding the Ed25519 key in the 128-byte signing key field
    pub fn padding(&self) -> &[u8; SIGNING_KEY_PADDING_LEN] {
        &self.padding
    }
}

impl Identity for DestinationIdentity {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), IdentityError> {
        let truncated = |needed| IdentityError::Truncated {
            needed,
            available: buf.len(),
        };
        if buf.len() < ENCRYPTION_KEY_LEN + SIGNING_KEY_FIELD_LEN + CERTIFICATE_HEADER_LEN {
            return Err(truncated(
                ENCRYPTION_KEY_LEN + SIGNING_KEY_FIELD_LEN + CERTIFICATE_HEADER_LEN,
            ));
        }

        let mut cursor = buf;
        let mut encryption_key = [0u8; ENCRYPTION_KEY_LEN];
        cursor.copy_to_slice(&mut encryption_key);

        // Ed25519 keys are right-aligned in the 128-byte field
        let mut padding = [0u8; SIGNING_KEY_PADDING_LEN];
        cursor.copy_to_slice(&mut padding);
        let mut signing_key = [0u8; ED25519_KEY_LEN];
        cursor.copy_to_slice(&mut signing_key);

        let cert_type = cursor.get_u8();
        if cert_type != CERTIFICATE_TYPE_KEY {
            return Err(IdentityError::UnsupportedCertificate(cert_type));
        }
        let cert_len = cursor.get_u16();
        if cert_len != KEY_CERTIFICATE_PAYLOAD_LEN {
            return Err(IdentityError::InvalidCertificateLength(cert_len));
        }
        if cursor.remaining() < KEY_CERTIFICATE_PAYLOAD_LEN as usize {
            return Err(truncated(DESTINATION_IDENTITY_LEN));
        }
        let signing_type = cursor.get_u16();
        if signing_type != SIGNING_KEY_TYPE_ED25519 {
            return Err(IdentityError::UnsupportedSigningKey(signing_type));
        }
        let crypto_type = cursor.get_u16();
        if crypto_type != CRYPTO_KEY_TYPE_ELGAMAL {
            return Err(IdentityError::UnsupportedCryptoKey(crypto_type));
        }

        Ok((
            Self::with_padding(encryption_key, padding, signing_key),
            DESTINATION_IDENTITY_LEN,
        ))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = BytesMut::with_capacity(DESTINATION_IDENTITY_LEN);
        out.put_slice(&self.encryption_key);
        out.put_slice(&self.padding);
        out.put_slice(&self.signing_key);
        out.put_u8(CERTIFICATE_TYPE_KEY);
        out.put_u16(KEY_CERTIFICATE_PAYLOAD_LEN);
        out.put_u16(SIGNING_KEY_TYPE_ED25519);
        out.put_u16(CRYPTO_KEY_TYPE_ELGAMAL);
        out.to_vec()
    }

    fn signing_key_length(&self) -> usize {
        ED25519_KEY_LEN
    }

    fn signature_length(&self) -> usize {
        gatecraft_crypto::SIGNATURE_LENGTH
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(&self.signing_key, message, signature)
    }
}

/// Key material of a locally hosted destination
#[derive(Debug, Clone)]
pub struct LocalKeys {
    identity: DestinationIdentity,
    signing: SigningKeypair,
}

impl LocalKeys {
    /// Fresh destination with a random signing key.
    ///
    /// The encryption key is opaque to this crate; a random placeholder is
    /// used until the caller supplies a real one via [`LocalKeys::from_parts`].
    pub fn generate() -> Self {
        let mut encryption_key = [0u8; ENCRYPTION_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut encryption_key);
        Self::from_parts(SigningKeypair::generate(), encryption_key)
    }

    pub fn from_parts(signing: SigningKeypair, encryption_key: EncryptionKey) -> Self {
        let identity = DestinationIdentity::new(encryption_key, signing.public_key_bytes());
        Self { identity, signing }
    }

    pub fn ident_hash(&self) -> IdentHash {
        self.identity.ident_hash()
    }
}

impl LocalDestination for LocalKeys {
    type Identity = DestinationIdentity;

    fn identity(&self) -> &DestinationIdentity {
        &self.identity
    }

    fn encryption_public_key(&self) -> &EncryptionKey {
        self.identity.encryption_key()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing.sign(message).to_vec()
    }
}
