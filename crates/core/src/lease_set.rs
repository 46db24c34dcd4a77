//! Lease sets for inbound tunnel routing
//!
//! A LeaseSet is what a destination publishes so others can reach it: its
//! identity, encryption key, and the gateways of its current inbound tunnels.
//! Each Lease points to a gateway router with a tunnel_id and an end date.
//!
//! Wire format (big-endian):
//!
//! ```text
//! [identity]
//! [encryption key: 256]
//! [signing key placeholder: identity.signing_key_length(), ignored]
//! [lease count: 1]
//! lease count × [gateway: 32][tunnel id: 4][end date ms: 8]
//! [signature: identity.signature_length()]
//! ```
//!
//! The raw buffer is the source of truth. Locally built LeaseSets are encoded,
//! signed, and then decoded again, so both directions share one parser.

use std::cmp::Ordering;

use bytes::{Buf, BufMut, BytesMut};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::LeaseSetConfig;
use crate::error::{LeaseSetError, Result};
use crate::identity::{DestinationIdentity, Identity, LocalDestination};
use crate::netdb::NetDb;
use crate::tunnel::{InboundTunnel, TunnelPool};
use crate::types::{
    milliseconds_since_epoch, EncryptionKey, IdentHash, TunnelId, ENCRYPTION_KEY_LEN,
};

/// Encoded size of a single lease
pub const LEASE_LEN: usize = 32 + 4 + 8;

/// A single gateway lease entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lease {
    /// Identity hash of the gateway router
    pub tunnel_gateway: IdentHash,
    /// Tunnel ID registered with the gateway
    pub tunnel_id: TunnelId,
    /// Milliseconds since the Unix epoch when this lease expires
    pub end_date: u64,
}

impl Lease {
    pub fn new(tunnel_gateway: IdentHash, tunnel_id: TunnelId, end_date: u64) -> Self {
        Self {
            tunnel_gateway,
            tunnel_id,
            end_date,
        }
    }

    pub fn is_expired_at(&self, ts: u64) -> bool {
        ts >= self.end_date
    }

    fn read(cursor: &mut &[u8]) -> Result<Self> {
        ensure(cursor, LEASE_LEN, "lease")?;
        let mut tunnel_gateway = [0u8; 32];
        cursor.copy_to_slice(&mut tunnel_gateway);
        let tunnel_id = cursor.get_u32();
        let end_date = cursor.get_u64();
        Ok(Self::new(tunnel_gateway, tunnel_id, end_date))
    }

    fn write(&self, out: &mut BytesMut) {
        out.put_slice(&self.tunnel_gateway);
        out.put_u32(self.tunnel_id);
        out.put_u64(self.end_date);
    }
}

/// Latest-expiring first is `max()`; ties fall back to gateway then tunnel id
impl Ord for Lease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.end_date
            .cmp(&other.end_date)
            .then_with(|| self.tunnel_gateway.cmp(&other.tunnel_gateway))
            .then_with(|| self.tunnel_id.cmp(&other.tunnel_id))
    }
}

impl PartialOrd for Lease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn ensure(cursor: &[u8], needed: usize, field: &'static str) -> Result<()> {
    if cursor.len() < needed {
        return Err(LeaseSetError::Truncated {
            field,
            needed,
            available: cursor.len(),
        });
    }
    Ok(())
}

fn take<'a>(cursor: &mut &'a [u8], len: usize, field: &'static str) -> Result<&'a [u8]> {
    ensure(cursor, len, field)?;
    let (head, rest) = cursor.split_at(len);
    *cursor = rest;
    Ok(head)
}

/// Signed set of leases for one destination
///
/// Invalid LeaseSets are kept as values so their fields can still be
/// inspected, but must never be used for routing.
#[derive(Debug, Clone)]
pub struct LeaseSet<I: Identity = DestinationIdentity> {
    identity: Option<I>,
    encryption_key: EncryptionKey,
    leases: Vec<Lease>,
    buffer: Vec<u8>,
    is_valid: bool,
    decode_error: Option<LeaseSetError>,
    expiration_threshold_ms: u64,
}

impl<I: Identity> LeaseSet<I> {
    fn empty(buffer: Vec<u8>, config: &LeaseSetConfig) -> Self {
        Self {
            identity: None,
            encryption_key: [0u8; ENCRYPTION_KEY_LEN],
            leases: Vec::new(),
            buffer,
            is_valid: true,
            decode_error: None,
            expiration_threshold_ms: config.expiration_threshold_ms(),
        }
    }

    /// Decode a received LeaseSet. Never fails; check [`LeaseSet::is_valid`].
    pub fn from_bytes<N: NetDb>(buf: &[u8], netdb: &N) -> Self {
        Self::from_bytes_with_config(buf, netdb, &LeaseSetConfig::default())
    }

    pub fn from_bytes_with_config<N: NetDb>(
        buf: &[u8],
        netdb: &N,
        config: &LeaseSetConfig,
    ) -> Self {
        let mut lease_set = Self::empty(buf.to_vec(), config);
        lease_set.read_from_buffer(netdb);
        lease_set
    }

    /// Build, sign, and re-parse a LeaseSet for the pool's local destination
    pub fn from_pool<P, N>(pool: &P, netdb: &N, config: &LeaseSetConfig) -> Self
    where
        P: TunnelPool,
        P::Destination: LocalDestination<Identity = I>,
        N: NetDb,
    {
        let mut lease_set = Self::empty(Vec::new(), config);

        let Some(local) = pool.local_destination() else {
            error!("LeaseSet: destination for local LeaseSet doesn't exist");
            lease_set.mark_invalid(LeaseSetError::MissingDestination);
            return lease_set;
        };

        match Self::encode_local(local, pool, config) {
            Ok(buffer) => {
                lease_set.buffer = buffer;
                lease_set.read_from_buffer(netdb);
            }
            Err(err) => {
                error!("LeaseSet: failed to build local LeaseSet: {}", err);
                lease_set.mark_invalid(err);
            }
        }
        lease_set
    }

    fn encode_local<P>(local: &P::Destination, pool: &P, config: &LeaseSetConfig) -> Result<Vec<u8>>
    where
        P: TunnelPool,
    {
        let identity = local.identity();
        let mut tunnels = pool.inbound_tunnels(config.max_leases);
        tunnels.truncate(config.max_leases.min(u8::MAX as usize));

        let mut out = BytesMut::with_capacity(config.max_buffer_size);
        out.put_slice(&identity.to_bytes());
        out.put_slice(local.encryption_public_key());
        out.put_bytes(0, identity.signing_key_length());
        out.put_u8(tunnels.len() as u8);

        let mut rng = rand::thread_rng();
        for tunnel in &tunnels {
            let end_date = config
                .lease_end_date_ms(tunnel.creation_time())
                .saturating_add(rng.gen_range(0..=config.max_jitter_ms));
            Lease::new(tunnel.next_hop_ident_hash(), tunnel.next_tunnel_id(), end_date)
                .write(&mut out);
        }

        let signature = local.sign(&out);
        out.put_slice(&signature);

        if out.len() > config.max_buffer_size {
            return Err(LeaseSetError::BufferOverflow {
                len: out.len(),
                max: config.max_buffer_size,
            });
        }

        debug!("LeaseSet: local LeaseSet of {} leases created", tunnels.len());
        Ok(out.to_vec())
    }

    /// Replace the buffer and re-derive everything from it
    pub fn update<N: NetDb>(&mut self, buf: &[u8], netdb: &N) {
        self.buffer = buf.to_vec();
        self.read_from_buffer(netdb);
    }

    fn mark_invalid(&mut self, err: LeaseSetError) {
        self.is_valid = false;
        self.decode_error = Some(err);
    }

    fn read_from_buffer<N: NetDb>(&mut self, netdb: &N) {
        self.identity = None;
        self.encryption_key = [0u8; ENCRYPTION_KEY_LEN];
        self.leases.clear();
        self.is_valid = true;
        self.decode_error = None;

        if let Err(err) = self.parse(netdb) {
            warn!("LeaseSet: {}", err);
            self.mark_invalid(err);
        }
    }

    fn parse<N: NetDb>(&mut self, netdb: &N) -> Result<()> {
        let mut cursor: &[u8] = &self.buffer;

        let (identity, consumed) = I::from_bytes(cursor)?;
        take(&mut cursor, consumed, "identity")?;
        let identity = self.identity.insert(identity);

        let key = take(&mut cursor, ENCRYPTION_KEY_LEN, "encryption key")?;
        self.encryption_key.copy_from_slice(key);

        // unused signing key
        take(&mut cursor, identity.signing_key_length(), "signing key")?;

        ensure(cursor, 1, "lease count")?;
        let num = cursor.get_u8();
        debug!("LeaseSet: num={}", num);

        self.leases.reserve(num as usize);
        for _ in 0..num {
            let lease = Lease::read(&mut cursor)?;
            self.leases.push(lease);
            if netdb.find_router(&lease.tunnel_gateway).is_none() {
                debug!("LeaseSet: lease's tunnel gateway not found, requesting");
                netdb.request_destination(&lease.tunnel_gateway);
            }
        }

        let signed_len = self.buffer.len() - cursor.len();
        let signature = take(&mut cursor, identity.signature_length(), "signature")?;
        if !cursor.is_empty() {
            debug!("LeaseSet: ignoring {} trailing bytes", cursor.len());
        }

        if !identity.verify(&self.buffer[..signed_len], signature) {
            return Err(LeaseSetError::SignatureMismatch);
        }
        if num == 0 {
            return Err(LeaseSetError::NoLeases);
        }
        Ok(())
    }

    /// Leases still usable at the current time.
    ///
    /// With `with_threshold` every lease before its end date is returned;
    /// without it, leases within the expiration threshold of their end date
    /// are dropped as well.
    pub fn non_expired_leases(&self, with_threshold: bool) -> Vec<Lease> {
        self.non_expired_leases_at(milliseconds_since_epoch(), with_threshold)
    }

    pub fn non_expired_leases_at(&self, ts: u64, with_threshold: bool) -> Vec<Lease> {
        let threshold = if with_threshold {
            0
        } else {
            self.expiration_threshold_ms
        };
        self.leases
            .iter()
            .filter(|lease| ts < lease.end_date.saturating_sub(threshold))
            .copied()
            .collect()
    }

    pub fn has_expired_leases(&self) -> bool {
        self.has_expired_leases_at(milliseconds_since_epoch())
    }

    pub fn has_expired_leases_at(&self, ts: u64) -> bool {
        self.leases.iter().any(|lease| lease.is_expired_at(ts))
    }

    pub fn has_non_expired_leases(&self) -> bool {
        self.has_non_expired_leases_at(milliseconds_since_epoch())
    }

    pub fn has_non_expired_leases_at(&self, ts: u64) -> bool {
        self.leases.iter().any(|lease| !lease.is_expired_at(ts))
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Why the last decode or build marked this LeaseSet invalid
    pub fn decode_error(&self) -> Option<&LeaseSetError> {
        self.decode_error.as_ref()
    }

    pub fn identity(&self) -> Option<&I> {
        self.identity.as_ref()
    }

    /// netDb key of the destination, when the identity decoded
    pub fn ident_hash(&self) -> Option<IdentHash> {
        self.identity.as_ref().map(Identity::ident_hash)
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption_key
    }

    pub fn leases(&self) -> &[Lease] {
        &self.leases
    }

    /// The exact bytes this LeaseSet was decoded from
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_destination(&self) -> bool {
        true
    }
}
