//! Tunnel pool interfaces consumed by LeaseSet construction
//!
//! Tunnel building and pool management live elsewhere; a LeaseSet only needs
//! the owning destination and a snapshot of the current inbound tunnels.

use serde::{Deserialize, Serialize};

use crate::identity::LocalDestination;
use crate::types::{IdentHash, TunnelId};

/// An established inbound tunnel, seen from its owner
pub trait InboundTunnel {
    /// Identity hash of the gateway router (the tunnel's first hop)
    fn next_hop_ident_hash(&self) -> IdentHash;

    /// Tunnel ID registered at the gateway
    fn next_tunnel_id(&self) -> TunnelId;

    /// Seconds since the Unix epoch at which the tunnel was built
    fn creation_time(&self) -> u64;
}

pub trait TunnelPool {
    type Destination: LocalDestination;
    type Tunnel: InboundTunnel;

    /// The destination this pool builds tunnels for, if it still exists
    fn local_destination(&self) -> Option<&Self::Destination>;

    /// Up to `max` established inbound tunnels
    fn inbound_tunnels(&self, max: usize) -> Vec<&Self::Tunnel>;
}

/// Plain snapshot of an inbound tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelInfo {
    pub gateway: IdentHash,
    pub tunnel_id: TunnelId,
    pub created_at: u64,
}

impl TunnelInfo {
    pub fn new(gateway: IdentHash, tunnel_id: TunnelId, created_at: u64) -> Self {
        Self {
            gateway,
            tunnel_id,
            created_at,
        }
    }
}

impl InboundTunnel for TunnelInfo {
    fn next_hop_ident_hash(&self) -> IdentHash {
        self.gateway
    }

    fn next_tunnel_id(&self) -> TunnelId {
        self.tunnel_id
    }

    fn creation_time(&self) -> u64 {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_info_accessors() {
        let tunnel = TunnelInfo::new([4u8; 32], 77, 1_700_000_000);
        assert_eq!(tunnel.next_hop_ident_hash(), [4u8; 32]);
        assert_eq!(tunnel.next_tunnel_id(), 77);
        assert_eq!(tunnel.creation_time(), 1_700_000_000);
    }

    #[test]
    fn test_tunnel_info_serde() {
        let tunnel = TunnelInfo::new([1u8; 32], 5, 10);
        let json = serde_json::to_string(&tunnel).unwrap();
        let restored: TunnelInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tunnel);
    }
}
