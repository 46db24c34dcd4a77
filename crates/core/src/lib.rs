//! GateCraft Core
//!
//! LeaseSets and the identity, tunnel, and netDb seams they are built on.

mod config;
mod error;
mod identity;
mod lease_set;
mod netdb;
mod tunnel;
mod types;

pub use config::*;
pub use error::*;
pub use identity::*;
pub use lease_set::*;
pub use netdb::*;
pub use tunnel::*;
pub use types::*;
