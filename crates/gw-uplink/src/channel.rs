//! Uplink channel contract (spec §4.8): `send(bytes) -> () | SendError`.
//!
//! Grounded on `original_source/uplink/interfaces.go`'s `Uplink` interface
//! (`Send`/`Name`/`Type`), generalized to `async_trait` the way every
//! other adapter contract in this workspace is (see
//! `gw-protocols::ProtocolAdapter`).

use async_trait::async_trait;
use gw_errors::Result;

#[async_trait]
pub trait UplinkChannel: Send + Sync {
    async fn send(&self, payload: &[u8]) -> Result<()>;
    fn name(&self) -> &str;
    fn kind(&self) -> &str;
}
