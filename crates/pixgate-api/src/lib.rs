// pixgate-api: Async Rust client for the Divoom LAN protocol (device + cloud discovery)

pub mod device;
pub mod discovery;
pub mod error;
pub mod transport;
pub mod wire;

pub use device::DeviceClient;
pub use discovery::{DiscoveryClient, DiscoveryRecord};
pub use error::Error;
pub use transport::TransportConfig;
pub use wire::{Ack, WireFrame};
