// ── pixgate-core ──
//
// The device resolution and command-dispatch engine. Consumers (the
// HTTP layer, tests) talk to a `Gateway`: it resolves a target device
// from the registry, validates and encodes the command, sends it over
// the LAN protocol, and normalizes the result. Raw transport errors
// never cross this crate's boundary.

pub mod classifier;
pub mod codec;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod registry;

pub use classifier::{DiscoverySource, normalize_name};
pub use command::Command;
pub use dispatcher::{CommandOutcome, Gateway, TargetRef};
pub use error::{CoreError, StatusClass};
pub use model::{DeviceEntry, DeviceFamily, DeviceProfile, FamilyHint};
pub use registry::{DeviceHandle, DeviceRegistry};
