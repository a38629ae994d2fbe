//! Scripted radio environment for exercising the roaming engine on a host.
//!
//! [`SimEnvironment`] models the access points that are on the air,
//! [`SimRadio`] implements the engine's radio seam against it, and
//! [`FlakyStore`] simulates a broken settings backend.

pub mod environment;
pub mod radio;
pub mod store;

pub use environment::*;
pub use radio::*;
pub use store::*;
