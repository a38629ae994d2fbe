#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod catalog;
pub mod error;
pub mod manager;
pub mod radio;
pub mod scan;
pub mod settings;
pub mod storage;

pub use catalog::*;
pub use error::*;
pub use manager::*;
pub use radio::*;
pub use scan::*;
pub use settings::*;
pub use storage::*;
