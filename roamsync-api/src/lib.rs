#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod command;
pub mod models;

pub use command::*;
pub use models::*;
