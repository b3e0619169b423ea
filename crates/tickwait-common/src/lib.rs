#![doc = "Common types shared across the tickwait workspace."]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod strategy;
pub mod time;

#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod metrics;

#[cfg(feature = "std")]
pub use config::*;
pub use error::*;
#[cfg(feature = "std")]
pub use metrics::*;
pub use strategy::*;
pub use time::*;
