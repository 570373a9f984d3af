//! Pure Rust playback runtime for Spriter (SCML/SCON) skeletal animations.
//!
//! This crate only resolves poses, events and tags. Drawing the resolved components is left
//! to the host.

#![forbid(unsafe_code)]

mod error;
mod math;
mod model;
mod runtime;
mod version;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use math::*;
pub use model::*;
pub use runtime::*;
pub use version::*;

#[cfg(feature = "json")]
pub use json::{LoadOptions, SpriterData};

#[cfg(test)]
mod test_fixtures;
