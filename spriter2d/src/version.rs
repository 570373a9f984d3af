//! Supported SCON export version.

/// SCON major version understood by the loader.
pub const SCON_VERSION_MAJOR: u32 = 1;

/// SCON minor version the runtime was written against.
pub const SCON_VERSION_MINOR: u32 = 0;
