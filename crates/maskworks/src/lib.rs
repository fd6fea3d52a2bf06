//! Umbrella crate for the `maskworks` workspace.
//!
//! Re-exports the buffer primitives of `mw-core` and the distance field
//! generator of `mw-sdf`.

pub use mw_core::*;
pub use mw_sdf::*;
