//! Signed distance fields from anti-aliased alpha masks.
//!
//! [`DistanceField`] runs an eight-point sequential Euclidean distance
//! transform (8SSEDT) that treats fractional alpha as sub-pixel edge
//! coverage. [`SdfGenerator`] runs it once into the mask and once away from
//! it, normalizes both, and composites the result into an RGBA buffer.
//!
//! Coordinates follow the pixel-center convention and buffers are row-major.
//! Everything is single-threaded and allocates its scratch state per call.

pub mod distance_field;
pub mod edge_delta;
mod error;
pub mod generator;

pub use distance_field::{DistanceField, FieldSample};
pub use edge_delta::approximate_edge_delta;
pub use error::{SdfError, SdfResult, Shape};
pub use generator::{FillMode, GeneratorConfig, SdfGenerator};
