//! Foundational primitives for mask distance fields.
//!
//! ## Layout
//! All buffers are row-major with the row stride equal to the width. An
//! [`Image`] holds one value per pixel; a [`ColorImage`] holds `channels`
//! interleaved `f32` values per pixel, so RGBA pixel `i` occupies
//! `data[i * 4..i * 4 + 4]` with alpha at index [`ALPHA_CHANNEL`].
//!
//! ## Neighbor Access
//! Neighbor lookups go through [`Image::offset_index`], which returns `None`
//! when an offset leaves the grid instead of wrapping or clamping.

mod error;
mod geom;
mod image;

pub use error::Error;
pub use geom::Vec2f;
pub use image::{ALPHA_CHANNEL, ColorImage, Image, RGBA_CHANNELS};
