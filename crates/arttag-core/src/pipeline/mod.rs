//! Input stages ahead of the scorer.
//!
//! - **decode**: Load and decode images from files or upload buffers

pub mod decode;

pub use decode::{format_to_string, DecodedImage, ImageDecoder};
