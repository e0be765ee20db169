//! Pixel surfaces for the compositor
//!
//! Every surface in the system (indexed screens, depth and selection maps,
//! the RGB565 output and its z buffer, actor foils) is a `PixelBuffer`.
//! Row pitch stays internal; callers only see bounds-checked accessors.

mod buffer;
mod color;

pub use buffer::*;
pub use color::*;
