//! Depth (height) maps and the parallax they drive
//!
//! - `DepthMap`: one 8-bit height per background pixel, higher = nearer
//! - `DepthStore`: per-scene 8-bit paletted BMP files
//! - `ParallaxTable`/`ViewAngle`: depth -> horizontal shift for a view angle

mod map;
mod store;
mod parallax;

pub use map::*;
pub use store::*;
pub use parallax::*;
