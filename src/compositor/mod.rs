//! Depth compositor
//!
//! - `eye`: the scanline parallax renderer for one background row
//! - `foil`: per-actor sprite cache lifted off the host's canvas
//! - `render`: whole-frame passes (eyes, foil blits, hardware sprite quads)

mod eye;
mod foil;
mod render;

pub use eye::*;
pub use foil::*;
pub use render::*;
