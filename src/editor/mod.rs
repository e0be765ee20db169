//! Depth editor
//!
//! Paint a selection over the background, grow it by colour or depth,
//! then push it into the depth map at one of ten levels.

mod selection;
mod state;
mod command;

pub use selection::*;
pub use state::*;
pub use command::*;
