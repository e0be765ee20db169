//! Shadowbox: depth compositor for 2D pixel scenes
//!
//! Gives flat indexed backgrounds a sense of depth:
//! - A per-pixel height map for each scene, painted with a selection tool
//! - Horizontal parallax driven by a view angle
//! - Side-by-side stereo output
//! - Actors lifted into per-actor foils and redrawn at the depth of the
//!   ground they stand on
//!
//! The host engine owns the game; it hands `ShadowBox` its indexed screen,
//! palette and actor draws, and presents whatever `compose` returns.

pub mod compositor;
pub mod config;
pub mod depth;
pub mod editor;
pub mod mode;
pub mod raster;
pub mod shadowbox;

pub use config::{load_config, load_config_from_str, save_config, ConfigError, ShadowboxConfig};
pub use mode::Mode;
pub use shadowbox::{Frame, HostRequests, OutputRect, Presentation, ShadowBox};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
