//! Rendering modes

use serde::{Deserialize, Serialize};

/// Which composition path runs each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Host presents its own frame untouched
    #[default]
    Off,
    /// One parallax view at 2x
    Basic,
    /// Background copied at 2x, actors drawn by the presenter's hardware
    Gpu,
    /// Left and right parallax views side by side
    Stereo,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Off, Mode::Basic, Mode::Gpu, Mode::Stereo];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Off => "Off",
            Mode::Basic => "Basic",
            Mode::Gpu => "GPU",
            Mode::Stereo => "Stereo",
        }
    }

    /// The mode after `self` in `cycle`. A mode outside the cycle restarts it.
    pub fn next_in(self, cycle: &[Mode]) -> Mode {
        match cycle.iter().position(|&m| m == self) {
            Some(i) => cycle[(i + 1) % cycle.len()],
            None => cycle.first().copied().unwrap_or(Mode::Off),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        let cycle = [Mode::Off, Mode::Basic, Mode::Gpu];
        assert_eq!(Mode::Off.next_in(&cycle), Mode::Basic);
        assert_eq!(Mode::Basic.next_in(&cycle), Mode::Gpu);
        assert_eq!(Mode::Gpu.next_in(&cycle), Mode::Off);
    }

    #[test]
    fn test_mode_outside_cycle() {
        let cycle = [Mode::Off, Mode::Basic];
        assert_eq!(Mode::Stereo.next_in(&cycle), Mode::Off);
        assert_eq!(Mode::Gpu.next_in(&[]), Mode::Off);
    }
}
