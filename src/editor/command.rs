//! Single-character command dispatch

/// Commands the interactive surface can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SaveDepth,
    LoadDepth,
    CycleMode,
    ToggleStereo,
    ClearSelection,
    ExpandByColor,
    ExpandByDepth,
    /// Commit the selection at an editing level (0-9)
    PushDepth(u8),
    /// Highlight an editing level, or clear the highlight with `None`
    EditDepth(Option<u8>),
    TogglePaint,
}

/// Shifted digit row, index = level
const EDIT_DEPTH_KEYS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

impl Command {
    pub fn from_key(key: char) -> Option<Command> {
        let cmd = match key {
            's' => Command::SaveDepth,
            'l' => Command::LoadDepth,
            '\\' => Command::CycleMode,
            '|' => Command::ToggleStereo,
            'x' => Command::ClearSelection,
            'c' => Command::ExpandByColor,
            'd' => Command::ExpandByDepth,
            'p' => Command::TogglePaint,
            '~' => Command::EditDepth(None),
            '0'..='9' => Command::PushDepth(key as u8 - b'0'),
            _ => {
                let level = EDIT_DEPTH_KEYS.iter().position(|&k| k == key)?;
                Command::EditDepth(Some(level as u8))
            }
        };
        Some(cmd)
    }
}
