//! Depth painting state: pointer, paint button, edit-depth filter

use super::SelectionMap;
use crate::depth::DepthMap;

/// Highest editing level; levels run 0..=MAX_LEVEL
pub const MAX_LEVEL: u8 = 10;

/// Map an editing level to a stored depth.
///
/// Level 0 is literal 0 (no height). Level n > 0 is `255 * n / 10`, never
/// below 1 so it can't be confused with "no height".
pub fn level_to_depth(level: u8) -> u8 {
    let level = level.min(MAX_LEVEL) as u32;
    if level == 0 {
        return 0;
    }
    ((255 * level) / MAX_LEVEL as u32).max(1) as u8
}

/// Editor for the current scene's depth map
#[derive(Debug, Clone)]
pub struct DepthEditor {
    pub selection: SelectionMap,
    /// Pointer position in screen pixels, after the hot-spot offset
    pointer: Option<(i32, i32)>,
    pointer_offset: i32,
    paint_held: bool,
    paint_sticky: bool,
    edit_depth: Option<u8>,
}

impl DepthEditor {
    pub fn new(pointer_offset: i32) -> Self {
        Self {
            selection: SelectionMap::new(0, 0),
            pointer: None,
            pointer_offset,
            paint_held: false,
            paint_sticky: false,
            edit_depth: None,
        }
    }

    /// Clear per-scene state and size the selection for a new scene
    pub fn reset_scene(&mut self, width: usize, height: usize) {
        self.selection.reset(width, height);
    }

    /// Record the raw pointer position (screen pixels)
    pub fn set_pointer(&mut self, x: i32, y: i32) {
        self.pointer = Some((
            (x - self.pointer_offset).max(0),
            (y - self.pointer_offset).max(0),
        ));
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    pub fn pointer(&self) -> Option<(i32, i32)> {
        self.pointer
    }

    /// Paint button state (painting while held)
    pub fn set_paint_held(&mut self, down: bool) {
        self.paint_held = down;
    }

    /// Latch painting on or off regardless of the button
    pub fn toggle_paint(&mut self) -> bool {
        self.paint_sticky = !self.paint_sticky;
        self.paint_sticky
    }

    pub fn is_painting(&self) -> bool {
        self.paint_held || self.paint_sticky
    }

    /// Select the pixel under the pointer if painting is active
    pub fn update(&mut self, xstart: i32) -> bool {
        match self.pointer {
            Some((x, y)) if self.is_painting() => self.paint(x, y, xstart),
            _ => false,
        }
    }

    /// Select the map cell shown at screen position (x, y)
    pub fn paint(&mut self, x: i32, y: i32, xstart: i32) -> bool {
        self.selection.paint(xstart + x, y)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Commit the selection into `depth` at `level`; returns pixels written
    pub fn push_to_depth(&self, level: u8, depth: &mut DepthMap) -> usize {
        let value = level_to_depth(level);
        let written = depth.commit(&self.selection, value);
        log::info!("Pushed {} selected pixels to depth {} (level {})", written, value, level);
        written
    }

    /// Highlight pixels at `level`'s depth. Choosing the active level again,
    /// or `None`, turns the filter off.
    pub fn set_edit_depth(&mut self, level: Option<u8>) -> Option<u8> {
        self.edit_depth = match level.map(level_to_depth) {
            Some(depth) if self.edit_depth != Some(depth) => Some(depth),
            _ => None,
        };
        self.edit_depth
    }

    pub fn edit_depth(&self) -> Option<u8> {
        self.edit_depth
    }
}

impl Default for DepthEditor {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_to_depth() {
        assert_eq!(level_to_depth(0), 0);
        assert_eq!(level_to_depth(1), 25);
        assert_eq!(level_to_depth(5), 127);
        assert_eq!(level_to_depth(9), 229);
        assert_eq!(level_to_depth(10), 255);
        assert_eq!(level_to_depth(200), 255);
    }

    #[test]
    fn test_push_level_five_and_zero() {
        let mut depth = DepthMap::flat(3, 2);
        let mut editor = DepthEditor::default();
        editor.reset_scene(3, 2);
        for y in 0..2 {
            for x in 0..3 {
                editor.selection.paint(x, y);
            }
        }
        assert_eq!(editor.push_to_depth(5, &mut depth), 6);
        assert!(depth.to_vec().iter().all(|&d| d == 127));

        editor.push_to_depth(0, &mut depth);
        assert!(depth.to_vec().iter().all(|&d| d == 0));
    }

    #[test]
    fn test_edit_depth_toggles() {
        let mut editor = DepthEditor::default();
        assert_eq!(editor.set_edit_depth(Some(3)), Some(76));
        assert_eq!(editor.set_edit_depth(Some(4)), Some(102));
        assert_eq!(editor.set_edit_depth(Some(4)), None);
        assert_eq!(editor.set_edit_depth(Some(0)), Some(0));
        assert_eq!(editor.set_edit_depth(None), None);
    }

    #[test]
    fn test_pointer_offset_clamps() {
        let mut editor = DepthEditor::new(2);
        editor.set_pointer(1, 10);
        assert_eq!(editor.pointer(), Some((0, 8)));
    }

    #[test]
    fn test_paint_while_held() {
        let mut editor = DepthEditor::new(0);
        editor.reset_scene(20, 10);
        editor.set_pointer(3, 4);

        assert!(!editor.update(5));
        editor.set_paint_held(true);
        assert!(editor.update(5));
        assert!(editor.selection.is_selected(8, 4));

        editor.set_paint_held(false);
        assert!(editor.toggle_paint());
        editor.set_pointer(0, 0);
        assert!(editor.update(0));
        assert!(editor.selection.is_selected(0, 0));
    }
}
