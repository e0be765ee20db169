//! Selection paint mask and flood-fill growth

use crate::depth::{DepthMap, DEPTH_LEVELS};
use crate::raster::{PixelBuffer, PALETTE_SIZE};

/// The visible window of the background, used to sample on-screen colours
/// for map coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ScreenView<'a> {
    /// Indexed background pixels as currently displayed
    pub screen: &'a PixelBuffer<u8>,
    /// Map column shown at screen column 0
    pub xstart: i32,
}

impl ScreenView<'_> {
    /// Displayed colour index at map coordinates, if that column is on screen
    pub fn color_at(&self, map_x: i32, y: i32) -> Option<u8> {
        self.screen.get(map_x - self.xstart, y)
    }

    pub fn is_on_screen(&self, map_x: i32) -> bool {
        let sx = map_x - self.xstart;
        sx >= 0 && (sx as usize) < self.screen.width()
    }
}

/// What the current selection covers
#[derive(Debug, Clone)]
pub struct SelectionInfo {
    /// Selected map coordinates in scan order
    pub cells: Vec<(i32, i32)>,
    /// On-screen colour indices found under the selection
    pub colors_used: [bool; PALETTE_SIZE],
    /// Depth values found under the selection
    pub depths_used: [bool; DEPTH_LEVELS],
}

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Per-pixel selection mask, same size as the scene's depth map
#[derive(Debug, Clone)]
pub struct SelectionMap {
    cells: PixelBuffer<u8>,
}

impl SelectionMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self { cells: PixelBuffer::new(width, height) }
    }

    /// Resize for a new scene and clear it. The allocation only grows.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.cells.resize(width, height);
        self.clear();
    }

    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.cells.row(y)
    }

    pub fn is_selected(&self, x: i32, y: i32) -> bool {
        self.cells.get(x, y).is_some_and(|s| s != 0)
    }

    /// Select one cell; false if it is outside the map
    pub fn paint(&mut self, x: i32, y: i32) -> bool {
        self.cells.set(x, y, 1)
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn count(&self) -> usize {
        self.cells.to_vec().iter().filter(|&&s| s != 0).count()
    }

    /// Scan the whole mask once and record what it covers
    pub fn gather(&self, depth: Option<&DepthMap>, view: &ScreenView<'_>) -> SelectionInfo {
        let mut info = SelectionInfo {
            cells: Vec::new(),
            colors_used: [false; PALETTE_SIZE],
            depths_used: [false; DEPTH_LEVELS],
        };
        for y in 0..self.height() {
            let Some(row) = self.cells.row(y) else { continue };
            for (x, &s) in row.iter().enumerate() {
                if s == 0 {
                    continue;
                }
                let (x, y) = (x as i32, y as i32);
                info.cells.push((x, y));
                if let Some(d) = depth.and_then(|d| d.depth_at(x, y)) {
                    info.depths_used[d as usize] = true;
                }
                if let Some(c) = view.color_at(x, y) {
                    info.colors_used[c as usize] = true;
                }
            }
        }
        info
    }

    /// Grow the selection into 8-connected neighbours whose on-screen colour
    /// already occurs under the selection. Only on-screen cells take part.
    /// Returns the number of cells added.
    pub fn expand_by_color(&mut self, depth: Option<&DepthMap>, view: &ScreenView<'_>) -> usize {
        let info = self.gather(depth, view);
        let colors = info.colors_used;
        self.flood(
            info.cells,
            |x, _| view.is_on_screen(x),
            |x, y| view.color_at(x, y).is_some_and(|c| colors[c as usize]),
        )
    }

    /// Grow the selection into 8-connected neighbours whose depth already
    /// occurs under the selection. Returns the number of cells added.
    pub fn expand_by_depth(&mut self, depth: &DepthMap, view: &ScreenView<'_>) -> usize {
        let info = self.gather(Some(depth), view);
        let depths = info.depths_used;
        self.flood(
            info.cells,
            |_, _| true,
            |x, y| depth.depth_at(x, y).is_some_and(|d| depths[d as usize]),
        )
    }

    /// Worklist flood. A cell is queued at most once: it is marked selected
    /// at the moment it is admitted.
    fn flood(
        &mut self,
        mut work: Vec<(i32, i32)>,
        spreads: impl Fn(i32, i32) -> bool,
        admits: impl Fn(i32, i32) -> bool,
    ) -> usize {
        let mut added = 0;
        let mut next = 0;
        while next < work.len() {
            let (sx, sy) = work[next];
            next += 1;
            if !spreads(sx, sy) {
                continue;
            }
            for (dx, dy) in NEIGHBORS {
                let (px, py) = (sx + dx, sy + dy);
                match self.cells.get(px, py) {
                    Some(0) if admits(px, py) => {
                        self.cells.set(px, py, 1);
                        work.push((px, py));
                        added += 1;
                    }
                    _ => {}
                }
            }
        }
        added
    }
}
