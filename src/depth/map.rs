//! In-memory depth map

use crate::editor::SelectionMap;
use crate::raster::{Palette, PixelBuffer};

/// Depth 0: nothing rendered here / no height. Never produced by loading.
pub const NO_HEIGHT: u8 = 0;
/// Depth of a freshly synthesized map ("flat ground")
pub const FLAT_DEPTH: u8 = 1;

/// Per-pixel height for the current scene
#[derive(Debug, Clone)]
pub struct DepthMap {
    pixels: PixelBuffer<u8>,
}

impl DepthMap {
    /// A map where every pixel is flat ground
    pub fn flat(width: usize, height: usize) -> Self {
        Self {
            pixels: PixelBuffer::filled(width, height, FLAT_DEPTH),
        }
    }

    /// Wrap raw depth values (row-major, `width * height` long)
    pub fn from_depths(width: usize, height: usize, depths: Vec<u8>) -> Option<Self> {
        PixelBuffer::from_vec(width, height, depths).map(|pixels| Self { pixels })
    }

    /// Reinterpret an indexed image as heights: each index reads its palette
    /// entry's red channel. Zero heights become `FLAT_DEPTH` unless
    /// `keep_zero` is set.
    pub fn from_indexed(
        width: usize,
        height: usize,
        indices: &[u8],
        palette: &Palette,
        keep_zero: bool,
    ) -> Option<Self> {
        if indices.len() != width * height {
            return None;
        }
        let depths = indices
            .iter()
            .map(|&i| match palette.color(i)[0] {
                0 if !keep_zero => FLAT_DEPTH,
                h => h,
            })
            .collect();
        Self::from_depths(width, height, depths)
    }

    /// The palette used to inspect a depth map as an image
    pub fn viewing_palette() -> Palette {
        Palette::grayscale()
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn depth_at(&self, x: i32, y: i32) -> Option<u8> {
        self.pixels.get(x, y)
    }

    pub fn set_depth(&mut self, x: i32, y: i32, depth: u8) -> bool {
        self.pixels.set(x, y, depth)
    }

    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.pixels.row(y)
    }

    pub fn fill(&mut self, depth: u8) {
        self.pixels.fill(depth);
    }

    /// Overwrite every selected pixel with `depth`; returns the number of pixels written
    pub fn commit(&mut self, selection: &SelectionMap, depth: u8) -> usize {
        let mut count = 0;
        let h = self.height().min(selection.height());
        let w = self.width().min(selection.width());
        for y in 0..h {
            let (Some(sel), Some(dst)) = (selection.row(y), self.pixels.row_mut(y)) else {
                continue;
            };
            for (d, &s) in dst[..w].iter_mut().zip(&sel[..w]) {
                if s != 0 {
                    *d = depth;
                    count += 1;
                }
            }
        }
        count
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.pixels.to_vec()
    }
}
