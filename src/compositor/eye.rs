//! Scanline parallax renderer
//!
//! Each background row is walked left to right. Every source pixel lands at
//! `scale * col + shift(depth)`; a rightward jump opens a gap that is filled
//! with the farther of the two neighbouring pixels, and a leftward jump
//! overlaps earlier output, where the nearer pixel wins the depth test.

use serde::{Deserialize, Serialize};

use crate::depth::ParallaxTable;

/// RGB565 colours used by the editing overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerColors {
    /// Pixel under the pointer
    pub pointer: u16,
    /// Selected pixels
    pub selection: u16,
    /// Pixels at the highlighted edit depth
    pub edit_depth: u16,
}

impl Default for MarkerColors {
    fn default() -> Self {
        Self {
            pointer: 0xffff,
            selection: 0xffe0,
            edit_depth: 0x00ff,
        }
    }
}

/// Cosmetic recolouring of one row's pixels. Only applied to a pixel's own
/// write, never to gap fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowOverlay<'a> {
    /// Source column under the pointer on this row
    pub pointer_col: Option<usize>,
    /// Selection cells for this row, indexed by source column
    pub selection: Option<&'a [u8]>,
    pub edit_depth: Option<u8>,
    pub markers: MarkerColors,
}

impl RowOverlay<'_> {
    #[inline]
    fn apply(&self, col: usize, depth: u8, color: u16) -> u16 {
        let mut c = color;
        if self.edit_depth == Some(depth) {
            c = self.markers.edit_depth;
        }
        if self.pointer_col == Some(col) {
            c = self.markers.pointer;
        }
        if self.selection.and_then(|s| s.get(col)).is_some_and(|&s| s != 0) {
            c = self.markers.selection;
        }
        c
    }
}

/// Render one source row into a destination row and its depth row.
///
/// `dst_colors`/`dst_depths` cover one eye's row (`width * scale` wide);
/// `dst_depths` must hold 0 wherever nothing was drawn yet this pass.
/// Writes outside the destination are dropped.
pub fn compose_row(
    colors: &[u16],
    depths: &[u8],
    table: &ParallaxTable,
    scale: usize,
    overlay: &RowOverlay<'_>,
    dst_colors: &mut [u16],
    dst_depths: &mut [u8],
) {
    let width = colors.len().min(depths.len());
    let xmax = dst_colors.len().min(dst_depths.len()) as i32;
    if width == 0 || xmax == 0 || scale == 0 {
        return;
    }
    let scale = scale as i32;

    let mut cprev = colors[0];
    let mut zprev = depths[0];
    let mut plxprev = table.shift(zprev);
    let mut xdst = plxprev;

    // Extend the first pixel over the left edge
    for x in 0..xdst.clamp(0, xmax) as usize {
        dst_colors[x] = cprev;
        dst_depths[x] = zprev;
    }

    for col in 0..width {
        let c = colors[col];
        let z = depths[col];
        let plx = if z != zprev { table.shift(z) } else { plxprev };
        let new_xdst = scale * col as i32 + plx;
        let cc = overlay.apply(col, z, c);

        if xdst < new_xdst {
            // The farther surface shows through the gap
            let (cfill, zfill) = if zprev < z { (cprev, zprev) } else { (c, z) };
            for x in xdst.max(0)..new_xdst.min(xmax) {
                let x = x as usize;
                if zfill > dst_depths[x] {
                    dst_colors[x] = cfill;
                    dst_depths[x] = zfill;
                }
            }
        }

        xdst = new_xdst;
        for _ in 0..scale {
            if (0..xmax).contains(&xdst) {
                let x = xdst as usize;
                if z >= dst_depths[x] {
                    dst_colors[x] = cc;
                    dst_depths[x] = z;
                }
            }
            xdst += 1;
        }

        cprev = c;
        zprev = z;
        plxprev = plx;
    }

    // Extend the last pixel over the right edge, only into empty cells
    for x in xdst.max(0)..xmax {
        let x = x as usize;
        if dst_depths[x] == 0 {
            dst_colors[x] = cprev;
            dst_depths[x] = zprev;
        }
    }
}
