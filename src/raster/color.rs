//! Indexed palettes and RGB565 true colour

use super::PixelBuffer;

/// Number of entries in an indexed palette
pub const PALETTE_SIZE: usize = 256;

/// Pack 8-bit channels into RGB565 (top 5 bits red, 6 green, 5 blue)
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xf8) << 8) | ((g as u16 & 0xfc) << 3) | (b as u16 >> 3)
}

/// Expand RGB565 back to opaque RGBA8, replicating the high bits into the low ones
#[inline]
pub fn rgb565_to_rgba(c: u16) -> [u8; 4] {
    let r = ((c >> 11) & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = (c & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
}

/// Convert a whole RGB565 buffer into tightly packed RGBA8 bytes
pub fn rgb565_buffer_to_rgba(src: &PixelBuffer<u16>, dst: &mut Vec<u8>) {
    dst.clear();
    dst.reserve(src.width() * src.height() * 4);
    for y in 0..src.height() {
        if let Some(row) = src.row(y) {
            for &c in row {
                dst.extend_from_slice(&rgb565_to_rgba(c));
            }
        }
    }
}

/// 256-entry RGB palette as supplied by the host engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; PALETTE_SIZE],
}

impl Palette {
    /// Identity gray ramp: index == gray level
    pub fn grayscale() -> Self {
        let mut colors = [[0u8; 3]; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = [i as u8; 3];
        }
        Self { colors }
    }

    /// Build from up to 256 colours; missing entries are black
    pub fn from_colors(src: &[[u8; 3]]) -> Self {
        let mut colors = [[0u8; 3]; PALETTE_SIZE];
        for (dst, c) in colors.iter_mut().zip(src) {
            *dst = *c;
        }
        Self { colors }
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.colors[index as usize]
    }

    pub fn set(&mut self, index: u8, rgb: [u8; 3]) {
        self.colors[index as usize] = rgb;
    }

    pub fn colors(&self) -> &[[u8; 3]; PALETTE_SIZE] {
        &self.colors
    }

    /// True if every entry is the gray level equal to its index
    pub fn is_grayscale_identity(&self) -> bool {
        self.colors
            .iter()
            .enumerate()
            .all(|(i, c)| *c == [i as u8; 3])
    }

    /// Fixed 3-3-2 colour cube, used for true-colour images with no palette
    pub fn rgb332() -> Self {
        let mut colors = [[0u8; 3]; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            let r = (i >> 5) & 0x7;
            let g = (i >> 2) & 0x7;
            let b = i & 0x3;
            *c = [(r * 255 / 7) as u8, (g * 255 / 7) as u8, (b * 255 / 3) as u8];
        }
        Self { colors }
    }

    pub fn to_rgb565(&self) -> Palette565 {
        let mut entries = [0u16; PALETTE_SIZE];
        for (dst, c) in entries.iter_mut().zip(self.colors.iter()) {
            *dst = rgb565(c[0], c[1], c[2]);
        }
        Palette565 { entries }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

/// Index of the nearest `Palette::rgb332` entry
#[inline]
pub fn rgb332_index(r: u8, g: u8, b: u8) -> u8 {
    let q = |v: u8, levels: u16| ((v as u16 * levels + 127) / 255) as u8;
    (q(r, 7) << 5) | (q(g, 7) << 2) | q(b, 3)
}

/// True-colour cache of an indexed palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette565 {
    entries: [u16; PALETTE_SIZE],
}

impl Palette565 {
    #[inline]
    pub fn get(&self, index: u8) -> u16 {
        self.entries[index as usize]
    }
}

impl Default for Palette565 {
    fn default() -> Self {
        Self { entries: [0; PALETTE_SIZE] }
    }
}
