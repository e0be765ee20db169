//! Per-actor sprite foils
//!
//! When the host finishes drawing an actor into the shared canvas, the
//! actor's pixels are lifted off the canvas into its own foil so the canvas
//! goes back to background only. Foils are drawn again at compose time with
//! the parallax of the ground they stand on.

use crate::raster::{rgb565_to_rgba, Palette, Palette565, PixelBuffer};

/// Host actor identifier (dense, small)
pub type ActorId = usize;

/// Default number of actor slots
pub const DEFAULT_MAX_ACTORS: usize = 256;

/// Where the host drew an actor on the canvas, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorPlacement {
    /// Horizontal centre
    pub center_x: i32,
    pub top: i32,
    /// Exclusive bottom edge (the actor's feet)
    pub bottom: i32,
    pub width: i32,
}

/// Cached sprite image of one actor
#[derive(Debug, Clone)]
pub struct Foil {
    pixels: PixelBuffer<u8>,
    palette: Palette565,
    /// Horizontal centre in scene (depth map) columns
    x: i32,
    y1: i32,
    y2: i32,
    scene: u64,
}

impl Foil {
    fn empty() -> Self {
        Self {
            pixels: PixelBuffer::new(0, 0),
            palette: Palette565::default(),
            x: 0,
            y1: 0,
            y2: 0,
            scene: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Allocated size (high-water mark)
    pub fn capacity(&self) -> (usize, usize) {
        self.pixels.capacity()
    }

    /// Colour index at (col, row); 0 is transparent
    pub fn pixel(&self, col: i32, row: i32) -> u8 {
        self.pixels.get(col, row).unwrap_or(0)
    }

    pub fn row(&self, row: usize) -> Option<&[u8]> {
        self.pixels.row(row)
    }

    pub fn palette(&self) -> &Palette565 {
        &self.palette
    }

    /// Centre column in scene coordinates
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Top and exclusive bottom rows on screen
    pub fn rows(&self) -> (i32, i32) {
        (self.y1, self.y2)
    }

    /// Screen column of the foil's left edge for a given scroll position
    pub fn left(&self, xstart: i32) -> i32 {
        self.x - xstart - (self.width() as i32 >> 1)
    }

    /// Bottom-centre point used to look up the actor's depth
    pub fn anchor(&self) -> (i32, i32) {
        (self.x, self.y2)
    }

    /// RGBA8 texture data; index 0 becomes fully transparent
    pub fn to_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        for row in 0..self.height() {
            let Some(src) = self.pixels.row(row) else { continue };
            for &c in src {
                if c == 0 {
                    out.extend_from_slice(&[0, 0, 0, 0]);
                } else {
                    out.extend_from_slice(&rgb565_to_rgba(self.palette.get(c)));
                }
            }
        }
    }
}

/// Foils for every actor slot. Slots are created on first submission and
/// live until the cache is dropped.
///
/// Freshness is per scene, not per frame: a foil submitted since the last
/// `begin_scene` is drawn every frame at its last placement, even if the
/// host has stopped submitting that actor. Hosts that hide an actor
/// mid-scene should submit it with an empty placement.
#[derive(Debug, Clone)]
pub struct FoilCache {
    foils: Vec<Option<Foil>>,
    scene: u64,
}

impl FoilCache {
    pub fn new(max_actors: usize) -> Self {
        Self {
            foils: vec![None; max_actors],
            scene: 1,
        }
    }

    /// Foils submitted before this call stop being drawn
    pub fn begin_scene(&mut self) {
        self.scene += 1;
    }

    /// Lift an actor off `canvas` into its foil.
    ///
    /// The copied canvas pixels are cleared. Columns are clipped to
    /// `[0, screen_width)` and rows to the canvas. Returns false when nothing
    /// of the actor is visible.
    pub fn submit(
        &mut self,
        actor: ActorId,
        placement: ActorPlacement,
        canvas: &mut PixelBuffer<u8>,
        xstart: i32,
        screen_width: usize,
        palette: &Palette,
    ) -> bool {
        if actor >= self.foils.len() {
            self.foils.resize(actor + 1, None);
        }
        let foil = self.foils[actor].get_or_insert_with(Foil::empty);

        let width = placement.width.max(0);
        let x1a = placement.center_x - (width >> 1);
        let x1 = x1a.max(0);
        let x2 = (x1a + width).min(screen_width as i32).min(canvas.width() as i32);
        let y1 = placement.top.max(0);
        let y2 = placement.bottom.min(canvas.height() as i32).max(y1);

        if foil.pixels.resize(width as usize, (y2 - y1) as usize) {
            let (w, h) = foil.pixels.capacity();
            log::debug!("Foil for actor {} grown to {}x{}", actor, w, h);
        }
        foil.pixels.fill(0);

        for sy in y1..y2 {
            for sx in x1..x2 {
                if let Some(px) = canvas.get_mut(sx, sy) {
                    foil.pixels.set(sx - x1a, sy - y1, *px);
                    *px = 0;
                }
            }
        }

        foil.x = placement.center_x + xstart;
        foil.y1 = y1;
        foil.y2 = y2;
        foil.palette = palette.to_rgb565();
        foil.scene = self.scene;
        x1 < x2 && y1 < y2
    }

    pub fn get(&self, actor: ActorId) -> Option<&Foil> {
        self.foils.get(actor).and_then(|f| f.as_ref())
    }

    /// Number of actor slots
    pub fn slots(&self) -> usize {
        self.foils.len()
    }

    /// Foils submitted during the current scene that have something to draw
    pub fn live(&self) -> impl Iterator<Item = (ActorId, &Foil)> + '_ {
        let scene = self.scene;
        self.foils.iter().enumerate().filter_map(move |(id, f)| {
            f.as_ref()
                .filter(|f| f.scene == scene && !f.is_empty())
                .map(|f| (id, f))
        })
    }
}

impl Default for FoilCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with_actor() -> PixelBuffer<u8> {
        // 4x3 actor of colour 7 with its top-left at (10, 5)
        let mut canvas = PixelBuffer::new(32, 16);
        for y in 5..8 {
            for x in 10..14 {
                canvas.set(x, y, 7);
            }
        }
        canvas
    }

    fn placement() -> ActorPlacement {
        ActorPlacement { center_x: 12, top: 5, bottom: 8, width: 4 }
    }

    #[test]
    fn test_submit_lifts_pixels_off_canvas() {
        let mut canvas = canvas_with_actor();
        let mut cache = FoilCache::new(4);
        assert!(cache.submit(2, placement(), &mut canvas, 100, 32, &Palette::grayscale()));

        assert!(canvas.to_vec().iter().all(|&p| p == 0));
        let foil = cache.get(2).unwrap();
        assert_eq!((foil.width(), foil.height()), (4, 3));
        assert_eq!(foil.x(), 112);
        assert_eq!(foil.rows(), (5, 8));
        assert_eq!(foil.anchor(), (112, 8));
        assert_eq!(foil.left(100), 10);
        assert!((0..3).all(|r| (0..4).all(|c| foil.pixel(c, r) == 7)));
    }

    #[test]
    fn test_buffer_grows_but_never_shrinks() {
        let mut cache = FoilCache::new(1);
        let mut canvas = canvas_with_actor();
        cache.submit(0, placement(), &mut canvas, 0, 32, &Palette::grayscale());

        let small = ActorPlacement { center_x: 12, top: 5, bottom: 6, width: 2 };
        let mut canvas = canvas_with_actor();
        cache.submit(0, small, &mut canvas, 0, 32, &Palette::grayscale());
        let foil = cache.get(0).unwrap();
        assert_eq!((foil.width(), foil.height()), (2, 1));
        assert_eq!(foil.capacity(), (4, 3));

        let big = ActorPlacement { center_x: 12, top: 2, bottom: 12, width: 8 };
        let mut canvas = canvas_with_actor();
        cache.submit(0, big, &mut canvas, 0, 32, &Palette::grayscale());
        assert_eq!(cache.get(0).unwrap().capacity(), (8, 10));
    }

    #[test]
    fn test_clipped_at_left_screen_edge() {
        let mut canvas = PixelBuffer::filled(8, 2, 3u8);
        let mut cache = FoilCache::new(1);
        let p = ActorPlacement { center_x: 0, top: 0, bottom: 2, width: 4 };
        assert!(cache.submit(0, p, &mut canvas, 0, 8, &Palette::grayscale()));

        let foil = cache.get(0).unwrap();
        // Left half was off screen and stays transparent
        assert_eq!(foil.pixel(0, 0), 0);
        assert_eq!(foil.pixel(1, 0), 0);
        assert_eq!(foil.pixel(2, 0), 3);
        assert_eq!(foil.pixel(3, 1), 3);
        assert_eq!(canvas.get(2, 0), Some(3));
    }

    #[test]
    fn test_slots_grow_on_demand() {
        let mut cache = FoilCache::new(2);
        let mut canvas = canvas_with_actor();
        cache.submit(9, placement(), &mut canvas, 0, 32, &Palette::grayscale());
        assert_eq!(cache.slots(), 10);
        assert!(cache.get(9).is_some());
        assert!(cache.get(3).is_none());
    }

    #[test]
    fn test_new_scene_hides_old_foils() {
        let mut cache = FoilCache::new(2);
        let mut canvas = canvas_with_actor();
        cache.submit(1, placement(), &mut canvas, 0, 32, &Palette::grayscale());
        assert_eq!(cache.live().count(), 1);

        cache.begin_scene();
        assert_eq!(cache.live().count(), 0);
        // Memory is kept
        assert!(cache.get(1).is_some());
    }

    #[test]
    fn test_foil_stays_live_until_replaced() {
        let mut cache = FoilCache::new(1);
        let mut canvas = canvas_with_actor();
        cache.submit(0, placement(), &mut canvas, 0, 32, &Palette::grayscale());
        // No further submissions: still drawn for the rest of the scene
        assert_eq!(cache.live().count(), 1);

        let hidden = ActorPlacement { center_x: 12, top: 5, bottom: 5, width: 0 };
        assert!(!cache.submit(0, hidden, &mut canvas, 0, 32, &Palette::grayscale()));
        assert_eq!(cache.live().count(), 0);
    }

    #[test]
    fn test_palette_snapshot_and_rgba() {
        let mut pal = Palette::grayscale();
        pal.set(7, [255, 0, 0]);
        let mut cache = FoilCache::new(1);
        let mut canvas = canvas_with_actor();
        canvas.set(10, 5, 0);
        cache.submit(0, placement(), &mut canvas, 0, 32, &pal);

        let foil = cache.get(0).unwrap();
        assert_eq!(foil.palette().get(7), 0xf800);
        let mut rgba = Vec::new();
        foil.to_rgba8(&mut rgba);
        assert_eq!(rgba.len(), 4 * 3 * 4);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
        assert_eq!(&rgba[4..8], &[255, 0, 0, 255]);
    }
}
