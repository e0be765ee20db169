//! Frame composition: eyes, foils and the hardware sprite path

use super::eye::{compose_row, MarkerColors, RowOverlay};
use super::foil::{ActorId, Foil, FoilCache};
use crate::depth::{DepthMap, ParallaxTable, FLAT_DEPTH, NO_HEIGHT};
use crate::editor::SelectionMap;
use crate::raster::{Palette565, PixelBuffer};

/// Placement of one rendered view inside the output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eye {
    pub offset_x: usize,
    pub offset_y: usize,
    /// Integer magnification in both directions
    pub scale: usize,
}

/// Everything a compose pass reads about the current scene
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    /// Indexed background as displayed (actors already lifted off)
    pub screen: &'a PixelBuffer<u8>,
    pub palette: &'a Palette565,
    /// `None` disables depth effects
    pub depth: Option<&'a DepthMap>,
    /// Scene column shown at screen column 0
    pub xstart: i32,
    pub overlay: OverlayState<'a>,
}

/// Editing state shown on top of the background
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayState<'a> {
    pub selection: Option<&'a SelectionMap>,
    /// Screen pixel under the pointer
    pub pointer: Option<(i32, i32)>,
    pub edit_depth: Option<u8>,
    pub markers: MarkerColors,
}

/// Destination rectangle for a hardware-drawn sprite, in presenter pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteQuad {
    pub actor: ActorId,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Owns the RGB565 output, the z buffer and per-row scratch space.
///
/// The output is twice the screen in each direction; the z buffer is twice
/// as wide and one screen tall (one row of depth per source row).
#[derive(Debug, Clone)]
pub struct Compositor {
    output: PixelBuffer<u16>,
    zbuf: PixelBuffer<u8>,
    screen_width: usize,
    screen_height: usize,
    row_colors: Vec<u16>,
    row_depths: Vec<u8>,
    quads: Vec<SpriteQuad>,
}

impl Compositor {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        Self {
            output: PixelBuffer::new(screen_width * 2, screen_height * 2),
            zbuf: PixelBuffer::new(screen_width * 2, screen_height),
            screen_width,
            screen_height,
            row_colors: Vec::with_capacity(screen_width),
            row_depths: Vec::with_capacity(screen_width),
            quads: Vec::new(),
        }
    }

    pub fn output(&self) -> &PixelBuffer<u16> {
        &self.output
    }

    pub fn screen_size(&self) -> (usize, usize) {
        (self.screen_width, self.screen_height)
    }

    /// Eye placements for single (Basic) and side-by-side (Stereo) output
    pub fn single_eye(&self) -> Eye {
        Eye { offset_x: 0, offset_y: 0, scale: 2 }
    }

    pub fn stereo_eyes(&self) -> [Eye; 2] {
        [
            Eye { offset_x: 0, offset_y: self.screen_height, scale: 1 },
            Eye { offset_x: self.screen_width, offset_y: self.screen_height, scale: 1 },
        ]
    }

    /// Clear the output to black
    pub fn clear(&mut self) {
        self.output.fill(0);
    }

    /// Render the background through the parallax table into one eye, then
    /// draw the live foils on top.
    pub fn compose_eye(&mut self, scene: &SceneView<'_>, foils: &FoilCache, table: &ParallaxTable, eye: Eye) {
        self.zbuf.fill(NO_HEIGHT);
        self.compose_background(scene, table, eye);
        for (_, foil) in foils.live() {
            self.blit_foil(foil, scene, table, eye);
        }
    }

    fn compose_background(&mut self, scene: &SceneView<'_>, table: &ParallaxTable, eye: Eye) {
        let w = scene.screen.width().min(self.screen_width);
        let h = scene.screen.height().min(self.screen_height);
        let span = w * eye.scale;

        for row in 0..h {
            let out_y = eye.offset_y + row * eye.scale;
            if out_y >= self.output.height() {
                break;
            }
            let Some(src) = scene.screen.row(row) else { continue };

            self.row_colors.clear();
            self.row_colors.extend(src[..w].iter().map(|&i| scene.palette.get(i)));
            self.row_depths.clear();
            self.row_depths.extend((0..w as i32).map(|col| {
                scene
                    .depth
                    .and_then(|d| d.depth_at(scene.xstart + col, row as i32))
                    .unwrap_or(FLAT_DEPTH)
            }));

            let selection = match scene.overlay.selection {
                Some(sel) if scene.xstart >= 0 => sel
                    .row(row)
                    .and_then(|r| r.get(scene.xstart as usize..)),
                _ => None,
            };
            let overlay = RowOverlay {
                pointer_col: scene
                    .overlay
                    .pointer
                    .filter(|&(_, py)| py == row as i32)
                    .map(|(px, _)| px as usize),
                selection,
                edit_depth: scene.overlay.edit_depth,
                markers: scene.overlay.markers,
            };

            let (Some(dst_colors), Some(dst_depths)) = (
                self.output.span_mut(eye.offset_x, out_y, span),
                self.zbuf.span_mut(0, row, span),
            ) else {
                continue;
            };
            compose_row(
                &self.row_colors,
                &self.row_depths,
                table,
                eye.scale,
                &overlay,
                dst_colors,
                dst_depths,
            );

            for copy in 1..eye.scale {
                self.output.copy_span(out_y, out_y + copy, eye.offset_x, span);
            }
        }
    }

    /// Draw a foil shifted by the parallax of the ground at its anchor.
    ///
    /// No depth test against what is already drawn: foils always land on top.
    fn blit_foil(&mut self, foil: &Foil, scene: &SceneView<'_>, table: &ParallaxTable, eye: Eye) {
        let (ax, ay) = foil.anchor();
        let depth = scene
            .depth
            .and_then(|d| d.depth_at(ax, ay).or_else(|| d.depth_at(ax, ay - 1)))
            .unwrap_or(NO_HEIGHT);
        let plx = table.shift(depth);

        let scale = eye.scale as i32;
        let span = self.screen_width * eye.scale;
        let first_row = eye.offset_y as i32;
        let last_row = (eye.offset_y + self.screen_height * eye.scale) as i32;
        let (y1, _) = foil.rows();
        let left = plx + scale * foil.left(scene.xstart);
        let palette = foil.palette();

        for row in 0..foil.height() {
            let Some(src) = foil.row(row) else { continue };
            for srow in 0..scale {
                let out_y = first_row + scale * (y1 + row as i32) + srow;
                if out_y < first_row || out_y >= last_row {
                    continue;
                }
                let Some(dst) = self.output.span_mut(eye.offset_x, out_y as usize, span) else {
                    continue;
                };
                let xmax = dst.len() as i32;
                let mut xdst = left;
                for &c8 in src {
                    if c8 == 0 {
                        xdst += scale;
                        continue;
                    }
                    let cc = palette.get(c8);
                    for _ in 0..scale {
                        if (0..xmax).contains(&xdst) {
                            dst[xdst as usize] = cc;
                        }
                        xdst += 1;
                    }
                }
            }
        }
    }

    /// Copy the background at `scale` with no parallax (hardware sprite path)
    pub fn copy_background(&mut self, scene: &SceneView<'_>, scale: usize) {
        let w = scene.screen.width().min(self.screen_width);
        let h = scene.screen.height().min(self.screen_height);
        for row in 0..h {
            let out_y = row * scale;
            let Some(src) = scene.screen.row(row) else { continue };
            let Some(dst) = self.output.span_mut(0, out_y, w * scale) else { break };
            for (i, &c) in src[..w].iter().enumerate() {
                let cc = scene.palette.get(c);
                for px in dst.iter_mut().skip(i * scale).take(scale) {
                    *px = cc;
                }
            }
            for copy in 1..scale {
                self.output.copy_span(out_y, out_y + copy, 0, w * scale);
            }
        }
    }

    /// Destination rectangles for the live foils, unshifted, for a presenter
    /// that draws them as textures. `viewport_scale` maps output pixels to
    /// presenter pixels.
    pub fn build_sprite_quads(&mut self, foils: &FoilCache, xstart: i32, scale: usize, viewport_scale: f32) {
        self.quads.clear();
        let s = scale as f32 * viewport_scale;
        for (actor, foil) in foils.live() {
            let (y1, _) = foil.rows();
            self.quads.push(SpriteQuad {
                actor,
                x: foil.left(xstart) as f32 * s,
                y: y1 as f32 * s,
                w: foil.width() as f32 * s,
                h: foil.height() as f32 * s,
            });
        }
    }

    /// Quads from the last `build_sprite_quads`
    pub fn sprite_quads(&self) -> &[SpriteQuad] {
        &self.quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::ActorPlacement;
    use crate::raster::Palette;

    const W: usize = 8;
    const H: usize = 4;

    fn gradient_screen() -> PixelBuffer<u8> {
        let mut screen = PixelBuffer::new(W, H);
        for y in 0..H as i32 {
            for x in 0..W as i32 {
                screen.set(x, y, (1 + x + y * W as i32) as u8);
            }
        }
        screen
    }

    fn scene<'a>(screen: &'a PixelBuffer<u8>, palette: &'a Palette565, depth: Option<&'a DepthMap>) -> SceneView<'a> {
        SceneView {
            screen,
            palette,
            depth,
            xstart: 0,
            overlay: OverlayState::default(),
        }
    }

    #[test]
    fn test_flat_scene_matches_input() {
        let screen = gradient_screen();
        let palette = Palette::grayscale().to_rgb565();
        let depth = DepthMap::flat(W, H);
        let table = ParallaxTable::new(0.0, 10.0);
        let mut comp = Compositor::new(W, H);

        let eye = Eye { offset_x: 0, offset_y: 0, scale: 1 };
        comp.compose_eye(&scene(&screen, &palette, Some(&depth)), &FoilCache::default(), &table, eye);
        for y in 0..H {
            let expected: Vec<u16> = screen.row(y).unwrap().iter().map(|&i| palette.get(i)).collect();
            assert_eq!(&comp.output().row(y).unwrap()[..W], expected.as_slice());
        }
    }

    #[test]
    fn test_single_eye_doubles_rows_and_columns() {
        let screen = gradient_screen();
        let palette = Palette::grayscale().to_rgb565();
        let mut comp = Compositor::new(W, H);
        let eye = comp.single_eye();
        comp.compose_eye(&scene(&screen, &palette, None), &FoilCache::default(), &ParallaxTable::flat(), eye);

        let out = comp.output();
        for y in 0..H {
            let top = out.row(y * 2).unwrap();
            assert_eq!(top, out.row(y * 2 + 1).unwrap());
            assert_eq!(top[0], top[1]);
            assert_eq!(top[0], palette.get(screen.get(0, y as i32).unwrap()));
        }
    }

    #[test]
    fn test_stereo_eyes_sit_side_by_side() {
        let screen = gradient_screen();
        let palette = Palette::grayscale().to_rgb565();
        let depth = DepthMap::flat(W, H);
        let mut comp = Compositor::new(W, H);
        let [left, right] = comp.stereo_eyes();
        let table = ParallaxTable::flat();
        let view = scene(&screen, &palette, Some(&depth));
        comp.compose_eye(&view, &FoilCache::default(), &table, left);
        comp.compose_eye(&view, &FoilCache::default(), &table, right);

        let out = comp.output();
        for y in 0..H {
            let row = out.row(H + y).unwrap();
            assert_eq!(&row[..W], &row[W..]);
            // Top half untouched
            assert!(out.row(y).unwrap().iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn test_foil_drawn_with_ground_parallax() {
        let screen = PixelBuffer::filled(W, H, 1u8);
        let mut pal = Palette::grayscale();
        pal.set(9, [255, 0, 0]);
        let palette = pal.to_rgb565();
        let mut depth = DepthMap::flat(W, H);
        // Ground under the actor's feet
        depth.set_depth(3, 3, 255);

        let mut canvas = PixelBuffer::new(W, H);
        canvas.set(2, 1, 9);
        canvas.set(3, 1, 9);
        canvas.set(2, 2, 9);
        let mut foils = FoilCache::new(1);
        let p = ActorPlacement { center_x: 3, top: 1, bottom: 3, width: 2 };
        foils.submit(0, p, &mut canvas, 0, W, &pal);

        let mut table_shifts = [0; 256];
        table_shifts[255] = 2;
        let table = ParallaxTable::from_shifts(table_shifts);
        let mut comp = Compositor::new(W, H);
        let eye = Eye { offset_x: 0, offset_y: 0, scale: 1 };
        comp.compose_eye(&scene(&screen, &palette, Some(&depth)), &foils, &table, eye);

        let out = comp.output();
        assert_eq!(out.get(4, 1), Some(0xf800));
        assert_eq!(out.get(5, 1), Some(0xf800));
        assert_eq!(out.get(4, 2), Some(0xf800));
        // Transparent foil pixel keeps the background
        assert_eq!(out.get(5, 2), Some(palette.get(1)));
        assert_eq!(out.get(2, 1), Some(palette.get(1)));
    }

    #[test]
    fn test_foil_clipped_to_eye() {
        let screen = PixelBuffer::filled(W, H, 1u8);
        let pal = Palette::grayscale();
        let palette = pal.to_rgb565();
        let mut canvas = PixelBuffer::filled(W, H, 200u8);
        let mut foils = FoilCache::new(1);
        let p = ActorPlacement { center_x: 7, top: 0, bottom: 4, width: 4 };
        foils.submit(0, p, &mut canvas, 0, W, &pal);

        let mut comp = Compositor::new(W, H);
        let [left, _] = comp.stereo_eyes();
        comp.compose_eye(&scene(&screen, &palette, None), &foils, &ParallaxTable::flat(), left);
        let out = comp.output();
        // Actor spans columns 5..9 but the left eye ends at column 8
        assert_eq!(out.get(7, H as i32), Some(palette.get(200)));
        assert_eq!(out.get(8, H as i32), Some(0));
    }

    #[test]
    fn test_copy_background_and_quads() {
        let screen = gradient_screen();
        let pal = Palette::grayscale();
        let palette = pal.to_rgb565();
        let mut comp = Compositor::new(W, H);
        comp.copy_background(&scene(&screen, &palette, None), 2);
        let out = comp.output();
        assert_eq!(out.get(3, 3), Some(palette.get(screen.get(1, 1).unwrap())));

        let mut canvas = PixelBuffer::filled(W, H, 5u8);
        let mut foils = FoilCache::new(2);
        let p = ActorPlacement { center_x: 4, top: 1, bottom: 3, width: 2 };
        foils.submit(1, p, &mut canvas, 0, W, &pal);
        comp.build_sprite_quads(&foils, 0, 2, 1.5);
        assert_eq!(comp.sprite_quads(), &[SpriteQuad { actor: 1, x: 9.0, y: 3.0, w: 6.0, h: 6.0 }]);
    }
}
