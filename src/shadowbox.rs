//! The shadowbox context
//!
//! `ShadowBox` owns every piece of per-game state: the depth map of the
//! current scene, the depth editor, the actor foils and the compositor.
//! The host feeds it events (scene loaded, actor drawn, pointer moved,
//! command typed) and calls `compose` once per frame.

use std::path::PathBuf;
use std::time::Instant;

use crate::compositor::{
    ActorId, ActorPlacement, Compositor, FoilCache, OverlayState, SceneView, SpriteQuad,
};
use crate::config::ShadowboxConfig;
use crate::depth::{DepthMap, DepthMapError, DepthStore, ParallaxTable, ViewAngle};
use crate::editor::{Command, DepthEditor, ScreenView};
use crate::mode::Mode;
use crate::raster::{Palette, PixelBuffer};

/// The host's view of the current frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Indexed background as the host displays it
    pub screen: &'a PixelBuffer<u8>,
    pub palette: &'a Palette,
    /// Scene column shown at screen column 0
    pub xstart: i32,
}

/// Things the presentation layer should do before the next frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostRequests {
    /// Mark the whole screen dirty
    pub full_redraw: bool,
    /// The presented surface changed size (composited output is 2x)
    pub output_resized: bool,
}

/// Region of the output buffer to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// A finished frame
#[derive(Debug, Clone, Copy)]
pub struct Presentation<'a> {
    pub output: &'a PixelBuffer<u16>,
    pub rect: OutputRect,
    /// Foils the presenter draws itself (GPU mode only)
    pub sprites: &'a [SpriteQuad],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SceneInfo {
    id: u32,
    width: usize,
}

pub struct ShadowBox {
    config: ShadowboxConfig,
    mode: Mode,
    view_angle: ViewAngle,
    table: ParallaxTable,
    store: DepthStore,
    depth: Option<DepthMap>,
    editor: DepthEditor,
    foils: FoilCache,
    canvas: PixelBuffer<u8>,
    compositor: Compositor,
    scene: Option<SceneInfo>,
    requests: HostRequests,
    frames: u32,
}

impl ShadowBox {
    pub fn new(config: ShadowboxConfig) -> Self {
        let view_angle = ViewAngle::new(config.view_angle_min, config.view_angle_max);
        let table = ParallaxTable::new(view_angle.angle(), config.parallax_scale);
        let mut sb = Self {
            mode: Mode::Off,
            view_angle,
            table,
            store: DepthStore::new(&config.depth_dir, &config.game_id),
            depth: None,
            editor: DepthEditor::new(config.pointer_offset),
            foils: FoilCache::new(config.max_actors),
            canvas: PixelBuffer::new(config.screen_width, config.screen_height),
            compositor: Compositor::new(config.screen_width, config.screen_height),
            scene: None,
            requests: HostRequests::default(),
            frames: 0,
            config,
        };
        if sb.config.initial_mode != Mode::Off {
            sb.set_mode(sb.config.initial_mode);
        }
        sb
    }

    pub fn config(&self) -> &ShadowboxConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn view_angle(&self) -> f32 {
        self.view_angle.angle()
    }

    pub fn depth_map(&self) -> Option<&DepthMap> {
        self.depth.as_ref()
    }

    pub fn depth_map_mut(&mut self) -> Option<&mut DepthMap> {
        self.depth.as_mut()
    }

    pub fn editor(&self) -> &DepthEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut DepthEditor {
        &mut self.editor
    }

    pub fn foils(&self) -> &FoilCache {
        &self.foils
    }

    pub fn output(&self) -> &PixelBuffer<u16> {
        self.compositor.output()
    }

    pub fn scene_id(&self) -> Option<u32> {
        self.scene.map(|s| s.id)
    }

    // ========================================================================
    // Host events
    // ========================================================================

    /// A new scene is on screen. Loads its depth map (or a flat one),
    /// resets the selection and retires the previous scene's foils.
    pub fn scene_loaded(&mut self, id: u32, width: usize) {
        self.scene = Some(SceneInfo { id, width });
        self.load_depth_map();
        self.editor.reset_scene(width, self.config.screen_height);
        self.foils.begin_scene();
    }

    /// Scratch canvas for the host to draw the next actor into. `None` while
    /// the host presents its own frame.
    pub fn actor_canvas(&mut self, width: usize, height: usize) -> Option<&mut PixelBuffer<u8>> {
        if self.mode == Mode::Off {
            return None;
        }
        self.canvas.ensure_size(width, height);
        Some(&mut self.canvas)
    }

    /// The host finished drawing `actor` into the canvas
    pub fn actor_drawn(
        &mut self,
        actor: ActorId,
        placement: ActorPlacement,
        xstart: i32,
        palette: &Palette,
    ) -> bool {
        if self.mode == Mode::Off || self.canvas.is_empty() {
            return false;
        }
        self.foils.submit(
            actor,
            placement,
            &mut self.canvas,
            xstart,
            self.config.screen_width,
            palette,
        )
    }

    /// Raw pointer position in screen pixels
    pub fn set_pointer(&mut self, x: i32, y: i32) {
        self.editor.set_pointer(x, y);
    }

    pub fn clear_pointer(&mut self) {
        self.editor.clear_pointer();
    }

    pub fn set_paint_held(&mut self, down: bool) {
        self.editor.set_paint_held(down);
    }

    pub fn adjust_view_angle(&mut self, delta: f32) -> f32 {
        self.view_angle.adjust(delta)
    }

    /// Drain pending host requests
    pub fn take_requests(&mut self) -> HostRequests {
        std::mem::take(&mut self.requests)
    }

    // ========================================================================
    // Modes
    // ========================================================================

    pub fn set_mode(&mut self, mode: Mode) {
        let previous = self.mode;
        self.mode = mode;
        self.compositor.clear();
        self.requests.full_redraw = true;
        if (previous == Mode::Off) != (mode == Mode::Off) {
            self.requests.output_resized = true;
        }
        log::info!("Shadowbox mode: {}", mode.label());
    }

    pub fn next_mode(&mut self) {
        let next = self.mode.next_in(&self.config.cycle);
        self.set_mode(next);
    }

    pub fn toggle_stereo(&mut self) {
        let next = if self.mode == Mode::Stereo { Mode::Off } else { Mode::Stereo };
        self.set_mode(next);
    }

    // ========================================================================
    // Depth map persistence
    // ========================================================================

    /// Load the current scene's depth map, synthesizing a flat map when the
    /// file is missing or unreadable. Returns true if a file was read.
    pub fn load_depth_map(&mut self) -> bool {
        let Some(scene) = self.scene else {
            self.depth = None;
            return false;
        };
        match self.store.load(scene.id) {
            Ok(map) => {
                self.depth = Some(map);
                return true;
            }
            Err(DepthMapError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No depth map for scene {}", scene.id);
            }
            Err(e) => {
                log::error!(
                    "Failed to load depth map {}: {}",
                    self.store.path_for(scene.id).display(),
                    e
                );
            }
        }

        self.depth = if scene.width > 0 {
            log::info!("Creating depth map {}x{}", scene.width, self.config.screen_height);
            Some(DepthMap::flat(scene.width, self.config.screen_height))
        } else {
            None
        };
        false
    }

    /// Write the current depth map. `Ok(None)` when there is nothing to save.
    pub fn save_depth_map(&self) -> Result<Option<PathBuf>, DepthMapError> {
        match (self.scene, &self.depth) {
            (Some(scene), Some(map)) => self.store.save(scene.id, map).map(Some),
            _ => Ok(None),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Handle a typed character. Returns false if it isn't a command.
    pub fn handle_key(&mut self, key: char, frame: &Frame<'_>) -> bool {
        match Command::from_key(key) {
            Some(cmd) => {
                self.apply(cmd, frame);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, cmd: Command, frame: &Frame<'_>) {
        let view = ScreenView { screen: frame.screen, xstart: frame.xstart };
        match cmd {
            Command::SaveDepth => match self.save_depth_map() {
                Ok(Some(_)) => {}
                Ok(None) => log::warn!("No depth map to save"),
                Err(e) => log::error!("Failed to save depth map: {}", e),
            },
            Command::LoadDepth => {
                self.load_depth_map();
            }
            Command::CycleMode => self.next_mode(),
            Command::ToggleStereo => self.toggle_stereo(),
            Command::ClearSelection => self.editor.clear_selection(),
            Command::ExpandByColor => {
                let added = self.editor.selection.expand_by_color(self.depth.as_ref(), &view);
                log::info!("Selection grew by {} pixels", added);
            }
            Command::ExpandByDepth => match &self.depth {
                Some(depth) => {
                    let added = self.editor.selection.expand_by_depth(depth, &view);
                    log::info!("Selection grew by {} pixels", added);
                }
                None => log::warn!("No depth map to expand against"),
            },
            Command::PushDepth(level) => match self.depth.as_mut() {
                Some(depth) => {
                    self.editor.push_to_depth(level, depth);
                }
                None => log::warn!("No depth map to push into"),
            },
            Command::EditDepth(level) => {
                self.editor.set_edit_depth(level);
            }
            Command::TogglePaint => {
                let on = self.editor.toggle_paint();
                log::info!("Paint {}", if on { "on" } else { "off" });
            }
        }
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Build this frame's output. `viewport_scale` maps output pixels to
    /// presenter pixels for GPU sprite quads. Returns `None` in Off mode.
    pub fn compose(&mut self, frame: &Frame<'_>, viewport_scale: f32) -> Option<Presentation<'_>> {
        if self.mode == Mode::Off {
            return None;
        }
        let start = Instant::now();

        self.editor.update(frame.xstart);

        let palette = frame.palette.to_rgb565();
        let scene = SceneView {
            screen: frame.screen,
            palette: &palette,
            depth: self.depth.as_ref(),
            xstart: frame.xstart,
            overlay: OverlayState {
                selection: if self.config.highlight_selection {
                    Some(&self.editor.selection)
                } else {
                    None
                },
                pointer: self.editor.pointer(),
                edit_depth: self.editor.edit_depth(),
                markers: self.config.markers,
            },
        };

        let angle = self.view_angle.angle();
        let k = self.config.parallax_scale;
        let has_depth = self.depth.is_some();
        let (w, h) = self.compositor.screen_size();

        let rect = match self.mode {
            Mode::Basic => {
                set_table(&mut self.table, has_depth, angle, k);
                let eye = self.compositor.single_eye();
                self.compositor.compose_eye(&scene, &self.foils, &self.table, eye);
                OutputRect { x: 0, y: 0, w: w * 2, h: h * 2 }
            }
            Mode::Stereo => {
                let eyes = self.compositor.stereo_eyes();
                for (eye, side) in eyes.into_iter().zip([1.0, -1.0]) {
                    set_table(&mut self.table, has_depth, angle * side, k);
                    self.compositor.compose_eye(&scene, &self.foils, &self.table, eye);
                }
                OutputRect { x: 0, y: h, w: w * 2, h }
            }
            Mode::Gpu => {
                self.compositor.copy_background(&scene, 2);
                self.compositor.build_sprite_quads(&self.foils, frame.xstart, 2, viewport_scale);
                OutputRect { x: 0, y: 0, w: w * 2, h: h * 2 }
            }
            Mode::Off => return None,
        };

        self.frames = self.frames.wrapping_add(1);
        let interval = self.config.report_interval;
        if interval > 0 && self.frames % interval == 0 {
            let path = if self.mode == Mode::Gpu { "GPU" } else { "CPU" };
            log::debug!(
                "{} compose time = {:.3} ms",
                path,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }

        let sprites: &[SpriteQuad] = if self.mode == Mode::Gpu {
            self.compositor.sprite_quads()
        } else {
            &[]
        };
        Some(Presentation {
            output: self.compositor.output(),
            rect,
            sprites,
        })
    }
}

fn set_table(table: &mut ParallaxTable, has_depth: bool, angle: f32, k: f32) {
    if has_depth {
        table.rebuild(angle, k);
    } else {
        *table = ParallaxTable::flat();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 16;
    const H: usize = 8;

    fn config(tag: &str) -> ShadowboxConfig {
        ShadowboxConfig {
            game_id: format!("test_{}", tag),
            depth_dir: std::env::temp_dir().join(format!("shadowbox-ctx-{}-{}", tag, std::process::id())),
            screen_width: W,
            screen_height: H,
            view_angle_min: -5.0,
            view_angle_max: 5.0,
            ..Default::default()
        }
    }

    fn screen() -> PixelBuffer<u8> {
        let mut screen = PixelBuffer::new(W, H);
        for y in 0..H as i32 {
            for x in 0..W as i32 {
                screen.set(x, y, (x * 7 + y * 3) as u8);
            }
        }
        screen
    }

    #[test]
    fn test_off_mode_composes_nothing() {
        let mut sb = ShadowBox::new(config("off"));
        let screen = screen();
        let palette = Palette::grayscale();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        assert!(sb.compose(&frame, 1.0).is_none());
        assert!(sb.actor_canvas(4, 4).is_none());
    }

    #[test]
    fn test_flat_scene_at_zero_angle_matches_input() {
        let mut sb = ShadowBox::new(config("flat"));
        sb.scene_loaded(1, W);
        assert!(sb.depth_map().is_some());
        sb.set_mode(Mode::Basic);

        let screen = screen();
        let palette = Palette::grayscale();
        let pal565 = palette.to_rgb565();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        let shown = sb.compose(&frame, 1.0).unwrap();
        assert_eq!(shown.rect, OutputRect { x: 0, y: 0, w: W * 2, h: H * 2 });
        assert!(shown.sprites.is_empty());
        for y in 0..H {
            let row = shown.output.row(y * 2).unwrap();
            for x in 0..W {
                let expected = pal565.get(screen.get(x as i32, y as i32).unwrap());
                assert_eq!(row[x * 2], expected);
                assert_eq!(row[x * 2 + 1], expected);
            }
        }
    }

    #[test]
    fn test_push_levels_through_commands() {
        let mut sb = ShadowBox::new(config("push"));
        sb.scene_loaded(2, W);
        let screen = screen();
        let palette = Palette::grayscale();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };

        sb.editor_mut().paint(3, 4, 0);
        sb.editor_mut().paint(4, 4, 0);
        assert!(sb.handle_key('5', &frame));
        let depth = sb.depth_map().unwrap();
        assert_eq!(depth.depth_at(3, 4), Some(127));
        assert_eq!(depth.depth_at(4, 4), Some(127));
        assert_eq!(depth.depth_at(5, 4), Some(1));

        assert!(sb.handle_key('0', &frame));
        assert_eq!(sb.depth_map().unwrap().depth_at(3, 4), Some(0));

        assert!(sb.handle_key('x', &frame));
        assert_eq!(sb.editor().selection.count(), 0);
        assert!(!sb.handle_key('q', &frame));
    }

    #[test]
    fn test_mode_transitions_raise_requests() {
        let mut sb = ShadowBox::new(config("modes"));
        assert_eq!(sb.take_requests(), HostRequests::default());

        sb.next_mode();
        assert_eq!(sb.mode(), Mode::Basic);
        assert_eq!(
            sb.take_requests(),
            HostRequests { full_redraw: true, output_resized: true }
        );
        assert_eq!(sb.take_requests(), HostRequests::default());

        sb.next_mode();
        assert_eq!(sb.mode(), Mode::Gpu);
        assert_eq!(
            sb.take_requests(),
            HostRequests { full_redraw: true, output_resized: false }
        );

        sb.next_mode();
        assert_eq!(sb.mode(), Mode::Off);
        assert!(sb.take_requests().output_resized);
        sb.toggle_stereo();
        assert_eq!(sb.mode(), Mode::Stereo);
        sb.toggle_stereo();
        assert_eq!(sb.mode(), Mode::Off);
    }

    #[test]
    fn test_stereo_fills_bottom_half() {
        let mut sb = ShadowBox::new(config("stereo"));
        sb.scene_loaded(3, W);
        sb.set_mode(Mode::Stereo);
        let screen = PixelBuffer::filled(W, H, 40u8);
        let palette = Palette::grayscale();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };

        let shown = sb.compose(&frame, 1.0).unwrap();
        assert_eq!(shown.rect, OutputRect { x: 0, y: H, w: W * 2, h: H });
        let gray = palette.to_rgb565().get(40);
        for y in H..H * 2 {
            assert!(shown.output.row(y).unwrap().iter().all(|&c| c == gray));
        }
    }

    #[test]
    fn test_stereo_eyes_shift_in_opposite_directions() {
        let mut sb = ShadowBox::new(config("stereo_band"));
        sb.scene_loaded(8, W);
        // Raised band at columns 6..10
        let depth = sb.depth_map_mut().unwrap();
        for y in 0..H as i32 {
            for x in 6..10 {
                depth.set_depth(x, y, 255);
            }
        }
        let mut screen = PixelBuffer::filled(W, H, 40u8);
        for y in 0..H as i32 {
            for x in 6..10 {
                screen.set(x, y, 200);
            }
        }
        sb.set_mode(Mode::Stereo);
        assert_eq!(sb.adjust_view_angle(-0.25), -0.25);

        let palette = Palette::grayscale();
        let pal565 = palette.to_rgb565();
        let (ground, band) = (pal565.get(40), pal565.get(200));
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        let shown = sb.compose(&frame, 1.0).unwrap();

        for y in H..H * 2 {
            let row = shown.output.row(y).unwrap();
            let (left, right) = row.split_at(W);
            // Left eye pushes the band right, right eye pushes it left
            assert!(left[8..12].iter().all(|&c| c == band), "left eye row {}", y);
            assert!(left[4..8].iter().all(|&c| c == ground), "left eye row {}", y);
            assert!(right[4..8].iter().all(|&c| c == band), "right eye row {}", y);
            assert!(right[8..12].iter().all(|&c| c == ground), "right eye row {}", y);
        }
    }

    #[test]
    fn test_mode_change_clears_output() {
        let mut sb = ShadowBox::new(config("clear"));
        sb.scene_loaded(9, W);
        sb.set_mode(Mode::Basic);
        let screen = PixelBuffer::filled(W, H, 90u8);
        let palette = Palette::grayscale();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        assert!(sb.compose(&frame, 1.0).is_some());
        assert!(sb.output().to_vec().iter().any(|&c| c != 0));

        sb.set_mode(Mode::Stereo);
        assert!(sb.output().to_vec().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_huge_view_angle_does_not_overflow() {
        let mut sb = ShadowBox::new(ShadowboxConfig {
            view_angle_min: -1e30,
            view_angle_max: 1e30,
            ..config("huge")
        });
        sb.scene_loaded(10, W);
        sb.set_mode(Mode::Basic);
        sb.adjust_view_angle(1e30);

        let palette = Palette::grayscale();
        let canvas = sb.actor_canvas(W, H).unwrap();
        canvas.set(5, 2, 9);
        let p = ActorPlacement { center_x: 5, top: 2, bottom: 3, width: 2 };
        sb.actor_drawn(0, p, 0, &palette);

        let screen = screen();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        assert!(sb.compose(&frame, 1.0).is_some());
        sb.set_mode(Mode::Stereo);
        assert!(sb.compose(&frame, 1.0).is_some());
    }

    #[test]
    fn test_actor_foil_in_gpu_mode() {
        let mut sb = ShadowBox::new(config("gpu"));
        sb.scene_loaded(4, W);
        sb.set_mode(Mode::Gpu);
        let palette = Palette::grayscale();

        let canvas = sb.actor_canvas(W, H).unwrap();
        canvas.set(5, 2, 9);
        let p = ActorPlacement { center_x: 5, top: 2, bottom: 3, width: 2 };
        assert!(sb.actor_drawn(7, p, 0, &palette));
        assert_eq!(sb.foils().live().count(), 1);

        let screen = screen();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        let shown = sb.compose(&frame, 1.0).unwrap();
        assert_eq!(shown.sprites.len(), 1);
        assert_eq!(shown.sprites[0].actor, 7);

        sb.scene_loaded(5, W);
        assert_eq!(sb.foils().live().count(), 0);
    }

    #[test]
    fn test_save_and_reload_depth_map() {
        let cfg = config("save");
        let dir = cfg.depth_dir.clone();
        let mut sb = ShadowBox::new(cfg);
        assert!(sb.save_depth_map().unwrap().is_none());

        sb.scene_loaded(6, W);
        sb.depth_map_mut().unwrap().set_depth(2, 2, 200);
        let path = sb.save_depth_map().unwrap().unwrap();
        assert!(path.exists());

        sb.depth_map_mut().unwrap().fill(1);
        assert!(sb.load_depth_map());
        assert_eq!(sb.depth_map().unwrap().depth_at(2, 2), Some(200));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unknown_width_leaves_no_depth_map() {
        let mut sb = ShadowBox::new(config("nowidth"));
        sb.scene_loaded(7, 0);
        assert!(sb.depth_map().is_none());
        sb.set_mode(Mode::Basic);
        let screen = screen();
        let palette = Palette::grayscale();
        let frame = Frame { screen: &screen, palette: &palette, xstart: 0 };
        assert!(sb.compose(&frame, 1.0).is_some());
    }
}
