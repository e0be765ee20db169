//! Shadowbox viewer
//!
//! Scrolls a window over a background image and runs every frame through
//! the compositor, with a walking actor to show foil placement.
//!
//! - Left/Right: scroll
//! - Up/Down: view angle
//! - Middle mouse: paint the selection
//! - Typed characters: depth editor commands (`\` cycles modes)

use std::path::PathBuf;

use image::GenericImageView;
use macroquad::prelude::*;
use shadowbox::compositor::{ActorPlacement, SpriteQuad};
use shadowbox::raster::{rgb332_index, rgb565_buffer_to_rgba, Palette, PixelBuffer};
use shadowbox::{load_config, ConfigError, Frame, Mode, ShadowBox, ShadowboxConfig, VERSION};

const CONFIG_PATH: &str = "shadowbox.ron";
const WINDOW_SCALE: i32 = 3;
const SCROLL_SPEED: i32 = 2;
const ANGLE_STEP: f32 = 0.05;
const DEMO_ACTOR: usize = 0;
/// Scene id handed to the compositor for the loaded background
const DEMO_SCENE: u32 = 1;

const ACTOR_SPRITE: [&str; 14] = [
    "..##..",
    ".####.",
    ".####.",
    "..##..",
    ".####.",
    "######",
    "#.##.#",
    "#.##.#",
    "..##..",
    ".#..#.",
    ".#..#.",
    ".#..#.",
    ".#..#.",
    "##..##",
];

struct StdoutLogger;

impl ::log::Log for StdoutLogger {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        metadata.level() <= ::log::max_level()
    }

    fn log(&self, record: &::log::Record) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Shadowbox v{}", VERSION),
        window_width: 320 * WINDOW_SCALE,
        window_height: 200 * WINDOW_SCALE,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Actor walking back and forth across the scene
struct DemoActor {
    x: f32,
    dir: f32,
    color: u8,
}

impl DemoActor {
    fn width() -> i32 {
        ACTOR_SPRITE[0].len() as i32
    }

    fn height() -> i32 {
        ACTOR_SPRITE.len() as i32
    }

    fn step(&mut self, scene_width: usize) {
        let max = (scene_width as f32 - Self::width() as f32).max(0.0);
        self.x += self.dir * 0.75;
        if self.x <= 0.0 || self.x >= max {
            self.x = self.x.clamp(0.0, max);
            self.dir = -self.dir;
        }
    }

    /// Placement on screen with the feet on `ground`
    fn placement(&self, xstart: i32, ground: i32) -> ActorPlacement {
        ActorPlacement {
            center_x: self.x as i32 - xstart,
            top: ground - Self::height(),
            bottom: ground,
            width: Self::width(),
        }
    }

    fn draw(&self, target: &mut PixelBuffer<u8>, placement: &ActorPlacement) {
        let left = placement.center_x - (placement.width >> 1);
        for (row, line) in ACTOR_SPRITE.iter().enumerate() {
            for (col, ch) in line.bytes().enumerate() {
                if ch == b'#' {
                    target.set(left + col as i32, placement.top + row as i32, self.color);
                }
            }
        }
    }
}

/// Where a picture of `w` x `h` units lands when fitted into the window
#[derive(Debug, Clone, Copy)]
struct Fit {
    x: f32,
    y: f32,
    scale: f32,
}

impl Fit {
    fn new(w: usize, h: usize) -> Self {
        let (win_w, win_h) = (screen_width(), screen_height());
        let scale = (win_w / w.max(1) as f32).min(win_h / h.max(1) as f32);
        Self {
            x: (win_w - w as f32 * scale) * 0.5,
            y: (win_h - h as f32 * scale) * 0.5,
            scale,
        }
    }

    /// Window position to picture units, if inside
    fn to_picture(&self, mx: f32, my: f32, w: usize, h: usize) -> Option<(i32, i32)> {
        let px = ((mx - self.x) / self.scale).floor();
        let py = ((my - self.y) / self.scale).floor();
        if px < 0.0 || py < 0.0 || px >= w as f32 || py >= h as f32 {
            return None;
        }
        Some((px as i32, py as i32))
    }
}

/// Picture size in output units and output units per screen pixel
fn presented_size(mode: Mode, screen_w: usize, screen_h: usize) -> (usize, usize, usize) {
    match mode {
        Mode::Off => (screen_w, screen_h, 1),
        Mode::Basic | Mode::Gpu => (screen_w * 2, screen_h * 2, 2),
        Mode::Stereo => (screen_w * 2, screen_h, 1),
    }
}

fn load_viewer_config() -> ShadowboxConfig {
    match load_config(CONFIG_PATH) {
        Ok(config) => {
            ::log::info!("Loaded {}", CONFIG_PATH);
            config
        }
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            ShadowboxConfig::default()
        }
        Err(e) => {
            ::log::warn!("{}: {}, using defaults", CONFIG_PATH, e);
            ShadowboxConfig::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn pick_background() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Image", &["png", "jpg", "jpeg", "bmp"])
        .pick_file()
}

#[cfg(target_arch = "wasm32")]
fn pick_background() -> Option<PathBuf> {
    None
}

/// Scale an image to one screen tall (at least one screen wide) and map it
/// onto the 3-3-2 palette
fn quantize(img: &image::DynamicImage, min_width: usize, height: usize) -> PixelBuffer<u8> {
    let (w, h) = img.dimensions();
    let width = (w.max(1) as usize * height / h.max(1) as usize).max(min_width);
    let rgb = img
        .resize_exact(width as u32, height as u32, image::imageops::FilterType::Triangle)
        .to_rgb8();

    let mut out = PixelBuffer::new(width, height);
    for (x, y, p) in rgb.enumerate_pixels() {
        out.set(x as i32, y as i32, rgb332_index(p[0], p[1], p[2]));
    }
    out
}

/// Sky, striped ground and a row of posts
fn procedural_background(width: usize, height: usize) -> PixelBuffer<u8> {
    let mut bg = PixelBuffer::new(width, height);
    let horizon = height * 3 / 5;
    for y in 0..height {
        for x in 0..width {
            let c = if y < horizon {
                let t = (y * 255 / horizon.max(1)) as u8;
                rgb332_index(t / 3, t / 2 + 40, 200)
            } else if (x / 16 + y / 8) % 2 == 0 {
                rgb332_index(90, 140, 60)
            } else {
                rgb332_index(60, 110, 40)
            };
            bg.set(x as i32, y as i32, c);
        }
    }
    let post = rgb332_index(120, 80, 40);
    for px in (24..width).step_by(48) {
        for y in horizon.saturating_sub(30)..(horizon + 10).min(height) {
            for x in px..(px + 4).min(width) {
                bg.set(x as i32, y as i32, post);
            }
        }
    }
    bg
}

fn load_background(path: Option<PathBuf>, config: &ShadowboxConfig) -> PixelBuffer<u8> {
    if let Some(path) = path.or_else(pick_background) {
        match image::open(&path) {
            Ok(img) => {
                ::log::info!("Loaded background {}", path.display());
                return quantize(&img, config.screen_width, config.screen_height);
            }
            Err(e) => ::log::warn!("Failed to load {}: {}", path.display(), e),
        }
    }
    procedural_background(config.screen_width * 2, config.screen_height)
}

/// Copy the visible part of the scene into the screen buffer
fn copy_window(scene: &PixelBuffer<u8>, xstart: i32, screen: &mut PixelBuffer<u8>) {
    let start = xstart.max(0) as usize;
    for y in 0..screen.height() {
        let (Some(src), Some(dst)) = (scene.row(y), screen.row_mut(y)) else {
            continue;
        };
        if let Some(src) = src.get(start..) {
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }
}

fn indexed_to_rgba(screen: &PixelBuffer<u8>, palette: &Palette, out: &mut Vec<u8>) {
    out.clear();
    for y in 0..screen.height() {
        if let Some(row) = screen.row(y) {
            for &c in row {
                let [r, g, b] = palette.color(c);
                out.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }
}

fn draw_picture(texture: &Texture2D, fit: &Fit, source: Option<Rect>, w: usize, h: usize) {
    draw_texture_ex(
        texture,
        fit.x,
        fit.y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(Vec2::new(w as f32 * fit.scale, h as f32 * fit.scale)),
            source,
            ..Default::default()
        },
    );
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut verbose = false;
    let mut background_arg = None;
    for arg in std::env::args().skip(1) {
        if arg == "-v" || arg == "--verbose" {
            verbose = true;
        } else {
            background_arg = Some(PathBuf::from(arg));
        }
    }
    if ::log::set_logger(&LOGGER).is_ok() {
        ::log::set_max_level(if verbose {
            ::log::LevelFilter::Debug
        } else {
            ::log::LevelFilter::Info
        });
    }

    let config = load_viewer_config();
    let (screen_w, screen_h) = (config.screen_width, config.screen_height);
    let scene = load_background(background_arg, &config);
    let palette = Palette::rgb332();

    let mut sb = ShadowBox::new(config);
    sb.scene_loaded(DEMO_SCENE, scene.width());

    let mut screen = PixelBuffer::new(screen_w, screen_h);
    let max_xstart = scene.width().saturating_sub(screen_w) as i32;
    let mut xstart = 0;
    let ground = screen_h as i32 - 16;
    let mut actor = DemoActor {
        x: screen_w as f32 * 0.5,
        dir: 1.0,
        color: rgb332_index(230, 40, 40),
    };

    let mut rgba = Vec::new();
    let mut foil_rgba = Vec::new();
    let mut sprites: Vec<SpriteQuad> = Vec::new();
    let mut output_texture: Option<Texture2D> = None;

    println!("=== Shadowbox viewer ===");

    loop {
        if is_key_down(KeyCode::Left) {
            xstart -= SCROLL_SPEED;
        }
        if is_key_down(KeyCode::Right) {
            xstart += SCROLL_SPEED;
        }
        xstart = xstart.clamp(0, max_xstart);
        if is_key_down(KeyCode::Up) {
            sb.adjust_view_angle(ANGLE_STEP);
        }
        if is_key_down(KeyCode::Down) {
            sb.adjust_view_angle(-ANGLE_STEP);
        }

        copy_window(&scene, xstart, &mut screen);

        actor.step(scene.width());
        let placement = actor.placement(xstart, ground);
        match sb.actor_canvas(screen_w, screen_h) {
            Some(canvas) => {
                actor.draw(canvas, &placement);
                sb.actor_drawn(DEMO_ACTOR, placement, xstart, &palette);
            }
            None => actor.draw(&mut screen, &placement),
        }

        // Pointer in screen pixels
        let (pic_w, pic_h, units) = presented_size(sb.mode(), screen_w, screen_h);
        let fit = Fit::new(pic_w, pic_h);
        let (mx, my) = mouse_position();
        match fit.to_picture(mx, my, pic_w, pic_h) {
            Some((px, py)) => sb.set_pointer((px / units as i32) % screen_w as i32, py / units as i32),
            None => sb.clear_pointer(),
        }
        sb.set_paint_held(is_mouse_button_down(MouseButton::Middle));

        let frame = Frame {
            screen: &screen,
            palette: &palette,
            xstart,
        };
        while let Some(c) = get_char_pressed() {
            sb.handle_key(c, &frame);
        }

        let requests = sb.take_requests();
        if requests.output_resized || requests.full_redraw {
            output_texture = None;
        }

        // Mode may have changed above
        let (pic_w, pic_h, _) = presented_size(sb.mode(), screen_w, screen_h);
        let fit = Fit::new(pic_w, pic_h);

        let shown = sb.compose(&frame, fit.scale).map(|p| {
            rgb565_buffer_to_rgba(p.output, &mut rgba);
            sprites.clear();
            sprites.extend_from_slice(p.sprites);
            (p.rect, p.output.width(), p.output.height())
        });

        clear_background(BLACK);
        match shown {
            Some((rect, out_w, out_h)) => {
                let texture = output_texture.get_or_insert_with(|| {
                    let t = Texture2D::from_rgba8(out_w as u16, out_h as u16, &rgba);
                    t.set_filter(FilterMode::Nearest);
                    t
                });
                texture.update_from_bytes(out_w as u32, out_h as u32, &rgba);
                let source = Rect::new(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32);
                draw_picture(texture, &fit, Some(source), rect.w, rect.h);

                for quad in &sprites {
                    let Some(foil) = sb.foils().get(quad.actor) else { continue };
                    foil.to_rgba8(&mut foil_rgba);
                    let t = Texture2D::from_rgba8(foil.width() as u16, foil.height() as u16, &foil_rgba);
                    t.set_filter(FilterMode::Nearest);
                    draw_texture_ex(
                        &t,
                        fit.x + quad.x,
                        fit.y + quad.y,
                        WHITE,
                        DrawTextureParams {
                            dest_size: Some(Vec2::new(quad.w, quad.h)),
                            ..Default::default()
                        },
                    );
                }
            }
            None => {
                indexed_to_rgba(&screen, &palette, &mut rgba);
                let t = Texture2D::from_rgba8(screen_w as u16, screen_h as u16, &rgba);
                t.set_filter(FilterMode::Nearest);
                draw_picture(&t, &fit, None, screen_w, screen_h);
            }
        }

        let status = format!(
            "{}  angle {:.2}  x {}  sel {}{}",
            sb.mode().label(),
            sb.view_angle(),
            xstart,
            sb.editor().selection.count(),
            if sb.editor().is_painting() { "  PAINT" } else { "" },
        );
        draw_text(&status, 8.0, 20.0, 20.0, WHITE);

        next_frame().await;
    }
}
