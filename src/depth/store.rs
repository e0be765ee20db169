//! Depth map persistence
//!
//! One 8-bit paletted BMP per scene: `<dir>/<game_id>__room_depth_<scene>.bmp`.
//! On load each palette index's red channel is the height. Files we write
//! carry an identity gray ramp, which is also how we recognise them again:
//! for those, a stored 0 ("no height") survives the round trip. Any other
//! palette gets 0 coerced to 1.
//!
//! An 8-bit grayscale BMP from a paint program usually carries the same
//! identity ramp, so it is read as one of ours and its zeros stay "no
//! height". Paint 1 or above for ground that should occlude.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::{BmpDecoder, BmpEncoder};
use image::{ColorType, ExtendedColorType, ImageDecoder};

use super::DepthMap;
use crate::raster::{Palette, PALETTE_SIZE};

/// Error type for depth map loading and saving
#[derive(Debug)]
pub enum DepthMapError {
    IoError(std::io::Error),
    ImageError(image::ImageError),
    /// The file decoded, but has no palette
    NotPaletted,
    Unsupported(String),
}

impl From<std::io::Error> for DepthMapError {
    fn from(e: std::io::Error) -> Self {
        DepthMapError::IoError(e)
    }
}

impl From<image::ImageError> for DepthMapError {
    fn from(e: image::ImageError) -> Self {
        DepthMapError::ImageError(e)
    }
}

impl std::fmt::Display for DepthMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepthMapError::IoError(e) => write!(f, "IO error: {}", e),
            DepthMapError::ImageError(e) => write!(f, "Image error: {}", e),
            DepthMapError::NotPaletted => {
                write!(f, "depth images should be 8-bit grayscale (paletted) BMP")
            }
            DepthMapError::Unsupported(s) => write!(f, "Unsupported depth image: {}", s),
        }
    }
}

impl std::error::Error for DepthMapError {}

/// Decode an 8-bit paletted BMP into a depth map
pub fn decode_depth_bmp<R: BufRead + Seek>(reader: R) -> Result<DepthMap, DepthMapError> {
    let mut decoder = BmpDecoder::new(reader)?;
    decoder.set_indexed_color(true);

    let palette = match decoder.get_palette() {
        Some(colors) => colors.to_vec(),
        None => return Err(DepthMapError::NotPaletted),
    };
    if decoder.color_type() != ColorType::L8 {
        return Err(DepthMapError::Unsupported(format!(
            "expected 8-bit indices, got {:?}",
            decoder.color_type()
        )));
    }

    let (w, h) = decoder.dimensions();
    let mut indices = vec![0u8; decoder.total_bytes() as usize];
    decoder.read_image(&mut indices)?;

    let palette_in_file = Palette::from_colors(&palette);
    let own_format = palette.len() == PALETTE_SIZE && palette_in_file.is_grayscale_identity();

    DepthMap::from_indexed(w as usize, h as usize, &indices, &palette_in_file, own_format)
        .ok_or_else(|| DepthMapError::Unsupported(format!("pixel data does not match {}x{}", w, h)))
}

/// Encode a depth map as an 8-bit BMP with an identity gray palette
pub fn encode_depth_bmp<W: Write>(map: &DepthMap, writer: &mut W) -> Result<(), DepthMapError> {
    let ramp = DepthMap::viewing_palette();
    let mut encoder = BmpEncoder::new(writer);
    encoder.encode_with_palette(
        &map.to_vec(),
        map.width() as u32,
        map.height() as u32,
        ExtendedColorType::L8,
        Some(ramp.colors().as_slice()),
    )?;
    Ok(())
}

/// Where depth maps live on disk
#[derive(Debug, Clone)]
pub struct DepthStore {
    dir: PathBuf,
    game_id: String,
}

impl DepthStore {
    pub fn new<P: AsRef<Path>>(dir: P, game_id: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            game_id: game_id.to_string(),
        }
    }

    /// File holding the depth map for `scene`
    pub fn path_for(&self, scene: u32) -> PathBuf {
        self.dir
            .join(format!("{}__room_depth_{}.bmp", self.game_id, scene))
    }

    pub fn exists(&self, scene: u32) -> bool {
        self.path_for(scene).is_file()
    }

    pub fn load(&self, scene: u32) -> Result<DepthMap, DepthMapError> {
        let path = self.path_for(scene);
        log::info!("Loading depth map: {}", path.display());
        let file = File::open(&path)?;
        decode_depth_bmp(BufReader::new(file))
    }

    /// Write the map for `scene`, creating the directory if needed
    pub fn save(&self, scene: u32, map: &DepthMap) -> Result<PathBuf, DepthMapError> {
        let path = self.path_for(scene);
        log::info!("Saving depth map: {}", path.display());
        fs::create_dir_all(&self.dir)?;
        let mut out = BufWriter::new(File::create(&path)?);
        encode_depth_bmp(map, &mut out)?;
        out.flush()?;
        Ok(path)
    }
}
