// Font and logo loading
//
// Nothing in here fails a build: a font that cannot be read or parsed falls
// back to the builtin Helvetica, and a logo that cannot be decoded is simply
// left out of the header.

use ::image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Advance width of one character of the builtin font, in ems
const BUILTIN_CHAR_WIDTH_EM: f32 = 0.5;

/// Advance used for characters an embedded font has no glyph for, in ems
const MISSING_GLYPH_WIDTH_EM: f32 = 0.5;

// ============================================================================
// Error Handling
// ============================================================================

/// Why an asset could not be fetched. Only ever logged.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to fetch URL: {0}")]
    Fetch(String),
    #[error("Failed to read response: {0}")]
    Response(std::io::Error),
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ============================================================================
// Handles
// ============================================================================

/// A parsed TrueType/OpenType program with its horizontal metrics. The face
/// is parsed once; measuring text only looks up cached advances.
pub struct EmbeddedFont {
    data: Vec<u8>,
    units_per_em: f32,
    advances: HashMap<char, u16>,
}

impl EmbeddedFont {
    pub fn parse(data: Vec<u8>) -> Result<Self, ttf_parser::FaceParsingError> {
        let (units_per_em, advances) = {
            let face = ttf_parser::Face::parse(&data, 0)?;
            let mut advances = HashMap::new();
            if let Some(cmap) = face.tables().cmap {
                for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                    subtable.codepoints(|code| {
                        let Some(c) = char::from_u32(code) else {
                            return;
                        };
                        if let Some(advance) = face
                            .glyph_index(c)
                            .and_then(|glyph| face.glyph_hor_advance(glyph))
                        {
                            advances.entry(c).or_insert(advance);
                        }
                    });
                }
            }
            (face.units_per_em().max(1) as f32, advances)
        };

        Ok(Self {
            data,
            units_per_em,
            advances,
        })
    }

    /// The font program as loaded, for embedding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of characters the font maps to a glyph.
    pub fn mapped_chars(&self) -> usize {
        self.advances.len()
    }

    /// Horizontal advance of `c` in ems, if the font has a glyph for it.
    pub fn advance(&self, c: char) -> Option<f32> {
        self.advances
            .get(&c)
            .map(|&units| f32::from(units) / self.units_per_em)
    }
}

/// Font used for every text run of a document.
#[derive(Clone)]
pub enum FontHandle {
    /// TrueType/OpenType program embedded into the output
    Embedded(Arc<EmbeddedFont>),
    /// PDF base-14 Helvetica, always available
    Builtin,
}

impl FontHandle {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontHandle::Builtin)
    }

    pub fn measure(&self, text: &str, size: f32) -> f32 {
        measure_text(self, text, size)
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontHandle::Embedded(font) => {
                write!(f, "FontHandle::Embedded({} bytes)", font.data().len())
            }
            FontHandle::Builtin => write!(f, "FontHandle::Builtin"),
        }
    }
}

/// Decoded logo, composited against white and ready to embed.
#[derive(Clone)]
pub struct ImageHandle {
    width_px: u32,
    height_px: u32,
    rgb: Arc<Vec<u8>>,
}

impl ImageHandle {
    fn from_image(image: &DynamicImage) -> Self {
        let rgba_image = image.to_rgba8();
        let (width_px, height_px) = rgba_image.dimensions();

        let mut rgb_image = RgbImage::new(width_px, height_px);
        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let alpha = a as f32 / 255.0;
            let bg = 255.0;
            let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
            let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
            let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
            rgb_image.put_pixel(x, y, Rgb([out_r, out_g, out_b]));
        }

        Self {
            width_px,
            height_px,
            rgb: Arc::new(rgb_image.into_raw()),
        }
    }

    /// Pixel dimensions of the decoded image.
    pub fn natural_size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgb
    }

    /// Largest size fitting inside `max_width` x `max_height` that keeps the
    /// natural aspect ratio.
    pub fn scale_to_fit(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        if self.width_px == 0 || self.height_px == 0 {
            return (0.0, 0.0);
        }
        let aspect_ratio = self.width_px as f32 / self.height_px as f32;
        if max_width / max_height > aspect_ratio {
            // Height-constrained
            (max_height * aspect_ratio, max_height)
        } else {
            // Width-constrained
            (max_width, max_width / aspect_ratio)
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Width of `text` set at `size` points in `font`.
///
/// Left-to-right advance widths only; no kerning or shaping.
pub fn measure_text(font: &FontHandle, text: &str, size: f32) -> f32 {
    match font {
        FontHandle::Builtin => text.chars().count() as f32 * BUILTIN_CHAR_WIDTH_EM * size,
        FontHandle::Embedded(embedded) => {
            let ems: f32 = text
                .chars()
                .map(|c| embedded.advance(c).unwrap_or(MISSING_GLYPH_WIDTH_EM))
                .sum();
            ems * size
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Where a font or logo comes from.
#[derive(Debug, Clone)]
pub enum AssetSource {
    Bytes {
        data: Vec<u8>,
        mime: Option<String>,
    },
    Path(PathBuf),
    Url(String),
}

/// Raw asset bytes plus whatever content type the source reported.
#[derive(Debug)]
pub struct FetchedAsset {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl AssetSource {
    /// Interprets a command-line style location: http(s) URLs are fetched,
    /// anything else is a file path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            AssetSource::Url(location.to_string())
        } else {
            AssetSource::Path(PathBuf::from(location))
        }
    }

    pub fn fetch(&self) -> Result<FetchedAsset, AssetError> {
        match self {
            AssetSource::Bytes { data, mime } => Ok(FetchedAsset {
                data: data.clone(),
                content_type: mime.clone(),
            }),
            AssetSource::Path(path) => {
                let data = std::fs::read(path).map_err(|source| AssetError::File {
                    path: path.clone(),
                    source,
                })?;
                Ok(FetchedAsset {
                    data,
                    content_type: mime_from_extension(path).map(str::to_string),
                })
            }
            AssetSource::Url(url) => {
                let response = ureq::get(url)
                    .call()
                    .map_err(|e| AssetError::Fetch(e.to_string()))?;
                let content_type = Some(response.content_type().to_string());

                let mut data = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut data)
                    .map_err(AssetError::Response)?;
                Ok(FetchedAsset { data, content_type })
            }
        }
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Asset locations for one document family.
#[derive(Debug, Clone, Default)]
pub struct AssetConfig {
    pub font: Option<AssetSource>,
    pub logo: Option<AssetSource>,
}

// ============================================================================
// Asset Manager
// ============================================================================

static SHARED: OnceCell<Arc<AssetManager>> = OnceCell::new();

/// Loaded font and logo, shared read-only by every page of a document and
/// by any number of concurrent builders.
#[derive(Debug, Clone)]
pub struct AssetManager {
    font: FontHandle,
    logo: Option<ImageHandle>,
}

impl AssetManager {
    pub fn new(font: FontHandle, logo: Option<ImageHandle>) -> Self {
        Self { font, logo }
    }

    /// Builtin font, no logo.
    pub fn builtin() -> Self {
        Self::new(FontHandle::Builtin, None)
    }

    /// Fetches and decodes everything `config` points at, degrading on any
    /// failure.
    pub fn load(config: &AssetConfig) -> Self {
        let font = match &config.font {
            Some(source) => match source.fetch() {
                Ok(fetched) => Self::load_font(Some(&fetched.data)),
                Err(e) => {
                    warn!("Font unavailable, using builtin Helvetica: {}", e);
                    FontHandle::Builtin
                }
            },
            None => FontHandle::Builtin,
        };

        let logo = match &config.logo {
            Some(source) => match source.fetch() {
                Ok(fetched) => {
                    // Non-image content types (e.g. a bare text/plain from a
                    // web server) are ignored in favour of sniffing.
                    let hint = fetched
                        .content_type
                        .as_deref()
                        .filter(|mime| mime.starts_with("image/"))
                        .unwrap_or("");
                    Self::load_logo(&fetched.data, hint)
                }
                Err(e) => {
                    warn!("Logo unavailable, header will omit it: {}", e);
                    None
                }
            },
            None => None,
        };

        Self::new(font, logo)
    }

    /// Process-wide manager. The first caller's configuration is loaded
    /// exactly once; later callers get the same instance.
    pub fn shared(config: &AssetConfig) -> Arc<AssetManager> {
        SHARED
            .get_or_init(|| Arc::new(AssetManager::load(config)))
            .clone()
    }

    pub fn load_font(source: Option<&[u8]>) -> FontHandle {
        match source {
            Some(data) => match EmbeddedFont::parse(data.to_vec()) {
                Ok(font) => {
                    debug!(
                        "Loaded font mapping {} characters ({} bytes)",
                        font.mapped_chars(),
                        data.len()
                    );
                    FontHandle::Embedded(Arc::new(font))
                }
                Err(e) => {
                    warn!("Invalid font data, using builtin Helvetica: {}", e);
                    FontHandle::Builtin
                }
            },
            None => FontHandle::Builtin,
        }
    }

    /// Decodes a PNG (`image/png`) or JPEG (any other hint). An empty hint
    /// sniffs the format from the bytes.
    pub fn load_logo(data: &[u8], mime_hint: &str) -> Option<ImageHandle> {
        let decoded = if mime_hint.trim().is_empty() {
            ::image::load_from_memory(data)
        } else if mime_hint.trim().eq_ignore_ascii_case("image/png") {
            ::image::load_from_memory_with_format(data, ImageFormat::Png)
        } else {
            ::image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        };

        match decoded {
            Ok(image) => Some(ImageHandle::from_image(&image)),
            Err(e) => {
                warn!("Failed to decode logo, header will omit it: {}", e);
                None
            }
        }
    }

    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    pub fn logo(&self) -> Option<&ImageHandle> {
        self.logo.as_ref()
    }
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::builtin()
    }
}
