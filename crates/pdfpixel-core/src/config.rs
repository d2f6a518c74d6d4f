//! Decode Options and Rendering Intent
//!
//! Configuration shared by the filter chain, the color converters and the
//! image row processor.

/// Rendering intent for color conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingIntent {
    /// Perceptual - best for photos, maintains relative appearance
    Perceptual,
    /// Relative colorimetric - the PDF default
    #[default]
    RelativeColorimetric,
    /// Saturation - maintains saturation, good for business graphics
    Saturation,
    /// Absolute colorimetric - preserves white point
    AbsoluteColorimetric,
}

impl RenderingIntent {
    /// All intents, in ICC numbering order
    pub const ALL: [Self; 4] = [
        Self::Perceptual,
        Self::RelativeColorimetric,
        Self::Saturation,
        Self::AbsoluteColorimetric,
    ];

    /// Parse a PDF `/Intent` name. Unknown names map to the default.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Perceptual" => Self::Perceptual,
            "RelativeColorimetric" => Self::RelativeColorimetric,
            "Saturation" => Self::Saturation,
            "AbsoluteColorimetric" => Self::AbsoluteColorimetric,
            _ => {
                log::debug!("unknown rendering intent /{name}, using RelativeColorimetric");
                Self::default()
            }
        }
    }

    /// Convert from ICC rendering intent value
    pub fn from_icc(value: u32) -> Self {
        match value {
            0 => Self::Perceptual,
            1 => Self::RelativeColorimetric,
            2 => Self::Saturation,
            3 => Self::AbsoluteColorimetric,
            _ => Self::Perceptual,
        }
    }

    /// Convert to ICC rendering intent value
    pub fn to_icc(&self) -> u32 {
        match self {
            Self::Perceptual => 0,
            Self::RelativeColorimetric => 1,
            Self::Saturation => 2,
            Self::AbsoluteColorimetric => 3,
        }
    }

    /// Slot index used by per-intent caches
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.to_icc() as usize
    }
}

/// Pixel limit applied when no options say otherwise
pub const DEFAULT_MAX_PIXELS: usize = 1 << 28;

/// Options for decoding a single image
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Rendering intent used when the image does not carry one
    pub intent: RenderingIntent,
    /// Minimum pixel count before rows are processed in parallel
    pub parallel_threshold: usize,
    /// Images with more pixels than this are rejected before allocation
    pub max_pixels: usize,
    /// Allow direct pass-through for 8-bit gray and RGB images
    pub allow_fast_path: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            intent: RenderingIntent::default(),
            parallel_threshold: 64 * 1024,
            max_pixels: DEFAULT_MAX_PIXELS,
            allow_fast_path: true,
        }
    }
}

impl DecodeOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rendering intent
    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Set the pixel count at which row processing goes parallel
    pub fn with_parallel_threshold(mut self, pixels: usize) -> Self {
        self.parallel_threshold = pixels;
        self
    }

    /// Process every image sequentially
    pub fn sequential(mut self) -> Self {
        self.parallel_threshold = usize::MAX;
        self
    }

    /// Set the pixel limit
    pub fn with_max_pixels(mut self, pixels: usize) -> Self {
        self.max_pixels = pixels;
        self
    }

    /// Force the full conversion path for every image
    pub fn without_fast_path(mut self) -> Self {
        self.allow_fast_path = false;
        self
    }
}
