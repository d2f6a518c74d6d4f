//! Color Space Converters
//!
//! [`ColorSpace`] is the closed set of PDF color spaces. A [`Converter`]
//! wraps one and hands out [`Sampler`]s that map normalized component
//! values to RGBA, caching one sampler per rendering intent.
//!
//! Sampler inputs are always normalized to `0.0..=1.0` over the space's
//! [`default_decode`](ColorSpace::default_decode) ranges. For Lab this
//! means `L / 100` and `(a - amin) / (amax - amin)`; for Indexed it means
//! `index / hival`.

pub mod cie;
mod icc_based;
mod indexed;
mod sampler;
mod special;

pub use cie::{CalGray, CalRgb, LabSpace};
pub use icc_based::IccBased;
pub use indexed::Indexed;
pub use sampler::Sampler;
pub use special::{DeviceN, Separation};

pub(crate) use sampler::SamplerKind;

use std::sync::{Arc, OnceLock};

use log::debug;

use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::function::Interval;
use crate::transform::ColorTransform;

/// Maximum number of components a color space may have
pub const MAX_COMPONENTS: usize = 32;

/// A PDF color space
#[derive(Debug)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray(CalGray),
    CalRgb(CalRgb),
    Lab(LabSpace),
    IccBased(IccBased),
    Indexed(Indexed),
    Separation(Separation),
    DeviceN(DeviceN),
}

impl ColorSpace {
    /// Resolve a parameterless color space name, including the inline
    /// image abbreviations
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "DeviceGray" | "G" => Ok(Self::DeviceGray),
            "DeviceRGB" | "RGB" => Ok(Self::DeviceRgb),
            "DeviceCMYK" | "CMYK" => Ok(Self::DeviceCmyk),
            other => Err(Error::InvalidColorSpace(format!(
                "/{other} needs parameters or is unknown"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::CalGray(_) => "CalGray",
            Self::CalRgb(_) => "CalRGB",
            Self::Lab(_) => "Lab",
            Self::IccBased(_) => "ICCBased",
            Self::Indexed(_) => "Indexed",
            Self::Separation(_) => "Separation",
            Self::DeviceN(_) => "DeviceN",
        }
    }

    /// Number of color components per sample
    pub fn components(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray(_) | Self::Indexed(_) | Self::Separation(_) => 1,
            Self::DeviceRgb | Self::CalRgb(_) | Self::Lab(_) => 3,
            Self::DeviceCmyk => 4,
            Self::IccBased(icc) => icc.components(),
            Self::DeviceN(n) => n.components(),
        }
    }

    /// True for DeviceGray, DeviceRGB and DeviceCMYK
    pub fn is_device(&self) -> bool {
        matches!(self, Self::DeviceGray | Self::DeviceRgb | Self::DeviceCmyk)
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }

    /// Component ranges a sampler input of `0.0` and `1.0` correspond to
    pub fn default_decode(&self) -> Vec<Interval> {
        match self {
            Self::Lab(lab) => lab.default_decode(),
            Self::IccBased(icc) => icc.default_decode(),
            Self::Indexed(indexed) => vec![(0.0, indexed.hival() as f32)],
            _ => vec![(0.0, 1.0); self.components()],
        }
    }

    fn build_sampler(&self, intent: RenderingIntent) -> Sampler {
        let n = self.components();
        match self {
            Self::DeviceGray => Sampler::new(1, SamplerKind::Gray),
            Self::DeviceRgb => Sampler::new(3, SamplerKind::Rgb),
            Self::DeviceCmyk => Sampler::new(4, SamplerKind::Cmyk),
            Self::CalGray(cal) => Sampler::new(
                n,
                SamplerKind::Transform {
                    ranges: None,
                    transform: cal.transform(),
                },
            ),
            Self::CalRgb(cal) => Sampler::new(
                n,
                SamplerKind::Transform {
                    ranges: None,
                    transform: cal.transform(),
                },
            ),
            Self::Lab(lab) => Sampler::new(
                n,
                SamplerKind::Transform {
                    ranges: Some(lab.default_decode()),
                    transform: lab.transform(),
                },
            ),
            Self::IccBased(icc) => icc.sampler(intent),
            Self::Indexed(indexed) => indexed.sampler(intent),
            Self::Separation(sep) => sep.sampler(intent),
            Self::DeviceN(devn) => devn.sampler(intent),
        }
    }
}

/// A color space with its per-intent sampler cache
#[derive(Debug)]
pub struct Converter {
    space: ColorSpace,
    samplers: [OnceLock<Arc<Sampler>>; 4],
}

impl Converter {
    pub fn new(space: ColorSpace) -> Self {
        Self {
            space,
            samplers: Default::default(),
        }
    }

    pub fn space(&self) -> &ColorSpace {
        &self.space
    }

    pub fn components(&self) -> usize {
        self.space.components()
    }

    pub fn is_device(&self) -> bool {
        self.space.is_device()
    }

    pub fn default_decode(&self) -> Vec<Interval> {
        self.space.default_decode()
    }

    /// The sampler for `intent`, built on first use
    pub fn rgba_sampler(&self, intent: RenderingIntent) -> Arc<Sampler> {
        let sampler = self.samplers[intent.index()].get_or_init(|| {
            debug!("building {} sampler for {intent:?}", self.space.name());
            Arc::new(self.space.build_sampler(intent))
        });
        assert_eq!(
            sampler.components(),
            self.components(),
            "{} sampler component count",
            self.space.name()
        );
        Arc::clone(sampler)
    }

    /// An uncached sampler that runs `post` on the RGB result
    pub fn sampler_with_post(&self, intent: RenderingIntent, post: ColorTransform) -> Sampler {
        Sampler::new(self.components(), SamplerKind::Delegate(self.rgba_sampler(intent))).with_post(post)
    }

    /// Build the sampler for `intent` now, before it is shared across threads
    pub fn prepare(&self, intent: RenderingIntent) {
        self.rgba_sampler(intent);
    }
}

impl From<ColorSpace> for Converter {
    fn from(space: ColorSpace) -> Self {
        Self::new(space)
    }
}
