//! `/Indexed` color spaces

use std::sync::Arc;

use log::warn;

use super::{Converter, Sampler, SamplerKind};
use crate::config::RenderingIntent;
use crate::error::{Error, Result};

/// A palette over a base space. Lookup bytes are `hival + 1` entries of
/// `base.components()` bytes each, scaled over the base's default decode.
#[derive(Debug)]
pub struct Indexed {
    base: Arc<Converter>,
    hival: usize,
    lookup: Vec<u8>,
}

impl Indexed {
    pub fn new(base: Converter, hival: usize, mut lookup: Vec<u8>) -> Result<Self> {
        if hival > 255 {
            return Err(Error::InvalidColorSpace(format!("Indexed hival {hival}")));
        }
        if base.space().is_indexed() {
            return Err(Error::InvalidColorSpace("Indexed base cannot be Indexed".into()));
        }
        let needed = (hival + 1) * base.components();
        if lookup.len() < needed {
            warn!("Indexed lookup has {} of {needed} bytes, padding with zeros", lookup.len());
        }
        lookup.resize(needed, 0);
        Ok(Self {
            base: Arc::new(base),
            hival,
            lookup,
        })
    }

    pub fn hival(&self) -> usize {
        self.hival
    }

    pub fn base(&self) -> &Converter {
        &self.base
    }

    /// Resolve every palette entry through the base sampler
    pub fn palette(&self, intent: RenderingIntent) -> Vec<[f32; 4]> {
        let base = self.base.rgba_sampler(intent);
        let n = self.base.components();
        let mut comps = Vec::with_capacity(n);
        self.lookup
            .chunks_exact(n)
            .map(|entry| {
                comps.clear();
                comps.extend(entry.iter().map(|&b| f32::from(b) / 255.0));
                base.sample(&comps)
            })
            .collect()
    }

    pub(crate) fn sampler(&self, intent: RenderingIntent) -> Sampler {
        Sampler::new(1, SamplerKind::Palette(self.palette(intent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorSpace;

    #[test]
    fn test_rgb_palette() {
        let idx = Indexed::new(
            Converter::new(ColorSpace::DeviceRgb),
            1,
            vec![255, 0, 0, 0, 0, 255],
        )
        .unwrap();
        let palette = idx.palette(RenderingIntent::default());
        assert_eq!(palette, vec![[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_short_lookup_padded() {
        let idx = Indexed::new(Converter::new(ColorSpace::DeviceGray), 3, vec![255]).unwrap();
        let palette = idx.palette(RenderingIntent::default());
        assert_eq!(palette.len(), 4);
        assert_eq!(palette[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_invalid_hival() {
        assert!(Indexed::new(Converter::new(ColorSpace::DeviceGray), 256, vec![]).is_err());
    }

    #[test]
    fn test_sampler_maps_normalized_index() {
        let idx = Indexed::new(Converter::new(ColorSpace::DeviceGray), 2, vec![0, 128, 255]).unwrap();
        let s = idx.sampler(RenderingIntent::default());
        assert_eq!(s.sample(&[1.0]), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(s.sample(&[0.0]), [0.0, 0.0, 0.0, 1.0]);
    }
}
