//! Image descriptors

use std::sync::Arc;

use crate::color::Converter;
use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::function::Interval;

/// Everything needed to interpret an image's decoded sample rows.
///
/// Built once with the consuming `with_*` methods and then shared
/// read-only by the row processor.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    width: usize,
    height: usize,
    bits_per_component: u8,
    color_space: Option<Arc<Converter>>,
    decode: Option<Vec<Interval>>,
    color_key: Option<Vec<(u32, u32)>>,
    matte: Option<Vec<f32>>,
    is_image_mask: bool,
    is_soft_mask: bool,
    intent: Option<RenderingIntent>,
}

impl ImageDescriptor {
    pub fn new(width: usize, height: usize, bits_per_component: u8) -> Self {
        Self {
            width,
            height,
            bits_per_component,
            color_space: None,
            decode: None,
            color_key: None,
            matte: None,
            is_image_mask: false,
            is_soft_mask: false,
            intent: None,
        }
    }

    pub fn with_color_space(mut self, converter: Arc<Converter>) -> Self {
        self.color_space = Some(converter);
        self
    }

    /// `/Decode`, one interval per component
    pub fn with_decode(mut self, decode: Vec<Interval>) -> Self {
        self.decode = Some(decode);
        self
    }

    /// Color-key `/Mask`: one inclusive range per component, in raw codes
    pub fn with_color_key(mut self, ranges: Vec<(u32, u32)>) -> Self {
        self.color_key = Some(ranges);
        self
    }

    /// `/Matte` of a soft mask, in the parent image's color space
    pub fn with_matte(mut self, matte: Vec<f32>) -> Self {
        self.matte = Some(matte);
        self
    }

    /// Mark as a stencil mask (`/ImageMask true`)
    pub fn image_mask(mut self) -> Self {
        self.is_image_mask = true;
        self
    }

    /// Mark as a soft mask (`/SMask` image)
    pub fn soft_mask(mut self) -> Self {
        self.is_soft_mask = true;
        self
    }

    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bits_per_component(&self) -> u8 {
        self.bits_per_component
    }

    pub fn color_space(&self) -> Option<&Arc<Converter>> {
        self.color_space.as_ref()
    }

    pub fn decode(&self) -> Option<&[Interval]> {
        self.decode.as_deref()
    }

    pub fn color_key(&self) -> Option<&[(u32, u32)]> {
        self.color_key.as_deref()
    }

    pub fn matte(&self) -> Option<&[f32]> {
        self.matte.as_deref()
    }

    pub fn is_image_mask(&self) -> bool {
        self.is_image_mask
    }

    pub fn is_soft_mask(&self) -> bool {
        self.is_soft_mask
    }

    pub fn intent(&self) -> Option<RenderingIntent> {
        self.intent
    }

    pub fn is_mask(&self) -> bool {
        self.is_image_mask || self.is_soft_mask
    }

    /// Components per sample: 1 for masks, otherwise the color space's
    pub fn components(&self) -> usize {
        if self.is_mask() {
            return 1;
        }
        self.color_space.as_ref().map_or(1, |cs| cs.components())
    }

    /// Largest raw code, `2^bpc - 1`
    pub fn max_code(&self) -> u32 {
        (1u32 << self.bits_per_component) - 1
    }

    /// Entries in a per-code lookup table; 16-bit samples index by high byte
    pub fn lut_size(&self) -> usize {
        1 << self.bits_per_component.min(8)
    }

    /// Bytes in one packed sample row
    pub fn row_bytes(&self) -> usize {
        (self.width * self.components() * self.bits_per_component as usize).div_ceil(8)
    }

    /// The `/Decode` an image of this space has when none is given
    pub fn default_decode(&self) -> Vec<Interval> {
        match &self.color_space {
            Some(cs) if cs.space().is_indexed() && !self.is_mask() => {
                vec![(0.0, self.max_code() as f32)]
            }
            Some(cs) if !self.is_mask() => cs.default_decode(),
            _ => vec![(0.0, 1.0)],
        }
    }

    /// True when `/Decode` is absent or equal to the default
    pub fn has_default_decode(&self) -> bool {
        self.decode.as_ref().is_none_or(|d| *d == self.default_decode())
    }

    /// Check the descriptor is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidImage(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(Error::Unsupported(format!(
                "{} bits per component",
                self.bits_per_component
            )));
        }
        if self.is_image_mask && self.bits_per_component != 1 {
            return Err(Error::InvalidImage(format!(
                "image mask with {} bits per component",
                self.bits_per_component
            )));
        }
        if self.is_image_mask && self.is_soft_mask {
            return Err(Error::InvalidImage("both image mask and soft mask".into()));
        }
        match &self.color_space {
            None if !self.is_mask() => {
                return Err(Error::InvalidImage("image without a color space".into()));
            }
            Some(cs) if cs.space().is_indexed() && self.bits_per_component > 8 => {
                return Err(Error::InvalidImage("16-bit Indexed image".into()));
            }
            _ => {}
        }
        let n = self.components();
        if let Some(decode) = self.decode.as_ref().filter(|d| d.len() != n) {
            return Err(Error::InvalidImage(format!(
                "/Decode has {} pairs for {n} components",
                decode.len()
            )));
        }
        if let Some(key) = self.color_key.as_ref().filter(|k| k.len() != n) {
            return Err(Error::InvalidImage(format!(
                "color-key /Mask has {} ranges for {n} components",
                key.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorSpace, Indexed};

    fn rgb() -> Arc<Converter> {
        Arc::new(Converter::new(ColorSpace::DeviceRgb))
    }

    #[test]
    fn test_row_bytes() {
        let d = ImageDescriptor::new(10, 1, 4).with_color_space(rgb());
        assert_eq!(d.row_bytes(), 15);
        let mask = ImageDescriptor::new(9, 1, 1).image_mask();
        assert_eq!(mask.row_bytes(), 2);
        assert_eq!(mask.components(), 1);
    }

    #[test]
    fn test_lut_size_and_max_code() {
        let d = ImageDescriptor::new(1, 1, 16).with_color_space(rgb());
        assert_eq!((d.lut_size(), d.max_code()), (256, 65535));
        let d = ImageDescriptor::new(1, 1, 2).with_color_space(rgb());
        assert_eq!((d.lut_size(), d.max_code()), (4, 3));
    }

    #[test]
    fn test_validate() {
        assert!(ImageDescriptor::new(1, 1, 8).with_color_space(rgb()).validate().is_ok());
        assert!(ImageDescriptor::new(1, 1, 8).validate().is_err());
        assert!(ImageDescriptor::new(1, 1, 3).with_color_space(rgb()).validate().is_err());
        assert!(ImageDescriptor::new(1, 1, 8).image_mask().validate().is_err());
        assert!(
            ImageDescriptor::new(1, 1, 8)
                .with_color_space(rgb())
                .with_decode(vec![(0.0, 1.0)])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_indexed_default_decode() {
        let indexed = Indexed::new(Converter::new(ColorSpace::DeviceGray), 3, vec![0, 1, 2, 3]).unwrap();
        let d = ImageDescriptor::new(1, 1, 4).with_color_space(Arc::new(Converter::new(ColorSpace::Indexed(indexed))));
        assert_eq!(d.default_decode(), vec![(0.0, 15.0)]);
        assert!(d.clone().with_decode(vec![(0.0, 15.0)]).has_default_decode());
        assert!(!d.with_decode(vec![(15.0, 0.0)]).has_default_decode());
    }
}
