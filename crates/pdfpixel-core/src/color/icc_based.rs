//! `/ICCBased` color spaces

use std::sync::Arc;

use log::warn;

use super::{ColorSpace, Converter, MAX_COMPONENTS, Sampler, SamplerKind};
use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::function::Interval;
use crate::icc::IccProfile;
use crate::transform::profile_to_srgb;

/// An ICC profile stream with its `/N`, `/Alternate` and `/Range` entries.
///
/// A profile that fails to parse, or whose channel count disagrees with
/// `/N`, is dropped with a warning and the space renders through the
/// alternate (or the device space with `N` components).
#[derive(Debug)]
pub struct IccBased {
    profile: Option<Arc<IccProfile>>,
    components: usize,
    alternate: Option<Arc<Converter>>,
    range: Option<Vec<Interval>>,
}

impl IccBased {
    pub fn new(components: usize, profile: &[u8], alternate: Option<Converter>) -> Result<Self> {
        if components == 0 || components > MAX_COMPONENTS {
            return Err(Error::InvalidColorSpace(format!("ICCBased /N {components}")));
        }
        if let Some(alt) = alternate.as_ref().filter(|alt| alt.components() != components) {
            return Err(Error::InvalidColorSpace(format!(
                "ICCBased /N {components} with a {}-component alternate",
                alt.components()
            )));
        }
        if alternate.is_none() && !matches!(components, 1 | 3 | 4) {
            return Err(Error::InvalidColorSpace(format!(
                "ICCBased /N {components} needs an /Alternate"
            )));
        }

        let profile = match IccProfile::parse(profile) {
            Ok(p) if p.input_channels() == components => Some(Arc::new(p)),
            Ok(p) => {
                warn!(
                    "ICC profile has {} channels but /N is {components}, ignoring it",
                    p.input_channels()
                );
                None
            }
            Err(err) => {
                warn!("ignoring unreadable ICC profile: {err}");
                None
            }
        };

        Ok(Self {
            profile,
            components,
            alternate: alternate.map(Arc::new),
            range: None,
        })
    }

    /// Set `/Range`; ignored unless it has one pair per component
    pub fn with_range(mut self, range: Vec<Interval>) -> Self {
        if range.len() == self.components {
            self.range = Some(range);
        } else {
            warn!("ICCBased /Range has {} pairs for /N {}", range.len(), self.components);
        }
        self
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn profile(&self) -> Option<&IccProfile> {
        self.profile.as_deref()
    }

    pub fn default_decode(&self) -> Vec<Interval> {
        self.range
            .clone()
            .unwrap_or_else(|| vec![(0.0, 1.0); self.components])
    }

    pub(crate) fn sampler(&self, intent: RenderingIntent) -> Sampler {
        if let Some(profile) = &self.profile {
            match profile_to_srgb(profile, intent) {
                // profile inputs are 0..1 over /Range, which is what samplers receive
                Ok(transform) => {
                    return Sampler::new(
                        self.components,
                        SamplerKind::Transform {
                            ranges: None,
                            transform,
                        },
                    );
                }
                Err(err) => warn!("ICC profile unusable for {intent:?}: {err}"),
            }
        }
        self.fallback(intent)
    }

    fn fallback(&self, intent: RenderingIntent) -> Sampler {
        if let Some(alt) = &self.alternate {
            return Sampler::new(self.components, SamplerKind::Delegate(alt.rgba_sampler(intent)));
        }
        let device = match self.components {
            1 => ColorSpace::DeviceGray,
            3 => ColorSpace::DeviceRgb,
            _ => ColorSpace::DeviceCmyk,
        };
        device.build_sampler(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_profile_falls_back_to_device() {
        let icc = IccBased::new(3, b"not a profile", None).unwrap();
        assert!(icc.profile().is_none());
        let s = icc.sampler(RenderingIntent::default());
        assert_eq!(s.sample(&[0.2, 0.4, 0.6]), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn test_falls_back_to_alternate() {
        let alt = Converter::new(ColorSpace::DeviceCmyk);
        let icc = IccBased::new(4, &[], Some(alt)).unwrap();
        let s = icc.sampler(RenderingIntent::default());
        assert_eq!(s.sample(&[0.0, 0.0, 0.0, 1.0]), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unusual_n_needs_alternate() {
        assert!(IccBased::new(2, &[], None).is_err());
        assert!(IccBased::new(0, &[], None).is_err());
        let alt = Converter::new(ColorSpace::DeviceRgb);
        assert!(IccBased::new(1, &[], Some(alt)).is_err());
    }

    #[test]
    fn test_range_sets_default_decode() {
        let icc = IccBased::new(3, &[], None)
            .unwrap()
            .with_range(vec![(0.0, 100.0), (-128.0, 127.0), (-128.0, 127.0)]);
        assert_eq!(icc.default_decode()[0], (0.0, 100.0));
        let short = IccBased::new(3, &[], None).unwrap().with_range(vec![(0.0, 2.0)]);
        assert_eq!(short.default_decode(), vec![(0.0, 1.0); 3]);
    }
}
