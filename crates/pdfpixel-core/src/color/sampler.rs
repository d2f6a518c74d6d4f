//! Samplers: normalized components in, RGBA out

use std::sync::Arc;

use log::trace;
use smallvec::SmallVec;

use crate::function::{Interval, PdfFunction};
use crate::transform::ColorTransform;

/// Neutral gray used when a tint transform cannot be evaluated
const FALLBACK_GRAY: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

#[derive(Debug)]
pub(crate) enum SamplerKind {
    Gray,
    Rgb,
    Cmyk,
    /// Scale inputs from `0..1` onto `ranges`, then run the transform
    Transform {
        ranges: Option<Vec<Interval>>,
        transform: ColorTransform,
    },
    Palette(Vec<[f32; 4]>),
    Tint {
        function: Arc<PdfFunction>,
        /// Default decode of the alternate space, for normalizing outputs
        alternate_ranges: Vec<Interval>,
        alternate: Arc<Sampler>,
    },
    Delegate(Arc<Sampler>),
    Transparent,
    InvertedGray,
}

/// Maps one pixel's components, each normalized to `0.0..=1.0` over the
/// space's default decode ranges, to RGBA.
///
/// Results are nominally in `0.0..=1.0`; callers clamp and scale.
#[derive(Debug)]
pub struct Sampler {
    components: usize,
    kind: SamplerKind,
    post: ColorTransform,
}

impl Sampler {
    pub(crate) fn new(components: usize, kind: SamplerKind) -> Self {
        Self {
            components,
            kind,
            post: ColorTransform::Identity,
        }
    }

    pub(crate) fn with_post(mut self, post: ColorTransform) -> Self {
        self.post = post;
        self
    }

    /// Input components this sampler expects
    pub fn components(&self) -> usize {
        self.components
    }

    /// The resolved palette of an Indexed space
    pub fn palette(&self) -> Option<&[[f32; 4]]> {
        match &self.kind {
            SamplerKind::Palette(colors) => Some(colors),
            SamplerKind::Delegate(inner) if self.post.is_identity() => inner.palette(),
            _ => None,
        }
    }

    pub fn sample(&self, input: &[f32]) -> [f32; 4] {
        let rgba = self.sample_base(input);
        if self.post.is_identity() {
            return rgba;
        }
        let out = self.post.apply(&rgba[..3]);
        let get = |i: usize| out.get(i).copied().unwrap_or(0.0);
        [get(0), get(1), get(2), rgba[3]]
    }

    fn sample_base(&self, input: &[f32]) -> [f32; 4] {
        let c = |i: usize| input.get(i).copied().unwrap_or(0.0);
        match &self.kind {
            SamplerKind::Gray => [c(0), c(0), c(0), 1.0],
            SamplerKind::Rgb => [c(0), c(1), c(2), 1.0],
            SamplerKind::Cmyk => {
                let k = 1.0 - c(3);
                [(1.0 - c(0)) * k, (1.0 - c(1)) * k, (1.0 - c(2)) * k, 1.0]
            }
            SamplerKind::Transform { ranges, transform } => {
                let out = match ranges {
                    Some(ranges) => {
                        let scaled: SmallVec<[f32; 8]> = ranges
                            .iter()
                            .enumerate()
                            .map(|(i, &(lo, hi))| lo + c(i) * (hi - lo))
                            .collect();
                        transform.apply(&scaled)
                    }
                    None => transform.apply(&input[..input.len().min(self.components)]),
                };
                let get = |i: usize| out.get(i).copied().unwrap_or(0.0);
                [get(0), get(1), get(2), 1.0]
            }
            SamplerKind::Palette(colors) => {
                let hival = colors.len().saturating_sub(1);
                let idx = ((c(0) * hival as f32).round().max(0.0) as usize).min(hival);
                colors.get(idx).copied().unwrap_or(FALLBACK_GRAY)
            }
            SamplerKind::Tint {
                function,
                alternate_ranges,
                alternate,
            } => match function.evaluate(&input[..input.len().min(self.components)]) {
                Ok(out) if out.len() >= alternate_ranges.len() => {
                    let normalized: SmallVec<[f32; 8]> = alternate_ranges
                        .iter()
                        .zip(&out)
                        .map(|(&(lo, hi), &v)| if hi == lo { 0.0 } else { (v - lo) / (hi - lo) })
                        .collect();
                    alternate.sample(&normalized)
                }
                Ok(out) => {
                    trace!(
                        "tint transform produced {} of {} values",
                        out.len(),
                        alternate_ranges.len()
                    );
                    FALLBACK_GRAY
                }
                Err(err) => {
                    trace!("tint transform failed: {err}");
                    FALLBACK_GRAY
                }
            },
            SamplerKind::Delegate(inner) => inner.sample(input),
            SamplerKind::Transparent => [0.0; 4],
            SamplerKind::InvertedGray => {
                let g = 1.0 - c(0);
                [g, g, g, 1.0]
            }
        }
    }
}
