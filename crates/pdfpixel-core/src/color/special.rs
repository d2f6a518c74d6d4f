//! `/Separation` and `/DeviceN` color spaces

use std::sync::Arc;

use log::debug;

use super::{Converter, MAX_COMPONENTS, Sampler, SamplerKind};
use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::function::PdfFunction;

fn check_tint(function: &PdfFunction, alternate: &Converter, what: &str) -> Result<()> {
    match function.output_count() {
        Some(n) if n < alternate.components() => Err(Error::InvalidColorSpace(format!(
            "{what} tint transform has {n} outputs for a {}-component alternate",
            alternate.components()
        ))),
        _ => Ok(()),
    }
}

fn tint_sampler(
    components: usize,
    function: &Arc<PdfFunction>,
    alternate: &Converter,
    intent: RenderingIntent,
) -> Sampler {
    Sampler::new(
        components,
        SamplerKind::Tint {
            function: Arc::clone(function),
            alternate_ranges: alternate.default_decode(),
            alternate: alternate.rgba_sampler(intent),
        },
    )
}

/// A single colorant rendered through a tint transform
#[derive(Debug)]
pub struct Separation {
    name: String,
    alternate: Arc<Converter>,
    tint: Arc<PdfFunction>,
}

impl Separation {
    pub fn new(name: impl Into<String>, alternate: Converter, tint: PdfFunction) -> Result<Self> {
        check_tint(&tint, &alternate, "Separation")?;
        Ok(Self {
            name: name.into(),
            alternate: Arc::new(alternate),
            tint: Arc::new(tint),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alternate(&self) -> &Converter {
        &self.alternate
    }

    pub(crate) fn sampler(&self, intent: RenderingIntent) -> Sampler {
        match self.name.as_str() {
            "None" => {
                debug!("Separation /None paints nothing");
                Sampler::new(1, SamplerKind::Transparent)
            }
            "All" => Sampler::new(1, SamplerKind::InvertedGray),
            _ => tint_sampler(1, &self.tint, &self.alternate, intent),
        }
    }
}

/// Several colorants rendered through one tint transform
#[derive(Debug)]
pub struct DeviceN {
    names: Vec<String>,
    alternate: Arc<Converter>,
    tint: Arc<PdfFunction>,
}

impl DeviceN {
    pub fn new(names: Vec<String>, alternate: Converter, tint: PdfFunction) -> Result<Self> {
        if names.is_empty() || names.len() > MAX_COMPONENTS {
            return Err(Error::InvalidColorSpace(format!(
                "DeviceN with {} colorants",
                names.len()
            )));
        }
        check_tint(&tint, &alternate, "DeviceN")?;
        Ok(Self {
            names,
            alternate: Arc::new(alternate),
            tint: Arc::new(tint),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn components(&self) -> usize {
        self.names.len()
    }

    pub fn alternate(&self) -> &Converter {
        &self.alternate
    }

    pub(crate) fn sampler(&self, intent: RenderingIntent) -> Sampler {
        if self.names.iter().all(|n| n == "None") {
            debug!("DeviceN of only /None colorants paints nothing");
            return Sampler::new(self.components(), SamplerKind::Transparent);
        }
        tint_sampler(self.components(), &self.tint, &self.alternate, intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorSpace;
    use crate::function::{ExponentialFunction, PostScriptFunction};

    fn cmyk_black_tint() -> PdfFunction {
        // tint t -> CMYK (0, 0, 0, t)
        PdfFunction::Exponential(ExponentialFunction::new(
            (0.0, 1.0),
            Some(vec![0.0; 4]),
            Some(vec![0.0, 0.0, 0.0, 1.0]),
            1.0,
        ))
    }

    #[test]
    fn test_separation_through_cmyk() {
        let sep = Separation::new("Black", Converter::new(ColorSpace::DeviceCmyk), cmyk_black_tint()).unwrap();
        let s = sep.sampler(RenderingIntent::default());
        assert_eq!(s.sample(&[1.0]), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(s.sample(&[0.0]), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_separation_over_separation() {
        // inner: t -> gray 1 - t, outer: t -> inner tint t
        let invert = PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), Some(vec![1.0]), Some(vec![0.0]), 1.0));
        let inner = Separation::new("Inner", Converter::new(ColorSpace::DeviceGray), invert).unwrap();
        let identity = PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), None, None, 1.0));
        let outer = Separation::new("Outer", Converter::new(ColorSpace::Separation(inner)), identity).unwrap();
        assert_eq!(outer.alternate().components(), 1);
        let rgba = outer.sampler(RenderingIntent::default()).sample(&[0.25]);
        for c in &rgba[..3] {
            assert!((c - 0.75).abs() < 1e-5, "{rgba:?}");
        }
        assert_eq!(rgba[3], 1.0);
    }

    #[test]
    fn test_separation_none_and_all() {
        let none = Separation::new("None", Converter::new(ColorSpace::DeviceCmyk), cmyk_black_tint()).unwrap();
        assert_eq!(none.sampler(RenderingIntent::default()).sample(&[1.0])[3], 0.0);
        let all = Separation::new("All", Converter::new(ColorSpace::DeviceCmyk), cmyk_black_tint()).unwrap();
        assert_eq!(all.sampler(RenderingIntent::default()).sample(&[1.0]), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_tint_output_count_checked() {
        let one = PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), None, None, 1.0));
        assert!(Separation::new("Spot", Converter::new(ColorSpace::DeviceRgb), one).is_err());
    }

    #[test]
    fn test_device_n_postscript_tint() {
        // two inks summed into gray
        let tint = PostScriptFunction::new(
            vec![(0.0, 1.0); 2],
            vec![(0.0, 1.0)],
            "{ add 1 exch sub }",
        )
        .unwrap();
        let devn = DeviceN::new(
            vec!["Cyan".into(), "Spot".into()],
            Converter::new(ColorSpace::DeviceGray),
            PdfFunction::PostScript(tint),
        )
        .unwrap();
        let s = devn.sampler(RenderingIntent::default());
        assert_eq!(s.components(), 2);
        let px = s.sample(&[0.25, 0.25]);
        assert!((px[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_device_n_all_none() {
        let devn = DeviceN::new(
            vec!["None".into(), "None".into()],
            Converter::new(ColorSpace::DeviceGray),
            PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), None, None, 1.0)),
        )
        .unwrap();
        assert_eq!(devn.sampler(RenderingIntent::default()).sample(&[1.0, 1.0]), [0.0; 4]);
    }
}
