//! PDF function evaluation

use pdfpixel_core::Error;
use pdfpixel_core::function::{
    ExponentialFunction, PdfFunction, PostScriptFunction, PostScriptProgram, SampledFunction,
    StitchingFunction, Value,
};

fn postscript(inputs: usize, outputs: usize, source: &str) -> PdfFunction {
    PdfFunction::PostScript(
        PostScriptFunction::new(vec![(0.0, 1.0); inputs], vec![(-100.0, 100.0); outputs], source).unwrap(),
    )
}

fn constant(v: f32) -> PdfFunction {
    PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), Some(vec![v]), Some(vec![v]), 1.0))
}

#[test]
fn test_postscript_add() {
    let program = PostScriptProgram::parse("{ 2 3 add }").unwrap();
    assert_eq!(program.evaluate(&[]).unwrap(), vec![Value::Int(5)]);
    let f = postscript(1, 1, "{ pop 2 3 add }");
    assert_eq!(f.evaluate(&[0.5]).unwrap().as_slice(), &[5.0]);
}

#[test]
fn test_postscript_ifelse() {
    let f = postscript(1, 1, "{ 0.5 gt { 10 } { 20 } ifelse }");
    assert_eq!(f.evaluate(&[0.9]).unwrap().as_slice(), &[10.0]);
    assert_eq!(f.evaluate(&[0.1]).unwrap().as_slice(), &[20.0]);
}

#[test]
fn test_postscript_underflow() {
    let f = postscript(1, 1, "{ pop add }");
    assert!(matches!(
        f.evaluate(&[0.5]),
        Err(Error::StackUnderflow { operator: "add", .. })
    ));
}

#[test]
fn test_postscript_inputs_clamped_to_domain() {
    let f = postscript(2, 1, "{ add }");
    assert_eq!(f.evaluate(&[5.0, -3.0]).unwrap().as_slice(), &[1.0]);
}

#[test]
fn test_postscript_outputs_clamped_to_range() {
    let f = PdfFunction::PostScript(PostScriptFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], "{ 5 mul }").unwrap());
    assert_eq!(f.evaluate(&[0.5]).unwrap().as_slice(), &[1.0]);
}

#[test]
fn test_postscript_multiple_outputs_in_order() {
    // t -> (t, 2t, 3t)
    let f = postscript(1, 3, "{ dup 2 mul 1 index 3 mul }");
    let out = f.evaluate(&[0.25]).unwrap();
    assert_eq!(out.as_slice(), &[0.25, 0.5, 0.75]);
}

#[test]
fn test_postscript_integer_operators_on_inputs() {
    let f = PdfFunction::PostScript(
        PostScriptFunction::new(vec![(0.0, 10.0)], vec![(0.0, 10.0); 2], "{ dup 2 mod exch 3 idiv }").unwrap(),
    );
    assert_eq!(f.evaluate(&[7.0]).unwrap().as_slice(), &[1.0, 2.0]);
    assert!(f.evaluate(&[7.5]).is_err());
}

#[test]
fn test_postscript_unknown_operator() {
    assert!(PostScriptFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], "{ frobnicate }").is_err());
}

#[test]
fn test_exponential() {
    let f = ExponentialFunction::new((0.0, 1.0), Some(vec![0.0, 1.0]), Some(vec![1.0, 0.0]), 2.0);
    let out = f.evaluate(&[0.5]);
    assert_eq!(out.as_slice(), &[0.25, 0.75]);
    // defaults C0 = [0], C1 = [1]
    let linear = ExponentialFunction::new((0.0, 1.0), None, None, 1.0);
    assert_eq!(linear.evaluate(&[0.3]).as_slice(), &[0.3]);
    assert_eq!(linear.output_count(), 1);
}

#[test]
fn test_stitching_selects_segment() {
    let f = StitchingFunction::new((0.0, 1.0), vec![constant(0.0), constant(1.0)], vec![0.5], vec![(0.0, 1.0); 2])
        .unwrap();
    assert_eq!(f.evaluate(&[0.3]).unwrap().as_slice(), &[0.0]);
    assert_eq!(f.evaluate(&[0.7]).unwrap().as_slice(), &[1.0]);
    // the bound itself belongs to the upper segment
    assert_eq!(f.segment(0.5), 1);
}

#[test]
fn test_stitching_encode_maps_subdomain() {
    let ramp = PdfFunction::Exponential(ExponentialFunction::new((0.0, 1.0), None, None, 1.0));
    let f = StitchingFunction::new((0.0, 1.0), vec![ramp.clone(), ramp], vec![0.5], vec![(0.0, 1.0), (1.0, 0.0)])
        .unwrap();
    let out = |x: f32| f.evaluate(&[x]).unwrap()[0];
    assert!((out(0.25) - 0.5).abs() < 1e-6);
    assert!((out(0.75) - 0.5).abs() < 1e-6);
    assert!((out(1.0) - 0.0).abs() < 1e-6);
}

#[test]
fn test_stitching_rejects_short_encode() {
    assert!(StitchingFunction::new((0.0, 1.0), vec![constant(0.0), constant(1.0)], vec![0.5], vec![(0.0, 1.0)]).is_err());
}

#[test]
fn test_sampled_linear_interpolation() {
    // 1 input, 2 outputs, 3 samples per output at 8 bits
    let f = SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0); 2], vec![3], 8, &[0, 255, 255, 0, 0, 255])
        .unwrap();
    let out = f.evaluate(&[0.25]).unwrap();
    assert!((out[0] - 0.5).abs() < 1e-4);
    assert!((out[1] - 0.5).abs() < 1e-4);
    let out = f.evaluate(&[1.0]).unwrap();
    assert_eq!(out.as_slice(), &[0.0, 1.0]);
}

#[test]
fn test_sampled_bilinear() {
    // 2x2 grid, first input fastest: f(0,0)=0 f(1,0)=1 f(0,1)=1 f(1,1)=0
    let f = SampledFunction::new(vec![(0.0, 1.0); 2], vec![(0.0, 1.0)], vec![2, 2], 8, &[0, 255, 255, 0]).unwrap();
    let v = f.evaluate(&[0.5, 0.5]).unwrap()[0];
    assert!((v - 0.5).abs() < 1e-4);
    assert_eq!(f.evaluate(&[1.0, 0.0]).unwrap()[0], 1.0);
}

#[test]
fn test_sampled_decode_override() {
    let f = SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], vec![2], 8, &[0, 255])
        .unwrap()
        .with_decode(vec![(1.0, 0.0)]);
    assert_eq!(f.evaluate(&[0.0]).unwrap()[0], 1.0);
}

#[test]
fn test_sampled_rejects_short_data() {
    let result = SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], vec![4], 16, &[0; 7]);
    assert!(matches!(result, Err(Error::BufferSize { expected: 8, actual: 7 })));
}

#[test]
fn test_output_counts() {
    assert_eq!(postscript(1, 4, "{ dup dup dup }").output_count(), Some(4));
    let stitched = PdfFunction::Stitching(
        StitchingFunction::new((0.0, 1.0), vec![constant(0.5)], vec![], vec![(0.0, 1.0)]).unwrap(),
    );
    assert_eq!(stitched.output_count(), Some(1));
}
