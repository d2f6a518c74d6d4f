//! Color math shared by the CIE-based color spaces and the ICC transforms
//!
//! - 3x3 matrices for RGB/XYZ conversions and chromatic adaptation
//! - sRGB and ICC parametric transfer functions
//! - CIE XYZ / L*a*b* helpers and Bradford adaptation

pub mod cie;
pub mod gamma;
pub mod matrix;

pub use cie::{D50, D65, bradford_matrix, lab_to_xyz, xyz_to_lab};
pub use gamma::{ParametricCurve, ParametricCurveType, srgb_gamma_decode, srgb_gamma_encode};
pub use matrix::Matrix3x3;
