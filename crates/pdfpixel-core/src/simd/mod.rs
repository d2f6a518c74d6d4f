//! Multiversioned Row Kernels
//!
//! Runtime-dispatched loops for the image fast paths and the mask passes.
//! Each kernel works on one row and is written so the compiler can
//! vectorize it for the selected target.

mod rows;

pub use rows::{
    dematte_rgba8, expand_rgb8_to_rgba8, expand_rgb16_to_rgba16, fill_alpha8, fill_alpha16,
    map_codes_to_alpha, map_codes_to_rgba,
};
