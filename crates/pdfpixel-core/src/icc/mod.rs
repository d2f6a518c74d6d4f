//! ICC Profile Parsing
//!
//! Parses the profiles embedded in `/ICCBased` color space streams
//! (ICC.1:2022, v2 and v4).
//!
//! # Structure
//!
//! An ICC profile consists of:
//! 1. A 128-byte header
//! 2. A tag table listing all tags
//! 3. Tag data (may overlap)
//!
//! Only the tags needed to convert device values to the PCS are decoded:
//! colorants, TRCs, white point, `chad` and the A2B LUTs. Other tags are
//! kept as raw bytes.

pub mod header;
pub mod tags;

mod error;
mod parser;
mod types;

pub use error::IccError;
pub use header::{IccColorSpace, IccHeader, ProfileClass, ProfileVersion};
pub use parser::IccProfile;
pub use tags::{CurveData, LutAToB, LutClut, LutMatrix, LutMft, TagData};
pub use types::{S15Fixed16, TagSignature, XyzNumber};
