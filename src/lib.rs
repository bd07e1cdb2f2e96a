//! Reader for ANSI/NIST-ITL fingerprint transmissions (EFT files) with a
//! built-in WSQ grayscale decoder.
//!
//! [`parse`] splits a transaction into its Type-1 tag map, shaped Type-2
//! demographics and Type-4 image records; [`decode`] turns a Type-4
//! record's WSQ payload into a raw row-major raster. Both are pure
//! functions of their input bytes and keep all working state on the call,
//! so disjoint inputs may be processed from multiple threads freely.

pub mod bitstream;
pub mod decoder;
pub mod demographics;
pub mod eft;
pub mod entropy;
pub mod error;
pub mod fingers;
pub mod labels;
pub mod quantization;
pub mod subbands;
pub mod type4;
pub mod wavelet;

pub use decoder::{decode, DecodedImage};
pub use demographics::{format_date, format_height, Demographics};
pub use eft::{parse, EftFile};
pub use error::{EftError, EftResult};
pub use fingers::{export_filename, filter_records, resolve_finger};
pub use type4::Type4Record;
