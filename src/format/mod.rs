//! Container format machinery: detection, offset indexing, plane decoding,
//! region extraction.
//!
//! # Read path
//!
//! [`detect::detect_format`] verifies the header, [`index::build_index`]
//! scans the document once into a per-series offset index, and each plane
//! request then runs [`plane::decode_plane`] over one block span followed
//! by [`region::copy_region`] for the requested window.

pub mod detect;
pub mod index;
pub mod plane;
pub mod region;

pub use detect::{detect_format, is_ome_xml};
pub use index::{build_index, Series};
pub use plane::decode_plane;
pub use region::{copy_region, Region};
