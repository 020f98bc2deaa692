//! DICOM container format support.
//!
//! Parsing is split into small, testable layers:
//! - [`tags`]: element tag constants and VR header classification
//! - [`syntax`]: transfer syntax identification and rejection of
//!   compressed encodings
//! - [`parser`]: the Part-10 element walk producing a [`DicomDataset`]
//! - [`dataset`]: the immutable parsed result handed to the frame pipeline

pub mod dataset;
pub mod parser;
pub mod syntax;
pub mod tags;

pub use dataset::DicomDataset;
pub use parser::{has_dicm_signature, parse_dataset};
pub use syntax::TransferSyntax;
pub use tags::Tag;
