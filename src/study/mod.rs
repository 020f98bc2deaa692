//! Study abstraction layer.
//!
//! A "study" is one DICOM container: fetched as a complete buffer, parsed
//! once, and held in memory together with its frame cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Frame Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            StudyRegistry                │
//! │ (LRU of parsed studies, singleflight)   │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           StudySource Trait             │
//! │   (identifier -> complete byte buffer)  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            FsStudySource                │
//! │      (.dcm files under a directory)     │
//! └─────────────────────────────────────────┘
//! ```

mod registry;
mod source;

pub use registry::{LoadedStudy, StudyRegistry, DEFAULT_STUDY_CACHE_CAPACITY};
pub use source::{FsStudySource, StudySource};
