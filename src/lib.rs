//! Recording metadata extraction from NeuroWorkbench patient exports.
//!
//! Decoded export sheets go through the row parser, are merged per patient
//! across all sheets, get their split videos linked, and end up in a read-only
//! [`Catalog`] that can be queried by patient and time range.

pub mod catalog;
pub mod clips;
pub mod config;
pub mod error;
pub mod export;
pub mod merge;
pub mod parser;
pub mod records;


pub use catalog::{Catalog, RecordingRef, Recordings, TimeWindow};
pub use clips::infer_clips;
pub use config::{ExtractConfig, DEFAULT_CLIP_TOLERANCE_MS};
pub use error::{FileFormatError, InvalidDurationError, RowError, RowParseError};
pub use export::{Cell, DateMode, ExportFormat, ExportSheet, Row, SheetKind};
pub use merge::{extract, CatalogBuilder, Extraction, ExtractionSummary, SkippedRow};
pub use parser::{ParsedRow, RowParser};
pub use records::{EegFile, Patient, PatientInfo, RecordingFile, RecordingKind, VideoFile};
