//! Interface to decoded export sheets.
//!
//! Decoding the spreadsheet itself happens elsewhere; this module only describes
//! what a decoded sheet looks like and how the export lays out its columns.

pub mod format;
pub mod sheet;

pub use format::{DateMode, ExportFormat};
pub use sheet::{Cell, ExportSheet, Row, SheetKind};
