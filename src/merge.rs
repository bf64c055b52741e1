//! Patient merger: folds parsed rows from one or more exports into a catalog.
//!
//! Sheets are processed in the order given. The first copy of a recording
//! (same patient, kind and path) wins; later copies are counted and dropped even
//! when their other fields differ, so the result depends on sheet order.
//! Clip inference runs once per patient after every sheet has been merged.

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::clips::infer_clips;
use crate::config::ExtractConfig;
use crate::error::{FileFormatError, RowError};
use crate::export::{ExportSheet, SheetKind};
use crate::parser::{ParsedRow, RowParser};
use crate::records::{Patient, RecordingKind};

/// A row that was skipped, with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub document: String,
    pub error: RowError,
}

/// What an extraction skipped and why
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSummary {
    pub documents_processed: usize,
    pub rows_read: usize,
    pub recordings_added: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub rejected_documents: Vec<FileFormatError>,
    pub duplicates_suppressed: usize,
    pub clips_linked: usize,
}

impl ExtractionSummary {
    /// Rows skipped because they failed to parse
    pub fn parse_failures(&self) -> usize {
        self.skipped_rows.len()
    }

    /// Rows dropped because their recording was already known
    pub fn duplicate_count(&self) -> usize {
        self.duplicates_suppressed
    }

    /// Nothing was skipped or rejected
    pub fn is_clean(&self) -> bool {
        self.skipped_rows.is_empty() && self.rejected_documents.is_empty()
    }
}

/// Result of one extraction call
#[derive(Debug, Clone)]
pub struct Extraction {
    pub catalog: Catalog,
    pub summary: ExtractionSummary,
}

type IdentityKey = (String, RecordingKind, String);

/// Accumulates sheets into patients; `finish` sorts, infers clips and freezes
/// the result into a [`Catalog`].
pub struct CatalogBuilder {
    config: ExtractConfig,
    patients: BTreeMap<String, Patient>,
    seen: HashSet<IdentityKey>,
    summary: ExtractionSummary,
}

impl CatalogBuilder {
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            patients: BTreeMap::new(),
            seen: HashSet::new(),
            summary: ExtractionSummary::default(),
        }
    }

    /// Merge every row of one sheet.
    ///
    /// A sheet missing required columns is rejected as a whole and recorded in
    /// the summary; it does not affect other sheets.
    pub fn add_sheet(&mut self, sheet: &ExportSheet) {
        self.summary.documents_processed += 1;

        if let Err(e) = self.check_columns(sheet) {
            warn!(document = %sheet.name, error = %e, "Rejected export sheet");
            self.summary.rejected_documents.push(e);
            return;
        }

        let parser = RowParser::new(&self.config.format);
        let mut parsed = Vec::with_capacity(sheet.rows.len());
        for (index, row) in sheet.rows.iter().enumerate() {
            self.summary.rows_read += 1;
            match parser.parse(index, row, sheet.kind) {
                Ok(p) => parsed.push(p),
                Err(error) => {
                    warn!(document = %sheet.name, error = %error, "Skipped export row");
                    self.summary.skipped_rows.push(SkippedRow {
                        document: sheet.name.clone(),
                        error,
                    });
                }
            }
        }

        let mut added = 0;
        for row in parsed {
            if self.insert(row) {
                added += 1;
            }
        }

        info!(
            document = %sheet.name,
            rows = sheet.rows.len(),
            added,
            "Merged export sheet"
        );
    }

    /// Insert one parsed row, returns false for a suppressed duplicate
    fn insert(&mut self, row: ParsedRow) -> bool {
        let ParsedRow {
            patient_id,
            info,
            recording,
        } = row;

        let key = (patient_id.clone(), recording.kind(), recording.path().to_string());
        if self.seen.contains(&key) {
            debug!(
                patient_id = %patient_id,
                kind = %recording.kind(),
                path = %recording.path(),
                "Suppressed duplicate recording"
            );
            self.summary.duplicates_suppressed += 1;
            return false;
        }
        self.seen.insert(key);

        let patient = self
            .patients
            .entry(patient_id.clone())
            .or_insert_with(|| Patient::new(patient_id, info.clone()));
        patient.info_mut().fill_from(&info);
        patient.push(recording);

        self.summary.recordings_added += 1;
        true
    }

    fn check_columns(&self, sheet: &ExportSheet) -> Result<(), FileFormatError> {
        let missing: Vec<String> = self
            .config
            .format
            .required_columns(sheet.kind == SheetKind::Column)
            .into_iter()
            .filter(|column| !sheet.has_column(column))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FileFormatError {
                document: sheet.name.clone(),
                missing,
            })
        }
    }

    /// Sort every patient's recordings and infer clips across all merged sheets
    pub fn finish(mut self) -> Extraction {
        let tolerance = self.config.clip_tolerance();

        for patient in self.patients.values_mut() {
            patient.eegs_mut().sort_by_key(|e| e.start);

            let videos = patient.videos_mut();
            videos.sort_by_key(|v| v.start);
            self.summary.clips_linked += infer_clips(videos, tolerance);
        }

        info!(
            patients = self.patients.len(),
            recordings = self.summary.recordings_added,
            skipped = self.summary.parse_failures(),
            duplicates = self.summary.duplicates_suppressed,
            rejected = self.summary.rejected_documents.len(),
            "Extraction complete"
        );

        Extraction {
            catalog: Catalog::new(self.patients),
            summary: self.summary,
        }
    }
}

/// Extract one catalog from several export sheets, in the order given
pub fn extract<'a, I>(sheets: I, config: &ExtractConfig) -> Extraction
where
    I: IntoIterator<Item = &'a ExportSheet>,
{
    let mut builder = CatalogBuilder::new(config.clone());
    for sheet in sheets {
        builder.add_sheet(sheet);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{Cell, Row};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn columns() -> Vec<String> {
        ["ID", "Patient Name", "Path", "Video Name", "Start", "End"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(id: &str, name: Option<&str>, file: &str, start: NaiveDateTime, end: NaiveDateTime) -> Row {
        let mut row = Row::new();
        row.insert("ID".to_string(), Cell::from(id));
        if let Some(name) = name {
            row.insert("Patient Name".to_string(), Cell::from(name));
        }
        row.insert("Path".to_string(), Cell::from("/video"));
        row.insert("Video Name".to_string(), Cell::from(file));
        row.insert("Start".to_string(), Cell::from(start));
        row.insert("End".to_string(), Cell::from(end));
        row
    }

    fn sheet(name: &str, rows: Vec<Row>) -> ExportSheet {
        let mut sheet = ExportSheet::new(name, SheetKind::Fixed(RecordingKind::Video), columns());
        for r in rows {
            sheet.push_row(r);
        }
        sheet
    }

    #[test]
    fn test_duplicate_within_sheet_is_suppressed() {
        let s = sheet(
            "a",
            vec![
                row("S1", None, "f1.m2t", at(8, 0), at(9, 0)),
                row("S1", None, "f1.m2t", at(8, 0), at(9, 0)),
            ],
        );
        let extraction = extract([&s], &ExtractConfig::default());
        assert_eq!(extraction.summary.duplicate_count(), 1);
        assert_eq!(extraction.summary.recordings_added, 1);
        assert_eq!(extraction.catalog.lookup("S1").unwrap().videos().len(), 1);
    }

    #[test]
    fn test_first_seen_copy_wins() {
        let first = sheet("first", vec![row("S1", None, "f1.m2t", at(8, 0), at(9, 0))]);
        let second = sheet("second", vec![row("S1", None, "f1.m2t", at(8, 0), at(9, 30))]);

        let extraction = extract([&first, &second], &ExtractConfig::default());
        let videos = extraction.catalog.lookup("S1").unwrap().videos();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].end, at(9, 0));

        let reversed = extract([&second, &first], &ExtractConfig::default());
        assert_eq!(reversed.catalog.lookup("S1").unwrap().videos()[0].end, at(9, 30));
    }

    #[test]
    fn test_same_path_for_other_patient_is_kept() {
        let s = sheet(
            "a",
            vec![
                row("S1", None, "f1.m2t", at(8, 0), at(9, 0)),
                row("S2", None, "f1.m2t", at(8, 0), at(9, 0)),
            ],
        );
        let extraction = extract([&s], &ExtractConfig::default());
        assert_eq!(extraction.catalog.len(), 2);
        assert_eq!(extraction.summary.duplicate_count(), 0);
    }

    #[test]
    fn test_patient_info_first_non_empty_wins() {
        let first = sheet("first", vec![row("S1", None, "f1.m2t", at(8, 0), at(9, 0))]);
        let second = sheet(
            "second",
            vec![row("S1", Some("DOE, JANE"), "f2.m2t", at(10, 0), at(11, 0))],
        );
        let third = sheet(
            "third",
            vec![row("S1", Some("OTHER, NAME"), "f3.m2t", at(12, 0), at(13, 0))],
        );

        let extraction = extract([&first, &second, &third], &ExtractConfig::default());
        let patient = extraction.catalog.lookup("S1").unwrap();
        assert_eq!(patient.info().name.as_deref(), Some("DOE, JANE"));
        assert_eq!(patient.videos().len(), 3);
    }

    #[test]
    fn test_rejected_sheet_does_not_stop_others() {
        let broken = ExportSheet::new(
            "broken",
            SheetKind::Fixed(RecordingKind::Video),
            vec!["ID".to_string(), "Path".to_string()],
        );
        let good = sheet("good", vec![row("S1", None, "f1.m2t", at(8, 0), at(9, 0))]);

        let extraction = extract([&broken, &good], &ExtractConfig::default());
        assert_eq!(extraction.summary.documents_processed, 2);
        assert_eq!(extraction.summary.rejected_documents.len(), 1);
        assert_eq!(
            extraction.summary.rejected_documents[0].missing,
            vec!["Start".to_string(), "End".to_string()]
        );
        assert!(extraction.catalog.lookup("S1").is_some());
        assert!(!extraction.summary.is_clean());
    }

    #[test]
    fn test_recordings_sorted_after_merge() {
        let later = sheet("later", vec![row("S1", None, "f2.m2t", at(12, 0), at(13, 0))]);
        let earlier = sheet("earlier", vec![row("S1", None, "f1.m2t", at(8, 0), at(9, 0))]);

        let extraction = extract([&later, &earlier], &ExtractConfig::default());
        let paths: Vec<&str> = extraction
            .catalog
            .lookup("S1")
            .unwrap()
            .videos()
            .iter()
            .map(|v| v.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/video/f1.m2t", "/video/f2.m2t"]);
    }
}
