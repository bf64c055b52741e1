//! Row parser: one raw export row to one typed recording.

use chrono::NaiveDateTime;

use crate::error::{InvalidDurationError, RowError, RowParseError};
use crate::export::{Cell, ExportFormat, Row, SheetKind};
use crate::records::{EegFile, PatientInfo, RecordingFile, RecordingKind, VideoFile};

/// A successfully parsed row
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub patient_id: String,
    pub info: PatientInfo,
    pub recording: RecordingFile,
}

/// Parses rows according to one export format
#[derive(Debug, Clone)]
pub struct RowParser<'a> {
    format: &'a ExportFormat,
}

impl<'a> RowParser<'a> {
    pub fn new(format: &'a ExportFormat) -> Self {
        Self { format }
    }

    /// Parse one row.
    ///
    /// `index` is only used to label errors; the same row always yields the same
    /// record. Clip flags start out false and are set after merging.
    pub fn parse(&self, index: usize, row: &Row, kind: SheetKind) -> Result<ParsedRow, RowError> {
        let fmt = self.format;

        let patient_id = self.required_text(index, row, &fmt.patient_id_column)?;

        let kind = match kind {
            SheetKind::Fixed(kind) => kind,
            SheetKind::Column => {
                let raw = self.required_text(index, row, &fmt.kind_column)?;
                raw.parse::<RecordingKind>()
                    .map_err(|e| RowParseError::invalid(index, &fmt.kind_column, e))?
            }
        };

        let directory = text(row, &fmt.directory_column).unwrap_or_default();
        let name = text(row, fmt.name_column(kind));
        let path = fmt.compose_path(&directory, name.as_deref(), kind);
        if path.is_empty() {
            return Err(RowParseError::missing(index, &fmt.directory_column).into());
        }

        let start = self.required_timestamp(index, row, &fmt.start_column)?;
        let end = self.required_timestamp(index, row, &fmt.end_column)?;
        if end < start {
            return Err(InvalidDurationError { row: index, start, end }.into());
        }

        let recording = match kind {
            RecordingKind::Video => RecordingFile::Video(VideoFile {
                path,
                start,
                end,
                clipped: false,
            }),
            RecordingKind::Eeg => RecordingFile::Eeg(EegFile {
                path,
                start,
                end,
                exam_number: text(row, &fmt.exam_number_column).unwrap_or_default(),
            }),
        };

        Ok(ParsedRow {
            patient_id,
            info: self.patient_info(row),
            recording,
        })
    }

    /// Demographic columns are optional and never fail a row
    fn patient_info(&self, row: &Row) -> PatientInfo {
        let fmt = self.format;
        PatientInfo {
            name: text(row, &fmt.patient_name_column),
            sex: text(row, &fmt.sex_column),
            birth_date: row
                .get(&fmt.birth_date_column)
                .and_then(|cell| self.timestamp(cell)),
        }
    }

    fn required_text(&self, index: usize, row: &Row, column: &str) -> Result<String, RowParseError> {
        text(row, column).ok_or_else(|| RowParseError::missing(index, column))
    }

    fn required_timestamp(
        &self,
        index: usize,
        row: &Row,
        column: &str,
    ) -> Result<NaiveDateTime, RowParseError> {
        let cell = row
            .get(column)
            .filter(|cell| !cell.is_empty())
            .ok_or_else(|| RowParseError::missing(index, column))?;

        self.timestamp(cell).ok_or_else(|| {
            RowParseError::invalid(
                index,
                column,
                format!("has unparsable timestamp {:?}", cell),
            )
        })
    }

    fn timestamp(&self, cell: &Cell) -> Option<NaiveDateTime> {
        match cell {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(serial) => self.format.date_mode.serial_to_datetime(*serial),
            Cell::Text(s) => self.format.parse_timestamp(s),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(Cell::as_text)
}
