use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::records::RecordingKind;

/// Column names and date conventions of one export software version.
///
/// Every assumption about how NeuroWorkbench lays out its export lives here, so a
/// new export version only needs a different `ExportFormat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    pub patient_id_column: String,
    pub patient_name_column: String,
    pub sex_column: String,
    pub birth_date_column: String,
    /// Used only by sheets that mix recording kinds
    pub kind_column: String,
    pub directory_column: String,
    pub video_name_column: String,
    pub eeg_name_column: String,
    pub start_column: String,
    pub end_column: String,
    pub exam_number_column: String,

    /// Extension given to EEG data names
    pub eeg_extension: String,

    /// Text timestamp formats, tried in order
    pub date_formats: Vec<String>,
    /// Epoch used for numeric (serial) timestamp cells
    pub date_mode: DateMode,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::neuroworkbench()
    }
}

impl ExportFormat {
    /// Layout of the NeuroWorkbench patient list export
    pub fn neuroworkbench() -> Self {
        Self {
            patient_id_column: "ID".to_string(),
            patient_name_column: "Patient Name".to_string(),
            sex_column: "Sex".to_string(),
            birth_date_column: "Birth Date".to_string(),
            kind_column: "Type".to_string(),
            directory_column: "Path".to_string(),
            video_name_column: "Video Name".to_string(),
            eeg_name_column: "Data Name".to_string(),
            start_column: "Start".to_string(),
            end_column: "End".to_string(),
            exam_number_column: "Exam. No.".to_string(),
            eeg_extension: "EEG".to_string(),
            date_formats: vec![
                "%Y/%m/%d %H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y/%m/%d %H:%M".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
            ],
            date_mode: DateMode::Excel1900,
        }
    }

    /// File-name column for a recording kind
    pub fn name_column(&self, kind: RecordingKind) -> &str {
        match kind {
            RecordingKind::Video => &self.video_name_column,
            RecordingKind::Eeg => &self.eeg_name_column,
        }
    }

    /// Columns a sheet must carry for its rows to be readable at all
    pub fn required_columns(&self, kind_from_column: bool) -> Vec<&str> {
        let mut columns = vec![
            self.patient_id_column.as_str(),
            self.directory_column.as_str(),
            self.start_column.as_str(),
            self.end_column.as_str(),
        ];
        if kind_from_column {
            columns.push(self.kind_column.as_str());
        }
        columns
    }

    /// Parse a text timestamp with the first matching format
    pub fn parse_timestamp(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        self.date_formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                // Date-only cells (birth dates)
                NaiveDate::parse_from_str(text, "%Y/%m/%d")
                    .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    /// Build the full path of a recording from its directory and file name.
    ///
    /// The directory's own separator is reused so Windows paths stay intact.
    /// EEG names get their extension replaced with `eeg_extension`.
    pub fn compose_path(&self, directory: &str, name: Option<&str>, kind: RecordingKind) -> String {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => return directory.to_string(),
        };

        let name = match kind {
            RecordingKind::Eeg => with_extension(name, &self.eeg_extension),
            RecordingKind::Video => name.to_string(),
        };

        if directory.is_empty() {
            return name;
        }

        let separator = if directory.contains('\\') && !directory.contains('/') {
            '\\'
        } else {
            '/'
        };
        if directory.ends_with(separator) {
            format!("{}{}", directory, name)
        } else {
            format!("{}{}{}", directory, separator, name)
        }
    }
}

fn with_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}.{}", stem, extension)
}

/// Largest serial Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Workbook date system for serial timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    Excel1900,
    Excel1904,
}

impl Default for DateMode {
    fn default() -> Self {
        Self::Excel1900
    }
}

impl DateMode {
    /// Convert an Excel serial date (days since epoch, fractional time of day)
    pub fn serial_to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
            return None;
        }

        let epoch = match self {
            DateMode::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
            // Excel counts a non-existent 1900-02-29, serials past it are shifted a day
            DateMode::Excel1900 if serial < 60.0 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
            DateMode::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        };

        let days = serial.trunc();
        let millis = ((serial - days) * 86_400_000.0).round() as i64;
        let midnight = epoch.and_hms_opt(0, 0, 0)?;

        midnight
            .checked_add_signed(Duration::try_days(days as i64)?)?
            .checked_add_signed(Duration::try_milliseconds(millis)?)
    }
}
