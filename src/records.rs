use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Recording kind of an export row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingKind {
    Video,
    Eeg,
}

impl std::fmt::Display for RecordingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Eeg => write!(f, "eeg"),
        }
    }
}

impl std::str::FromStr for RecordingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "eeg" => Ok(Self::Eeg),
            _ => Err(format!("Unknown recording kind: {}", s)),
        }
    }
}

/// A video file referenced by the export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFile {
    pub path: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// The recording continues in the next video file
    pub clipped: bool,
}

/// An EEG data file referenced by the export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EegFile {
    pub path: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Empty when the export has no exam number for the file
    pub exam_number: String,
}

/// A physical recording file of either kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordingFile {
    Video(VideoFile),
    Eeg(EegFile),
}

impl RecordingFile {
    pub fn kind(&self) -> RecordingKind {
        match self {
            RecordingFile::Video(_) => RecordingKind::Video,
            RecordingFile::Eeg(_) => RecordingKind::Eeg,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            RecordingFile::Video(v) => &v.path,
            RecordingFile::Eeg(e) => &e.path,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        match self {
            RecordingFile::Video(v) => v.start,
            RecordingFile::Eeg(e) => e.start,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        match self {
            RecordingFile::Video(v) => v.end,
            RecordingFile::Eeg(e) => e.end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end() - self.start()
    }

    pub fn as_video(&self) -> Option<&VideoFile> {
        match self {
            RecordingFile::Video(v) => Some(v),
            RecordingFile::Eeg(_) => None,
        }
    }

    pub fn as_eeg(&self) -> Option<&EegFile> {
        match self {
            RecordingFile::Eeg(e) => Some(e),
            RecordingFile::Video(_) => None,
        }
    }
}

/// Demographics carried on the patient columns of the export
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDateTime>,
}

impl PatientInfo {
    /// Fill fields still unknown from a later row; known fields are never replaced
    pub fn fill_from(&mut self, other: &PatientInfo) {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.sex.is_none() {
            self.sex = other.sex.clone();
        }
        if self.birth_date.is_none() {
            self.birth_date = other.birth_date;
        }
    }
}

/// One subject of the clinical database.
///
/// Only the merger builds patients; callers get shared references through the
/// [`Catalog`](crate::Catalog) and cannot change them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    id: String,
    info: PatientInfo,
    videos: Vec<VideoFile>,
    eegs: Vec<EegFile>,
}

impl Patient {
    pub(crate) fn new(id: String, info: PatientInfo) -> Self {
        Self {
            id,
            info,
            videos: Vec::new(),
            eegs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn info(&self) -> &PatientInfo {
        &self.info
    }

    /// Videos ordered by start
    pub fn videos(&self) -> &[VideoFile] {
        &self.videos
    }

    /// EEG files ordered by start
    pub fn eegs(&self) -> &[EegFile] {
        &self.eegs
    }

    pub fn recording_count(&self) -> usize {
        self.videos.len() + self.eegs.len()
    }

    pub(crate) fn info_mut(&mut self) -> &mut PatientInfo {
        &mut self.info
    }

    pub(crate) fn push(&mut self, recording: RecordingFile) {
        match recording {
            RecordingFile::Video(v) => self.videos.push(v),
            RecordingFile::Eeg(e) => self.eegs.push(e),
        }
    }

    pub(crate) fn videos_mut(&mut self) -> &mut Vec<VideoFile> {
        &mut self.videos
    }

    pub(crate) fn eegs_mut(&mut self) -> &mut Vec<EegFile> {
        &mut self.eegs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("video".parse::<RecordingKind>().unwrap(), RecordingKind::Video);
        assert_eq!(" EEG ".parse::<RecordingKind>().unwrap(), RecordingKind::Eeg);
        assert!("audio".parse::<RecordingKind>().is_err());
        assert_eq!(RecordingKind::Eeg.to_string(), "eeg");
    }

    #[test]
    fn test_recording_accessors() {
        let rec = RecordingFile::Eeg(EegFile {
            path: "/eeg/FA001.EEG".to_string(),
            start: at(8, 0),
            end: at(9, 30),
            exam_number: "NE0123".to_string(),
        });
        assert_eq!(rec.kind(), RecordingKind::Eeg);
        assert_eq!(rec.path(), "/eeg/FA001.EEG");
        assert_eq!(rec.duration(), Duration::minutes(90));
        assert!(rec.as_video().is_none());
        assert_eq!(rec.as_eeg().unwrap().exam_number, "NE0123");
    }

    #[test]
    fn test_patient_info_fill_keeps_first_values() {
        let mut info = PatientInfo {
            name: Some("DOE, JANE".to_string()),
            sex: None,
            birth_date: None,
        };
        info.fill_from(&PatientInfo {
            name: Some("OTHER, NAME".to_string()),
            sex: Some("Female".to_string()),
            birth_date: None,
        });
        assert_eq!(info.name.as_deref(), Some("DOE, JANE"));
        assert_eq!(info.sex.as_deref(), Some("Female"));
    }

    #[test]
    fn test_patient_push_routes_by_kind() {
        let mut patient = Patient::new("S0123456".to_string(), PatientInfo::default());
        patient.push(RecordingFile::Video(VideoFile {
            path: "f1.m2t".to_string(),
            start: at(8, 0),
            end: at(9, 0),
            clipped: false,
        }));
        assert_eq!(patient.videos().len(), 1);
        assert!(patient.eegs().is_empty());
        assert_eq!(patient.recording_count(), 1);
    }
}
