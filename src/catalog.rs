//! Read-only catalog of merged patients and the time-bounded queries over it.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::records::{EegFile, Patient, RecordingKind, VideoFile};

/// Patients keyed by id. Built by the merger, immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    patients: BTreeMap<String, Patient>,
}

/// Optional, independent bounds on a recording's start.
///
/// Both bounds are strict: a recording starting exactly at `after` or `before`
/// is outside the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: Option<NaiveDateTime>,
    pub before: Option<NaiveDateTime>,
}

impl TimeWindow {
    pub fn new(after: Option<NaiveDateTime>, before: Option<NaiveDateTime>) -> Self {
        Self { after, before }
    }

    pub fn after(instant: NaiveDateTime) -> Self {
        Self::new(Some(instant), None)
    }

    pub fn before(instant: NaiveDateTime) -> Self {
        Self::new(None, Some(instant))
    }

    pub fn contains(&self, start: NaiveDateTime) -> bool {
        self.after.map_or(true, |a| start > a) && self.before.map_or(true, |b| start < b)
    }
}

/// Borrowed view of one recording in the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordingRef<'a> {
    Video(&'a VideoFile),
    Eeg(&'a EegFile),
}

impl<'a> RecordingRef<'a> {
    pub fn kind(&self) -> RecordingKind {
        match self {
            RecordingRef::Video(_) => RecordingKind::Video,
            RecordingRef::Eeg(_) => RecordingKind::Eeg,
        }
    }

    pub fn path(&self) -> &'a str {
        match *self {
            RecordingRef::Video(v) => &v.path,
            RecordingRef::Eeg(e) => &e.path,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        match self {
            RecordingRef::Video(v) => v.start,
            RecordingRef::Eeg(e) => e.start,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        match self {
            RecordingRef::Video(v) => v.end,
            RecordingRef::Eeg(e) => e.end,
        }
    }
}

/// Lazy, start-ordered iterator over one patient's recordings of one kind.
///
/// Calling the query again yields the same sequence since the catalog cannot
/// change.
#[derive(Debug, Clone)]
pub enum Recordings<'a> {
    Videos(std::slice::Iter<'a, VideoFile>),
    Eegs(std::slice::Iter<'a, EegFile>),
}

impl<'a> Iterator for Recordings<'a> {
    type Item = RecordingRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Recordings::Videos(it) => it.next().map(RecordingRef::Video),
            Recordings::Eegs(it) => it.next().map(RecordingRef::Eeg),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Recordings::Videos(it) => it.size_hint(),
            Recordings::Eegs(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for Recordings<'_> {}

/// Sub-slice of a start-sorted list whose starts fall strictly inside the window
fn window_slice<'a, T>(
    items: &'a [T],
    window: TimeWindow,
    start: impl Fn(&T) -> NaiveDateTime,
) -> &'a [T] {
    let lo = match window.after {
        Some(after) => items.partition_point(|item| start(item) <= after),
        None => 0,
    };
    let hi = match window.before {
        Some(before) => items.partition_point(|item| start(item) < before),
        None => items.len(),
    };
    if lo >= hi {
        &[]
    } else {
        &items[lo..hi]
    }
}

impl Catalog {
    pub(crate) fn new(patients: BTreeMap<String, Patient>) -> Self {
        Self { patients }
    }

    /// Exact-match lookup by patient id
    pub fn lookup(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.get(patient_id)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Patient ids in ascending order
    pub fn patient_ids(&self) -> impl Iterator<Item = &str> {
        self.patients.keys().map(String::as_str)
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    /// Recordings of one kind whose start lies strictly inside the bounds,
    /// ascending by start
    pub fn recordings_of<'a>(
        &self,
        patient: &'a Patient,
        kind: RecordingKind,
        after: Option<NaiveDateTime>,
        before: Option<NaiveDateTime>,
    ) -> Recordings<'a> {
        patient.recordings_in(kind, TimeWindow::new(after, before))
    }

    /// Recordings of one kind that overlap `[from, to]`: started no later than
    /// `to` and ended no earlier than `from`. Either bound may be open.
    pub fn recordings_overlapping<'a>(
        &self,
        patient: &'a Patient,
        kind: RecordingKind,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> impl Iterator<Item = RecordingRef<'a>> + Clone {
        patient
            .recordings_in(kind, TimeWindow::default())
            .filter(move |rec| {
                to.map_or(true, |to| rec.start() <= to) && from.map_or(true, |from| rec.end() >= from)
            })
    }
}

impl Patient {
    /// Recordings of one kind with start inside `window`, ascending by start
    pub fn recordings_in(&self, kind: RecordingKind, window: TimeWindow) -> Recordings<'_> {
        match kind {
            RecordingKind::Video => {
                Recordings::Videos(window_slice(self.videos(), window, |v| v.start).iter())
            }
            RecordingKind::Eeg => {
                Recordings::Eegs(window_slice(self.eegs(), window, |e| e.start).iter())
            }
        }
    }

    /// Videos with start inside `window`
    pub fn videos_in(&self, window: TimeWindow) -> &[VideoFile] {
        window_slice(self.videos(), window, |v| v.start)
    }

    /// EEG files with start inside `window`
    pub fn eegs_in(&self, window: TimeWindow) -> &[EegFile] {
        window_slice(self.eegs(), window, |e| e.start)
    }
}
