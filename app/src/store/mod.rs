//! # Attendance Store
//!
//! Snapshot of one day's attendance records, bucketed by treatment type and
//! status. The remote system is the source of truth; this store is a
//! read-through cache that is fully replaced after every mutation rather
//! than patched in place. Insertion order within each bucket follows the
//! order records arrive from the remote listing.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use shared::{AttendanceStatus, EndOfDayCompletionData, TreatmentType};

use crate::domain::models::Attendance;

/// Status bucket a record is filed under in the daily views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Scheduled,
    CheckedIn,
    Ongoing,
    Completed,
}

impl StatusBucket {
    /// All buckets, in daily-view order
    pub const ALL: [StatusBucket; 4] = [
        StatusBucket::Scheduled,
        StatusBucket::CheckedIn,
        StatusBucket::Ongoing,
        StatusBucket::Completed,
    ];

    /// Bucket for a status; terminal cancelled/missed records are not bucketed
    pub fn of(status: AttendanceStatus) -> Option<StatusBucket> {
        match status {
            AttendanceStatus::Scheduled => Some(StatusBucket::Scheduled),
            AttendanceStatus::CheckedIn => Some(StatusBucket::CheckedIn),
            AttendanceStatus::InProgress => Some(StatusBucket::Ongoing),
            AttendanceStatus::Completed => Some(StatusBucket::Completed),
            AttendanceStatus::Cancelled | AttendanceStatus::Missed => None,
        }
    }
}

/// One day's attendance records, keyed by treatment type and status bucket
#[derive(Debug, Clone)]
pub struct AttendanceStore {
    date: NaiveDate,
    buckets: HashMap<(TreatmentType, StatusBucket), Vec<Attendance>>,
    /// Cancelled and missed records, kept for day totals
    terminal: Vec<Attendance>,
}

impl AttendanceStore {
    /// Create an empty store for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            buckets: HashMap::new(),
            terminal: Vec::new(),
        }
    }

    /// Build a store from freshly fetched records, preserving their order
    pub fn from_records(date: NaiveDate, records: Vec<Attendance>) -> Self {
        let mut store = Self::new(date);
        store.insert_all(records);
        store
    }

    /// Replace the whole snapshot with refetched records; last refetch wins
    pub fn replace(&mut self, records: Vec<Attendance>) {
        self.buckets.clear();
        self.terminal.clear();
        self.insert_all(records);
    }

    fn insert_all(&mut self, records: Vec<Attendance>) {
        for record in records {
            match StatusBucket::of(record.status) {
                Some(bucket) => self
                    .buckets
                    .entry((record.treatment_type, bucket))
                    .or_default()
                    .push(record),
                None => self.terminal.push(record),
            }
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Records in one bucket, in insertion order
    pub fn bucket(&self, treatment_type: TreatmentType, bucket: StatusBucket) -> &[Attendance] {
        self.buckets
            .get(&(treatment_type, bucket))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cancelled and missed records for the day
    pub fn terminal(&self) -> &[Attendance] {
        &self.terminal
    }

    /// Every record in the snapshot: bucketed ones in treatment-type and
    /// bucket order, then the terminal ones
    pub fn all(&self) -> Vec<&Attendance> {
        let mut records = Vec::with_capacity(self.len());
        for treatment_type in TreatmentType::ALL {
            for bucket in StatusBucket::ALL {
                records.extend(self.bucket(treatment_type, bucket));
            }
        }
        records.extend(self.terminal.iter());
        records
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum::<usize>() + self.terminal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Day totals, computed by scanning the snapshot.
    ///
    /// Patients are counted distinct by ID. `missed` counts only unjustified
    /// absences; a justified absence keeps status Missed but is excluded.
    pub fn completion_data(&self) -> EndOfDayCompletionData {
        let mut total: HashSet<&str> = HashSet::new();
        let mut completed: HashSet<&str> = HashSet::new();
        let mut missed: HashSet<&str> = HashSet::new();

        for record in self.all() {
            if !record.is_active() {
                continue;
            }
            total.insert(&record.patient_id);
            match record.status {
                AttendanceStatus::Completed => {
                    completed.insert(&record.patient_id);
                }
                AttendanceStatus::Missed if !record.is_justified_absence() => {
                    missed.insert(&record.patient_id);
                }
                _ => {}
            }
        }

        EndOfDayCompletionData {
            total_patients: total.len(),
            completed: completed.len(),
            missed: missed.len(),
            completed_at: Utc::now().to_rfc3339(),
        }
    }
}
