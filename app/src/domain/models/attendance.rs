//! Domain model for attendance records.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::{AttendanceStatus, TreatmentType};

/// One scheduled instance of a patient receiving a treatment on a date.
///
/// Domain-side counterpart of `shared::AttendanceRecord` with dates and
/// times parsed into proper types. Conversion lives in `io::mappers`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attendance {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub treatment_type: TreatmentType,
    pub status: AttendanceStatus,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub absence_justified: Option<bool>,
    pub absence_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    /// Whether this record still counts for duplicate prevention
    pub fn is_active(&self) -> bool {
        self.status != AttendanceStatus::Cancelled
    }

    /// Whether the record is still awaiting an outcome for the day
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            AttendanceStatus::Scheduled | AttendanceStatus::CheckedIn | AttendanceStatus::InProgress
        )
    }

    /// A missed record whose absence was reviewed and accepted
    pub fn is_justified_absence(&self) -> bool {
        self.status == AttendanceStatus::Missed && self.absence_justified == Some(true)
    }
}
