use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wire format for calendar dates (YYYY-MM-DD).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for times of day (HH:MM).
pub const TIME_FORMAT: &str = "%H:%M";

/// Treatment type offered by the center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    /// Spiritual consultation
    Spiritual,
    /// Light bath session
    LightBath,
    /// Rod application session
    Rod,
}

impl TreatmentType {
    /// All treatment types, in the order the daily views present them
    pub const ALL: [TreatmentType; 3] = [
        TreatmentType::Spiritual,
        TreatmentType::LightBath,
        TreatmentType::Rod,
    ];

    /// Human-readable label for display and error messages
    pub fn label(&self) -> &'static str {
        match self {
            TreatmentType::Spiritual => "Spiritual Consultation",
            TreatmentType::LightBath => "Light Bath",
            TreatmentType::Rod => "Rod",
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TreatmentType {
    type Err = ParseTreatmentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spiritual" => Ok(TreatmentType::Spiritual),
            "light-bath" | "light_bath" | "lightbath" => Ok(TreatmentType::LightBath),
            "rod" => Ok(TreatmentType::Rod),
            other => Err(ParseTreatmentTypeError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseTreatmentTypeError(pub String);

impl fmt::Display for ParseTreatmentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown treatment type: {}", self.0)
    }
}

impl std::error::Error for ParseTreatmentTypeError {}

/// Lifecycle status of an attendance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Planned for a slot, patient not yet present
    Scheduled,
    /// Patient is physically present
    CheckedIn,
    /// Treatment session has started
    InProgress,
    /// Treatment session finished
    Completed,
    /// Explicitly cancelled; excluded from duplicate checks
    Cancelled,
    /// Patient never checked in (absence, justified or not)
    Missed,
}

impl AttendanceStatus {
    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Scheduled => "Scheduled",
            AttendanceStatus::CheckedIn => "Checked In",
            AttendanceStatus::InProgress => "In Progress",
            AttendanceStatus::Completed => "Completed",
            AttendanceStatus::Cancelled => "Cancelled",
            AttendanceStatus::Missed => "Missed",
        }
    }

    /// Whether this status ends the record's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Completed | AttendanceStatus::Cancelled | AttendanceStatus::Missed
        )
    }

    /// Whether a status transition is allowed by the attendance lifecycle.
    ///
    /// Scheduled -> Scheduled covers moving the slot to a new date or time;
    /// checked-in and in-progress records may fall back to Scheduled when an
    /// unfinished session is re-queued at end of day.
    pub fn may_transition_to(self, next: AttendanceStatus) -> bool {
        use AttendanceStatus::*;
        match self {
            Scheduled => matches!(next, CheckedIn | Cancelled | Missed | Scheduled),
            CheckedIn => matches!(next, InProgress | Completed | Scheduled | Cancelled),
            InProgress => matches!(next, Completed | Scheduled | Cancelled),
            Completed | Cancelled | Missed => false,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One scheduled instance of a patient receiving a treatment on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub treatment_type: TreatmentType,
    pub status: AttendanceStatus,
    /// Calendar date of the slot (YYYY-MM-DD)
    pub scheduled_date: String,
    /// Time of day of the slot (HH:MM)
    pub scheduled_time: String,
    /// Set when an absence was reviewed at end of day
    pub absence_justified: Option<bool>,
    pub absence_notes: Option<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl AttendanceRecord {
    /// Generate an attendance ID in the format "attendance::<uuid>"
    pub fn generate_id() -> String {
        format!("attendance::{}", Uuid::new_v4())
    }

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

    pub fn parse_scheduled_date(&self) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(&self.scheduled_date, DATE_FORMAT)
    }

    pub fn parse_scheduled_time(&self) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(&self.scheduled_time, TIME_FORMAT)
    }
}

/// Request for creating a new attendance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAttendanceRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub treatment_type: TreatmentType,
    pub scheduled_date: String,
    pub scheduled_time: String,
}

/// Partial update of an attendance record; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAttendanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_justified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_notes: Option<String>,
}

/// Request for marking an attendance as missed without justification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkMissedRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request for updating the status of several attendances at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkStatusUpdateRequest {
    pub attendance_ids: Vec<String>,
    pub status: AttendanceStatus,
}

/// Response after a bulk status update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkStatusUpdateResponse {
    pub updated_count: u32,
}

/// Response containing all attendances for a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceListResponse {
    pub attendances: Vec<AttendanceRecord>,
}

/// A patient registered with the center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    /// ISO 8601 date (YYYY-MM-DD)
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Patient {
    /// Generate a patient ID in the format "patient::<uuid>"
    pub fn generate_id() -> String {
        format!("patient::{}", Uuid::new_v4())
    }
}

/// Request for registering a new patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
}

/// Request for updating an existing patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response after creating or updating a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientResponse {
    pub patient: Patient,
    pub success_message: String,
}

/// A reviewed absence, collected during the end-of-day flow.
///
/// Built transiently while stepping through the reconciliation dialog and
/// submitted with the batch commit; never persisted locally afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceJustification {
    pub attendance_id: String,
    pub patient_name: String,
    pub justified: bool,
    pub notes: String,
}

/// Day totals computed when the day is finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndOfDayCompletionData {
    pub total_patients: usize,
    pub completed: usize,
    /// Unjustified absences only; a justified absence stays status Missed
    /// but is not counted here
    pub missed: usize,
    /// RFC 3339 timestamp
    pub completed_at: String,
}
