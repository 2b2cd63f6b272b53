//! Domain-level command and result types.
//!
//! These structs are used by the services inside the domain layer. The CLI
//! (or any other UI surface) maps its own inputs onto these internal types;
//! the wire DTOs live in the `shared` crate.

pub mod attendance {
    use chrono::{NaiveDate, NaiveTime};
    use shared::TreatmentType;

    use crate::domain::models::Attendance;

    /// Input for registering a patient for one or more treatments on a date.
    #[derive(Debug, Clone)]
    pub struct RegisterAttendanceCommand {
        pub patient_id: String,
        pub patient_name: String,
        pub date: NaiveDate,
        pub time: NaiveTime,
        pub treatment_types: Vec<TreatmentType>,
        /// Check the patient in immediately after creation (walk-ins)
        pub check_in: bool,
    }

    /// One created attendance, with the outcome of the best-effort check-in.
    ///
    /// Creation is the primary operation; the immediate check-in is a
    /// secondary step whose failure never rolls the creation back.
    #[derive(Debug, Clone)]
    pub struct RegisteredAttendance {
        pub attendance: Attendance,
        pub checked_in: bool,
        pub check_in_error: Option<String>,
    }

    /// One treatment type whose create request was rejected remotely.
    #[derive(Debug, Clone)]
    pub struct RegistrationFailure {
        pub treatment_type: TreatmentType,
        pub error: String,
    }

    /// Result of a registration fan-out, aggregated after all requests settle.
    #[derive(Debug, Clone)]
    pub struct RegisterAttendanceResult {
        pub registered: Vec<RegisteredAttendance>,
        pub failures: Vec<RegistrationFailure>,
    }

    impl RegisterAttendanceResult {
        /// True only when every create request succeeded
        pub fn success(&self) -> bool {
            self.failures.is_empty()
        }
    }
}

pub mod end_of_day {
    use shared::AbsenceJustification;

    use crate::domain::models::Attendance;

    /// The accumulated decisions of a finished reconciliation flow,
    /// ready for the batch commit.
    #[derive(Debug, Clone)]
    pub struct EndOfDayDecisions {
        /// Incomplete attendances to mark completed
        pub complete: Vec<Attendance>,
        /// Incomplete attendances to re-queue as scheduled
        pub reschedule: Vec<Attendance>,
        /// Reviewed absences, justified or not
        pub justifications: Vec<AbsenceJustification>,
    }

    impl EndOfDayDecisions {
        pub fn is_empty(&self) -> bool {
            self.complete.is_empty() && self.reschedule.is_empty() && self.justifications.is_empty()
        }
    }
}
