//! # Attendance Service
//!
//! Registration and lifecycle operations for attendance records, on top of
//! the remote attendance API. Registration validates locally, runs the
//! duplicate guard, then fans the create requests out concurrently; status
//! transitions are checked against the lifecycle before the remote call.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use shared::{
    AttendanceStatus, CreateAttendanceRequest, MarkMissedRequest, TreatmentType,
    UpdateAttendanceRequest, DATE_FORMAT, TIME_FORMAT,
};

use crate::domain::commands::attendance::{
    RegisterAttendanceCommand, RegisterAttendanceResult, RegisteredAttendance, RegistrationFailure,
};
use crate::domain::models::Attendance;
use crate::io::api::AttendanceApi;
use crate::io::mappers::AttendanceMapper;
use crate::store::AttendanceStore;

/// Rejection raised by the duplicate guard, listing every conflicting type
#[derive(Debug, Error)]
#[error("{patient_name} already has an attendance on {date} for: {}", .conflicts.join(", "))]
pub struct DuplicateAttendanceError {
    pub patient_name: String,
    pub date: NaiveDate,
    pub conflicts: Vec<String>,
}

/// Service for managing attendance records
#[derive(Clone)]
pub struct AttendanceService {
    api: Arc<dyn AttendanceApi>,
}

impl AttendanceService {
    /// Create a new AttendanceService
    pub fn new(api: Arc<dyn AttendanceApi>) -> Self {
        Self { api }
    }

    /// Register a patient for the selected treatment types on one date.
    ///
    /// Validation and the duplicate guard run before any create request is
    /// issued. The create requests themselves run concurrently and their
    /// outcomes are aggregated after all settle: remote failures end up in
    /// the result, not in an `Err`. When the command asks for an immediate
    /// check-in, each created record is checked in as a best-effort
    /// secondary step that never rolls the creation back.
    pub async fn register(
        &self,
        command: RegisterAttendanceCommand,
    ) -> Result<RegisterAttendanceResult> {
        info!(
            "Registering {} for {} treatment type(s) on {}",
            command.patient_name,
            command.treatment_types.len(),
            command.date
        );

        self.validate_register_command(&command)?;
        self.check_duplicates(&command).await?;

        let creates = command
            .treatment_types
            .iter()
            .map(|&treatment_type| self.create_one(&command, treatment_type));

        let mut registered = Vec::new();
        let mut failures = Vec::new();
        for outcome in join_all(creates).await {
            match outcome {
                Ok(attendance) => registered.push(attendance),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} create request(s) failed for {}",
                failures.len(),
                command.treatment_types.len(),
                command.patient_name
            );
        }

        Ok(RegisterAttendanceResult {
            registered,
            failures,
        })
    }

    async fn create_one(
        &self,
        command: &RegisterAttendanceCommand,
        treatment_type: TreatmentType,
    ) -> Result<RegisteredAttendance, RegistrationFailure> {
        let request = CreateAttendanceRequest {
            patient_id: command.patient_id.clone(),
            patient_name: command.patient_name.trim().to_string(),
            treatment_type,
            scheduled_date: command.date.format(DATE_FORMAT).to_string(),
            scheduled_time: command.time.format(TIME_FORMAT).to_string(),
        };

        let failure = |error: String| RegistrationFailure {
            treatment_type,
            error,
        };

        let dto = self
            .api
            .create_attendance(&request)
            .await
            .map_err(|e| failure(e.to_string()))?;
        let mut attendance =
            AttendanceMapper::to_domain(dto).map_err(|e| failure(e.to_string()))?;

        // Secondary step: check the fresh record in. Primary succeeded, so
        // a failure here is reported but does not undo the creation.
        let mut checked_in = false;
        let mut check_in_error = None;
        if command.check_in {
            match self
                .api
                .update_attendance(
                    &attendance.id,
                    &UpdateAttendanceRequest {
                        status: Some(AttendanceStatus::CheckedIn),
                        ..Default::default()
                    },
                )
                .await
            {
                Ok(updated) => {
                    checked_in = true;
                    if let Ok(updated) = AttendanceMapper::to_domain(updated) {
                        attendance = updated;
                    }
                }
                Err(e) => {
                    warn!("Check-in after creation failed for {}: {}", attendance.id, e);
                    check_in_error = Some(e.to_string());
                }
            }
        }

        Ok(RegisteredAttendance {
            attendance,
            checked_in,
            check_in_error,
        })
    }

    fn validate_register_command(&self, command: &RegisterAttendanceCommand) -> Result<()> {
        if command.patient_name.trim().is_empty() {
            return Err(anyhow!("Patient name cannot be empty"));
        }
        if command.patient_name.len() > 120 {
            return Err(anyhow!("Patient name cannot exceed 120 characters"));
        }
        if command.treatment_types.is_empty() {
            return Err(anyhow!("At least one treatment type must be selected"));
        }

        let mut seen = HashSet::new();
        for treatment_type in &command.treatment_types {
            if !seen.insert(treatment_type) {
                return Err(anyhow!(
                    "Treatment type {} selected more than once",
                    treatment_type.label()
                ));
            }
        }

        Ok(())
    }

    /// Duplicate guard: reject every requested type the patient already has
    /// a non-cancelled attendance for on that date.
    ///
    /// When the listing itself fails the guard fails open: registration
    /// proceeds and the condition is logged. Availability wins over
    /// strictness here.
    async fn check_duplicates(&self, command: &RegisterAttendanceCommand) -> Result<()> {
        let existing = match self.api.list_attendances_by_date(command.date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Duplicate check unavailable, proceeding without it: {}", e);
                return Ok(());
            }
        };

        let taken: HashSet<TreatmentType> = existing
            .iter()
            .filter(|r| r.patient_id == command.patient_id && r.is_active())
            .map(|r| r.treatment_type)
            .collect();

        let conflicts: Vec<String> = command
            .treatment_types
            .iter()
            .filter(|t| taken.contains(t))
            .map(|t| t.label().to_string())
            .collect();

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(DuplicateAttendanceError {
                patient_name: command.patient_name.clone(),
                date: command.date,
                conflicts,
            }
            .into())
        }
    }

    /// Mark the patient as physically present
    pub async fn check_in(&self, attendance: &Attendance) -> Result<Attendance> {
        self.transition(attendance, AttendanceStatus::CheckedIn)
            .await
    }

    /// Start the treatment session
    pub async fn begin_treatment(&self, attendance: &Attendance) -> Result<Attendance> {
        self.transition(attendance, AttendanceStatus::InProgress)
            .await
    }

    /// Cancel the attendance
    pub async fn cancel(&self, attendance: &Attendance) -> Result<Attendance> {
        self.transition(attendance, AttendanceStatus::Cancelled)
            .await
    }

    async fn transition(
        &self,
        attendance: &Attendance,
        next: AttendanceStatus,
    ) -> Result<Attendance> {
        if !attendance.status.may_transition_to(next) {
            return Err(anyhow!(
                "Cannot move attendance {} from {} to {}",
                attendance.id,
                attendance.status,
                next
            ));
        }

        let dto = self
            .api
            .update_attendance(
                &attendance.id,
                &UpdateAttendanceRequest {
                    status: Some(next),
                    ..Default::default()
                },
            )
            .await?;
        AttendanceMapper::to_domain(dto)
    }

    /// Mark the session finished
    pub async fn complete(&self, attendance: &Attendance) -> Result<Attendance> {
        if !attendance
            .status
            .may_transition_to(AttendanceStatus::Completed)
        {
            return Err(anyhow!(
                "Cannot complete attendance {} from {}",
                attendance.id,
                attendance.status
            ));
        }

        let dto = self.api.complete_attendance(&attendance.id).await?;
        AttendanceMapper::to_domain(dto)
    }

    /// Mark the patient as absent without justification
    pub async fn mark_missed(
        &self,
        attendance: &Attendance,
        notes: Option<String>,
    ) -> Result<Attendance> {
        if !attendance.status.may_transition_to(AttendanceStatus::Missed) {
            return Err(anyhow!(
                "Cannot mark attendance {} missed from {}",
                attendance.id,
                attendance.status
            ));
        }

        let dto = self
            .api
            .mark_missed(&attendance.id, &MarkMissedRequest { notes })
            .await?;
        AttendanceMapper::to_domain(dto)
    }

    /// Move the slot to a new date and time, re-queueing the record
    pub async fn reschedule(
        &self,
        attendance: &Attendance,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> Result<Attendance> {
        if !attendance
            .status
            .may_transition_to(AttendanceStatus::Scheduled)
        {
            return Err(anyhow!(
                "Cannot reschedule attendance {} from {}",
                attendance.id,
                attendance.status
            ));
        }

        let dto = self
            .api
            .update_attendance(
                &attendance.id,
                &UpdateAttendanceRequest {
                    status: Some(AttendanceStatus::Scheduled),
                    scheduled_date: Some(new_date.format(DATE_FORMAT).to_string()),
                    scheduled_time: Some(new_time.format(TIME_FORMAT).to_string()),
                    ..Default::default()
                },
            )
            .await?;
        AttendanceMapper::to_domain(dto)
    }

    /// Update the status of several attendances at once
    pub async fn bulk_update_status(
        &self,
        attendance_ids: Vec<String>,
        status: AttendanceStatus,
    ) -> Result<u32> {
        let updated = self
            .api
            .bulk_update_status(&shared::BulkStatusUpdateRequest {
                attendance_ids,
                status,
            })
            .await?;
        info!("Bulk status update applied to {} record(s)", updated);
        Ok(updated)
    }

    /// Remove an attendance record; terminal operation
    pub async fn delete(&self, attendance_id: &str) -> Result<()> {
        info!("Deleting attendance {}", attendance_id);
        self.api.delete_attendance(attendance_id).await
    }

    /// Fetch the day's records and build a fresh store snapshot.
    ///
    /// Called after every mutation; the previous snapshot is discarded
    /// rather than patched.
    pub async fn load_day(&self, date: NaiveDate) -> Result<AttendanceStore> {
        let records = self.api.list_attendances_by_date(date).await?;
        let attendances = AttendanceMapper::to_domain_list(records)?;
        Ok(AttendanceStore::from_records(date, attendances))
    }
}
