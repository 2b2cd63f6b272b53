//! # API Traits
//!
//! This module defines the client abstraction for the remote attendance
//! system. The domain layer only ever talks to these traits, allowing the
//! HTTP implementation to be swapped for an in-memory one in tests without
//! modification.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    AttendanceRecord, BulkStatusUpdateRequest, CreateAttendanceRequest, CreatePatientRequest,
    MarkMissedRequest, Patient, UpdateAttendanceRequest, UpdatePatientRequest,
};

/// Trait defining the remote attendance operations
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Create a new attendance record; the remote system assigns the ID
    async fn create_attendance(&self, request: &CreateAttendanceRequest)
        -> Result<AttendanceRecord>;

    /// Partially update an attendance record
    async fn update_attendance(
        &self,
        attendance_id: &str,
        request: &UpdateAttendanceRequest,
    ) -> Result<AttendanceRecord>;

    /// Mark an attendance as completed
    async fn complete_attendance(&self, attendance_id: &str) -> Result<AttendanceRecord>;

    /// Mark an attendance as missed without justification
    async fn mark_missed(
        &self,
        attendance_id: &str,
        request: &MarkMissedRequest,
    ) -> Result<AttendanceRecord>;

    /// Update the status of several attendances at once
    /// Returns the number of records the remote system updated
    async fn bulk_update_status(&self, request: &BulkStatusUpdateRequest) -> Result<u32>;

    /// Remove an attendance record; terminal operation
    async fn delete_attendance(&self, attendance_id: &str) -> Result<()>;

    /// List all attendances scheduled for a date, in remote insertion order
    async fn list_attendances_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;
}

/// Trait defining the remote patient operations
#[async_trait]
pub trait PatientApi: Send + Sync {
    /// Register a new patient; the remote system assigns the ID
    async fn create_patient(&self, request: &CreatePatientRequest) -> Result<Patient>;

    /// Partially update an existing patient
    async fn update_patient(
        &self,
        patient_id: &str,
        request: &UpdatePatientRequest,
    ) -> Result<Patient>;

    /// Retrieve a patient by ID
    async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>>;
}
