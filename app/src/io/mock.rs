//! In-memory implementation of the API traits, used by the service tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use shared::{
    AttendanceRecord, AttendanceStatus, BulkStatusUpdateRequest, CreateAttendanceRequest,
    CreatePatientRequest, MarkMissedRequest, Patient, TreatmentType, UpdateAttendanceRequest,
    UpdatePatientRequest, DATE_FORMAT,
};

use crate::domain::models::Attendance;
use crate::io::api::{AttendanceApi, PatientApi};

/// In-memory stand-in for the remote attendance system.
///
/// Failure injection: `fail_list` makes the by-date listing fail,
/// `fail_create` fails every create, `fail_updates` fails every partial
/// update, and `fail_for` fails any mutation of one specific record.
#[derive(Default)]
pub struct MockApi {
    attendances: Mutex<Vec<AttendanceRecord>>,
    patients: Mutex<Vec<Patient>>,
    fail_ids: Mutex<HashSet<String>>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_updates: AtomicBool,
    pub create_calls: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, records: Vec<AttendanceRecord>) {
        self.attendances.lock().unwrap().extend(records);
    }

    /// Make every mutation of this record fail
    pub fn fail_for(&self, attendance_id: &str) {
        self.fail_ids
            .lock()
            .unwrap()
            .insert(attendance_id.to_string());
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.attendances.lock().unwrap().clone()
    }

    pub fn find(&self, attendance_id: &str) -> Option<AttendanceRecord> {
        self.attendances
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == attendance_id)
            .cloned()
    }

    fn check_failure(&self, attendance_id: &str) -> Result<()> {
        if self.fail_ids.lock().unwrap().contains(attendance_id) {
            Err(anyhow!("Injected failure for {}", attendance_id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AttendanceApi for MockApi {
    async fn create_attendance(
        &self,
        request: &CreateAttendanceRequest,
    ) -> Result<AttendanceRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow!("Injected create failure"));
        }

        let now = Utc::now().to_rfc3339();
        let record = AttendanceRecord {
            id: AttendanceRecord::generate_id(),
            patient_id: request.patient_id.clone(),
            patient_name: request.patient_name.clone(),
            treatment_type: request.treatment_type,
            status: AttendanceStatus::Scheduled,
            scheduled_date: request.scheduled_date.clone(),
            scheduled_time: request.scheduled_time.clone(),
            absence_justified: None,
            absence_notes: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.attendances.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_attendance(
        &self,
        attendance_id: &str,
        request: &UpdateAttendanceRequest,
    ) -> Result<AttendanceRecord> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(anyhow!("Injected update failure"));
        }
        self.check_failure(attendance_id)?;

        let mut attendances = self.attendances.lock().unwrap();
        let record = attendances
            .iter_mut()
            .find(|a| a.id == attendance_id)
            .ok_or_else(|| anyhow!("Attendance not found: {}", attendance_id))?;

        if let Some(status) = request.status {
            record.status = status;
        }
        if let Some(ref date) = request.scheduled_date {
            record.scheduled_date = date.clone();
        }
        if let Some(ref time) = request.scheduled_time {
            record.scheduled_time = time.clone();
        }
        if let Some(justified) = request.absence_justified {
            record.absence_justified = Some(justified);
        }
        if let Some(ref notes) = request.absence_notes {
            record.absence_notes = Some(notes.clone());
        }
        record.updated_at = Utc::now().to_rfc3339();
        Ok(record.clone())
    }

    async fn complete_attendance(&self, attendance_id: &str) -> Result<AttendanceRecord> {
        self.check_failure(attendance_id)?;

        let mut attendances = self.attendances.lock().unwrap();
        let record = attendances
            .iter_mut()
            .find(|a| a.id == attendance_id)
            .ok_or_else(|| anyhow!("Attendance not found: {}", attendance_id))?;
        record.status = AttendanceStatus::Completed;
        record.updated_at = Utc::now().to_rfc3339();
        Ok(record.clone())
    }

    async fn mark_missed(
        &self,
        attendance_id: &str,
        request: &MarkMissedRequest,
    ) -> Result<AttendanceRecord> {
        self.check_failure(attendance_id)?;

        let mut attendances = self.attendances.lock().unwrap();
        let record = attendances
            .iter_mut()
            .find(|a| a.id == attendance_id)
            .ok_or_else(|| anyhow!("Attendance not found: {}", attendance_id))?;
        record.status = AttendanceStatus::Missed;
        record.absence_justified = Some(false);
        record.absence_notes = request.notes.clone();
        record.updated_at = Utc::now().to_rfc3339();
        Ok(record.clone())
    }

    async fn bulk_update_status(&self, request: &BulkStatusUpdateRequest) -> Result<u32> {
        let mut attendances = self.attendances.lock().unwrap();
        let mut updated = 0;
        for record in attendances.iter_mut() {
            if request.attendance_ids.contains(&record.id) {
                record.status = request.status;
                record.updated_at = Utc::now().to_rfc3339();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_attendance(&self, attendance_id: &str) -> Result<()> {
        let mut attendances = self.attendances.lock().unwrap();
        let before = attendances.len();
        attendances.retain(|a| a.id != attendance_id);
        if attendances.len() == before {
            return Err(anyhow!("Attendance not found: {}", attendance_id));
        }
        Ok(())
    }

    async fn list_attendances_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("Injected list failure"));
        }

        let wanted = date.format(DATE_FORMAT).to_string();
        Ok(self
            .attendances
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.scheduled_date == wanted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PatientApi for MockApi {
    async fn create_patient(&self, request: &CreatePatientRequest) -> Result<Patient> {
        let now = Utc::now().to_rfc3339();
        let patient = Patient {
            id: Patient::generate_id(),
            name: request.name.clone(),
            birthdate: request.birthdate.clone(),
            phone: request.phone.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.patients.lock().unwrap().push(patient.clone());
        Ok(patient)
    }

    async fn update_patient(
        &self,
        patient_id: &str,
        request: &UpdatePatientRequest,
    ) -> Result<Patient> {
        let mut patients = self.patients.lock().unwrap();
        let patient = patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or_else(|| anyhow!("Patient not found: {}", patient_id))?;

        if let Some(ref name) = request.name {
            patient.name = name.clone();
        }
        if let Some(ref birthdate) = request.birthdate {
            patient.birthdate = Some(birthdate.clone());
        }
        if let Some(ref phone) = request.phone {
            patient.phone = Some(phone.clone());
        }
        patient.updated_at = Utc::now().to_rfc3339();
        Ok(patient.clone())
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == patient_id)
            .cloned())
    }
}

/// Wire-level fixture with sensible defaults
pub fn record(
    id: &str,
    patient_name: &str,
    treatment_type: TreatmentType,
    status: AttendanceStatus,
    date: NaiveDate,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        patient_id: format!("patient::{}", patient_name.to_lowercase().replace(' ', "-")),
        patient_name: patient_name.to_string(),
        treatment_type,
        status,
        scheduled_date: date.format(DATE_FORMAT).to_string(),
        scheduled_time: "09:00".to_string(),
        absence_justified: None,
        absence_notes: None,
        created_at: "2025-03-10T08:00:00+00:00".to_string(),
        updated_at: "2025-03-10T08:00:00+00:00".to_string(),
    }
}

/// Domain-level fixture with sensible defaults
pub fn attendance(
    id: &str,
    patient_name: &str,
    treatment_type: TreatmentType,
    status: AttendanceStatus,
    date: NaiveDate,
) -> Attendance {
    crate::io::mappers::AttendanceMapper::to_domain(record(
        id,
        patient_name,
        treatment_type,
        status,
        date,
    ))
    .expect("fixture record should be well-formed")
}

/// Default date used by fixtures and tests
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// Default time used by fixtures and tests
pub fn test_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}
