//! Patient registration and maintenance on top of the remote patient API.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use shared::{CreatePatientRequest, Patient, PatientResponse, UpdatePatientRequest, DATE_FORMAT};

use crate::io::api::PatientApi;

/// Service for managing patients
#[derive(Clone)]
pub struct PatientService {
    api: Arc<dyn PatientApi>,
}

impl PatientService {
    /// Create a new PatientService
    pub fn new(api: Arc<dyn PatientApi>) -> Self {
        Self { api }
    }

    /// Register a new patient
    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<PatientResponse> {
        info!("Creating patient: name={}", request.name);

        self.validate_create_request(&request)?;

        let request = CreatePatientRequest {
            name: request.name.trim().to_string(),
            ..request
        };
        let patient = self.api.create_patient(&request).await?;

        info!("Created patient: {} with ID: {}", patient.name, patient.id);

        Ok(PatientResponse {
            patient,
            success_message: "Patient registered successfully".to_string(),
        })
    }

    /// Get a patient by ID
    pub async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        let patient = self.api.get_patient(patient_id).await?;

        if patient.is_none() {
            warn!("Patient not found: {}", patient_id);
        }

        Ok(patient)
    }

    /// Update an existing patient
    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<PatientResponse> {
        info!("Updating patient: {}", patient_id);

        self.validate_update_request(&request)?;

        let request = UpdatePatientRequest {
            name: request.name.map(|n| n.trim().to_string()),
            ..request
        };
        let patient = self.api.update_patient(patient_id, &request).await?;

        info!("Updated patient: {} with ID: {}", patient.name, patient.id);

        Ok(PatientResponse {
            patient,
            success_message: "Patient updated successfully".to_string(),
        })
    }

    fn validate_create_request(&self, request: &CreatePatientRequest) -> Result<()> {
        self.validate_name(&request.name)?;

        if let Some(ref birthdate) = request.birthdate {
            self.validate_birthdate(birthdate)?;
        }

        Ok(())
    }

    fn validate_update_request(&self, request: &UpdatePatientRequest) -> Result<()> {
        if let Some(ref name) = request.name {
            self.validate_name(name)?;
        }

        if let Some(ref birthdate) = request.birthdate {
            self.validate_birthdate(birthdate)?;
        }

        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Patient name cannot be empty"));
        }
        if name.len() > 120 {
            return Err(anyhow!("Patient name cannot exceed 120 characters"));
        }
        Ok(())
    }

    fn validate_birthdate(&self, birthdate: &str) -> Result<()> {
        NaiveDate::parse_from_str(birthdate, DATE_FORMAT)
            .map_err(|_| anyhow!("Birthdate must be a valid YYYY-MM-DD date"))?;
        Ok(())
    }
}
