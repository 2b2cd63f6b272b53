//! HTTP client for the remote attendance REST API.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use shared::{
    AttendanceListResponse, AttendanceRecord, BulkStatusUpdateRequest, BulkStatusUpdateResponse,
    CreateAttendanceRequest, CreatePatientRequest, MarkMissedRequest, Patient,
    UpdateAttendanceRequest, UpdatePatientRequest, DATE_FORMAT,
};

use crate::config::AppConfig;
use crate::io::api::{AttendanceApi, PatientApi};

/// Client for the attendance system's REST API
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client from the application configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client against a specific base URL with default settings
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = AppConfig {
            api_base_url: base_url.into(),
            ..AppConfig::default()
        };
        Self::new(&config)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Build an error from a non-success response, keeping the response body
async fn api_error(operation: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    anyhow!("{} failed with {}: {}", operation, status, body)
}

#[async_trait]
impl AttendanceApi for HttpApi {
    async fn create_attendance(
        &self,
        request: &CreateAttendanceRequest,
    ) -> Result<AttendanceRecord> {
        let response = self
            .client
            .post(self.url("/api/attendances"))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("create attendance", response).await)
        }
    }

    async fn update_attendance(
        &self,
        attendance_id: &str,
        request: &UpdateAttendanceRequest,
    ) -> Result<AttendanceRecord> {
        let response = self
            .client
            .patch(self.url(&format!("/api/attendances/{}", attendance_id)))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("update attendance", response).await)
        }
    }

    async fn complete_attendance(&self, attendance_id: &str) -> Result<AttendanceRecord> {
        let response = self
            .client
            .post(self.url(&format!("/api/attendances/{}/complete", attendance_id)))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("complete attendance", response).await)
        }
    }

    async fn mark_missed(
        &self,
        attendance_id: &str,
        request: &MarkMissedRequest,
    ) -> Result<AttendanceRecord> {
        let response = self
            .client
            .post(self.url(&format!("/api/attendances/{}/miss", attendance_id)))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("mark attendance missed", response).await)
        }
    }

    async fn bulk_update_status(&self, request: &BulkStatusUpdateRequest) -> Result<u32> {
        let response = self
            .client
            .post(self.url("/api/attendances/bulk-status"))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let body: BulkStatusUpdateResponse = response.json().await?;
            Ok(body.updated_count)
        } else {
            Err(api_error("bulk status update", response).await)
        }
    }

    async fn delete_attendance(&self, attendance_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/attendances/{}", attendance_id)))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error("delete attendance", response).await)
        }
    }

    async fn list_attendances_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/api/attendances?date={}",
                date.format(DATE_FORMAT)
            )))
            .send()
            .await?;

        if response.status().is_success() {
            let body: AttendanceListResponse = response.json().await?;
            Ok(body.attendances)
        } else {
            Err(api_error("list attendances", response).await)
        }
    }
}

#[async_trait]
impl PatientApi for HttpApi {
    async fn create_patient(&self, request: &CreatePatientRequest) -> Result<Patient> {
        let response = self
            .client
            .post(self.url("/api/patients"))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("create patient", response).await)
        }
    }

    async fn update_patient(
        &self,
        patient_id: &str,
        request: &UpdatePatientRequest,
    ) -> Result<Patient> {
        let response = self
            .client
            .patch(self.url(&format!("/api/patients/{}", patient_id)))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error("update patient", response).await)
        }
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        let response = self
            .client
            .get(self.url(&format!("/api/patients/{}", patient_id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(api_error("get patient", response).await)
        }
    }
}
