//! # Attendance Tracker
//!
//! Client core of the clinic attendance management system: patient
//! registration, daily check-in and treatment tracking, agenda views, and
//! the end-of-day reconciliation workflow.
//!
//! The remote REST API is the source of truth for every record; this crate
//! is the orchestration layer between a UI surface and that API.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (CLI)
//!     |
//! Domain Layer (services, reconciliation engine, batch commit)
//!     |
//! IO Layer (API traits, HTTP client, mappers)
//!     |
//! Remote REST API
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{AgendaService, AttendanceService, EndOfDayService, PatientService};
use crate::io::HttpApi;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub attendance_service: AttendanceService,
    pub patient_service: PatientService,
    pub agenda_service: AgendaService,
    pub end_of_day_service: EndOfDayService,
}

/// Initialize the application services against the configured remote API
pub fn initialize_app(config: &AppConfig) -> Result<AppState> {
    info!("Using attendance API at {}", config.api_base_url);
    let api = Arc::new(HttpApi::new(config)?);

    Ok(AppState {
        attendance_service: AttendanceService::new(api.clone()),
        patient_service: PatientService::new(api.clone()),
        agenda_service: AgendaService::new(),
        end_of_day_service: EndOfDayService::new(api),
    })
}
