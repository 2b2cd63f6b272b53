//! # IO Module
//!
//! Interface layer between the domain services and the remote attendance
//! system. The remote REST API is the source of truth for every record; this
//! module defines the client abstraction the domain layer is injected with,
//! the HTTP implementation of it, and the mappers between wire DTOs and
//! domain models.

pub mod api;
pub mod http;
pub mod mappers;

#[cfg(test)]
pub mod mock;

pub use api::{AttendanceApi, PatientApi};
pub use http::HttpApi;
