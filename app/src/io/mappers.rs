//! Mappers between wire DTOs and domain models.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::{AttendanceRecord, DATE_FORMAT, TIME_FORMAT};

use crate::domain::models::Attendance;

/// Mapper to convert between shared attendance DTOs and domain models.
pub struct AttendanceMapper;

impl AttendanceMapper {
    /// Converts a shared AttendanceRecord DTO to a domain Attendance model.
    pub fn to_domain(dto: AttendanceRecord) -> Result<Attendance> {
        let scheduled_date = NaiveDate::parse_from_str(&dto.scheduled_date, DATE_FORMAT)
            .with_context(|| format!("Failed to parse scheduled_date of {}", dto.id))?;
        let scheduled_time = NaiveTime::parse_from_str(&dto.scheduled_time, TIME_FORMAT)
            .with_context(|| format!("Failed to parse scheduled_time of {}", dto.id))?;
        let created_at = DateTime::parse_from_rfc3339(&dto.created_at)
            .with_context(|| format!("Failed to parse created_at of {}", dto.id))?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&dto.updated_at)
            .with_context(|| format!("Failed to parse updated_at of {}", dto.id))?
            .with_timezone(&Utc);

        Ok(Attendance {
            id: dto.id,
            patient_id: dto.patient_id,
            patient_name: dto.patient_name,
            treatment_type: dto.treatment_type,
            status: dto.status,
            scheduled_date,
            scheduled_time,
            absence_justified: dto.absence_justified,
            absence_notes: dto.absence_notes,
            created_at,
            updated_at,
        })
    }

    /// Converts a domain Attendance model to a shared AttendanceRecord DTO.
    pub fn to_dto(domain: Attendance) -> AttendanceRecord {
        AttendanceRecord {
            id: domain.id,
            patient_id: domain.patient_id,
            patient_name: domain.patient_name,
            treatment_type: domain.treatment_type,
            status: domain.status,
            scheduled_date: domain.scheduled_date.format(DATE_FORMAT).to_string(),
            scheduled_time: domain.scheduled_time.format(TIME_FORMAT).to_string(),
            absence_justified: domain.absence_justified,
            absence_notes: domain.absence_notes,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    /// Converts a list of DTOs, failing on the first malformed record.
    pub fn to_domain_list(dtos: Vec<AttendanceRecord>) -> Result<Vec<Attendance>> {
        dtos.into_iter().map(Self::to_domain).collect()
    }
}
