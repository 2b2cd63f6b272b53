//! Daily agenda views derived from a store snapshot.
//!
//! Pure view generation: the service never talks to the remote system, it
//! reorganizes an already-fetched day for display. Sections are ordered by
//! treatment type and, within a section, by scheduled time.

use chrono::{NaiveDate, NaiveTime};
use shared::{AttendanceStatus, TreatmentType};

use crate::domain::models::Attendance;
use crate::store::AttendanceStore;

/// One patient slot in the agenda
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaEntry {
    pub attendance_id: String,
    pub patient_name: String,
    pub time: NaiveTime,
    pub status: AttendanceStatus,
}

/// All slots of one treatment type, ordered by time
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaSection {
    pub treatment_type: TreatmentType,
    pub entries: Vec<AgendaEntry>,
}

/// Day-level counts shown above the agenda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgendaTotals {
    pub scheduled: usize,
    pub present: usize,
    pub completed: usize,
    pub missed: usize,
    pub cancelled: usize,
}

/// A full day of attendances organized for display
#[derive(Debug, Clone, PartialEq)]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub sections: Vec<AgendaSection>,
    pub totals: AgendaTotals,
}

/// Service generating agenda views
#[derive(Clone)]
pub struct AgendaService;

impl AgendaService {
    pub fn new() -> Self {
        Self
    }

    /// Build the agenda for a day snapshot.
    ///
    /// Every non-empty treatment type gets a section; cancelled records are
    /// counted in the totals but not listed.
    pub fn day_agenda(&self, store: &AttendanceStore) -> DayAgenda {
        let mut sections = Vec::new();
        let mut totals = AgendaTotals::default();

        for treatment_type in TreatmentType::ALL {
            let mut entries: Vec<AgendaEntry> = store
                .all()
                .into_iter()
                .filter(|a| a.treatment_type == treatment_type && a.is_active())
                .map(Self::entry)
                .collect();
            entries.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| {
                a.patient_name.cmp(&b.patient_name)
            }));

            if !entries.is_empty() {
                sections.push(AgendaSection {
                    treatment_type,
                    entries,
                });
            }
        }

        for attendance in store.all() {
            match attendance.status {
                AttendanceStatus::Scheduled => totals.scheduled += 1,
                AttendanceStatus::CheckedIn | AttendanceStatus::InProgress => totals.present += 1,
                AttendanceStatus::Completed => totals.completed += 1,
                AttendanceStatus::Missed => totals.missed += 1,
                AttendanceStatus::Cancelled => totals.cancelled += 1,
            }
        }

        DayAgenda {
            date: store.date(),
            sections,
            totals,
        }
    }

    fn entry(attendance: &Attendance) -> AgendaEntry {
        AgendaEntry {
            attendance_id: attendance.id.clone(),
            patient_name: attendance.patient_name.clone(),
            time: attendance.scheduled_time,
            status: attendance.status,
        }
    }
}

impl Default for AgendaService {
    fn default() -> Self {
        Self::new()
    }
}
