//! # Batch Commit Coordinator
//!
//! Applies the accumulated end-of-day decisions, one remote update per
//! record. All requests within a batch run concurrently; there is no
//! ordering dependency between records. Failures are captured as structured
//! per-record results and never roll back records that already succeeded:
//! partial application is the documented behavior, not a bug.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use shared::{AbsenceJustification, AttendanceStatus, MarkMissedRequest, UpdateAttendanceRequest};
use tracing::{error, info};

use crate::domain::commands::end_of_day::EndOfDayDecisions;
use crate::domain::models::Attendance;
use crate::io::api::AttendanceApi;

/// How a batch of incomplete attendances is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteAction {
    /// Mark every record completed
    Complete,
    /// Re-queue every record as scheduled
    Reschedule,
}

/// Outcome of one record's remote update
#[derive(Debug, Clone)]
pub struct RecordCommitResult {
    pub attendance_id: String,
    pub patient_name: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregated outcome of one batch
#[derive(Debug, Clone)]
pub struct BatchCommitResult {
    /// True only if every per-record call succeeded
    pub success: bool,
    pub results: Vec<RecordCommitResult>,
    pub error: Option<String>,
}

impl BatchCommitResult {
    fn from_results(results: Vec<RecordCommitResult>) -> Self {
        let failed = results.iter().filter(|r| !r.success).count();
        let error = if failed > 0 {
            Some(format!("{} of {} updates failed", failed, results.len()))
        } else {
            None
        };

        Self {
            success: failed == 0,
            results,
            error,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Combined outcome of a full end-of-day submit.
///
/// A batch is `None` when its input set was empty and no remote call was
/// issued for it.
#[derive(Debug, Clone)]
pub struct EndOfDayCommitReport {
    pub completed: Option<BatchCommitResult>,
    pub rescheduled: Option<BatchCommitResult>,
    pub absences: Option<BatchCommitResult>,
}

impl EndOfDayCommitReport {
    pub fn success(&self) -> bool {
        [&self.completed, &self.rescheduled, &self.absences]
            .into_iter()
            .flatten()
            .all(|batch| batch.success)
    }
}

/// Issues the per-record remote updates for the end-of-day decisions
#[derive(Clone)]
pub struct BatchCommitCoordinator {
    api: Arc<dyn AttendanceApi>,
}

impl BatchCommitCoordinator {
    pub fn new(api: Arc<dyn AttendanceApi>) -> Self {
        Self { api }
    }

    /// Resolve a batch of incomplete attendances with one action.
    ///
    /// Never returns an error; every failure is captured in the result.
    pub async fn resolve_incomplete(
        &self,
        attendances: &[Attendance],
        action: IncompleteAction,
    ) -> BatchCommitResult {
        info!(
            "Committing {} incomplete attendance(s) as {:?}",
            attendances.len(),
            action
        );

        let commits = attendances.iter().map(|a| self.commit_incomplete(a, action));
        BatchCommitResult::from_results(join_all(commits).await)
    }

    async fn commit_incomplete(
        &self,
        attendance: &Attendance,
        action: IncompleteAction,
    ) -> RecordCommitResult {
        let outcome = match action {
            IncompleteAction::Complete => self
                .api
                .complete_attendance(&attendance.id)
                .await
                .map(|_| ()),
            IncompleteAction::Reschedule => self
                .api
                .update_attendance(
                    &attendance.id,
                    &UpdateAttendanceRequest {
                        status: Some(AttendanceStatus::Scheduled),
                        ..Default::default()
                    },
                )
                .await
                .map(|_| ()),
        };

        record_result(&attendance.id, &attendance.patient_name, outcome)
    }

    /// Submit a batch of reviewed absences.
    ///
    /// Justified absences are updated in place (justified, notes, missed);
    /// unjustified ones go through the dedicated mark-as-missed operation
    /// carrying the notes. Never returns an error.
    pub async fn submit_justifications(
        &self,
        justifications: &[AbsenceJustification],
    ) -> BatchCommitResult {
        info!("Committing {} reviewed absence(s)", justifications.len());

        let commits = justifications.iter().map(|j| self.commit_justification(j));
        BatchCommitResult::from_results(join_all(commits).await)
    }

    async fn commit_justification(&self, justification: &AbsenceJustification) -> RecordCommitResult {
        let outcome = if justification.justified {
            self.api
                .update_attendance(
                    &justification.attendance_id,
                    &UpdateAttendanceRequest {
                        status: Some(AttendanceStatus::Missed),
                        absence_justified: Some(true),
                        absence_notes: Some(justification.notes.clone()),
                        ..Default::default()
                    },
                )
                .await
                .map(|_| ())
        } else {
            self.api
                .mark_missed(
                    &justification.attendance_id,
                    &MarkMissedRequest {
                        notes: Some(justification.notes.clone()),
                    },
                )
                .await
                .map(|_| ())
        };

        record_result(
            &justification.attendance_id,
            &justification.patient_name,
            outcome,
        )
    }

    /// Apply a full set of end-of-day decisions.
    ///
    /// The complete, reschedule and absence batches are independent of each
    /// other; a batch with no input issues no remote call at all.
    pub async fn run(&self, decisions: EndOfDayDecisions) -> EndOfDayCommitReport {
        let completed = if decisions.complete.is_empty() {
            None
        } else {
            Some(
                self.resolve_incomplete(&decisions.complete, IncompleteAction::Complete)
                    .await,
            )
        };

        let rescheduled = if decisions.reschedule.is_empty() {
            None
        } else {
            Some(
                self.resolve_incomplete(&decisions.reschedule, IncompleteAction::Reschedule)
                    .await,
            )
        };

        let absences = if decisions.justifications.is_empty() {
            None
        } else {
            Some(self.submit_justifications(&decisions.justifications).await)
        };

        EndOfDayCommitReport {
            completed,
            rescheduled,
            absences,
        }
    }
}

fn record_result(
    attendance_id: &str,
    patient_name: &str,
    outcome: Result<()>,
) -> RecordCommitResult {
    match outcome {
        Ok(()) => RecordCommitResult {
            attendance_id: attendance_id.to_string(),
            patient_name: patient_name.to_string(),
            success: true,
            error: None,
        },
        Err(e) => {
            error!("Update of {} failed: {}", attendance_id, e);
            RecordCommitResult {
                attendance_id: attendance_id.to_string(),
                patient_name: patient_name.to_string(),
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}
