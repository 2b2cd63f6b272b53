//! # End-of-Day Service
//!
//! Orchestrates the finalize-day workflow: fetch the day, classify it,
//! hand the step flow to the caller, and apply the collected decisions
//! through the batch commit coordinator. After the commit the day is
//! refetched from the remote source of truth and the completion totals are
//! derived from the fresh snapshot.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use shared::EndOfDayCompletionData;
use tracing::info;

use crate::domain::attendance_service::AttendanceService;
use crate::domain::batch_commit::{BatchCommitCoordinator, EndOfDayCommitReport};
use crate::domain::reconciliation::{classify, ReconciliationFlow, ReconciliationStart};
use crate::io::api::AttendanceApi;

/// Outcome of opening the end-of-day workflow for a date
pub enum EndOfDayStart {
    /// No incomplete or absent records; the day is already reconciled
    AlreadyComplete(EndOfDayCompletionData),
    /// The step flow the caller walks through before submitting
    InProgress(ReconciliationFlow),
}

/// Result of submitting the collected decisions
#[derive(Debug, Clone)]
pub struct EndOfDayOutcome {
    pub report: EndOfDayCommitReport,
    /// Totals derived from the refetched day
    pub completion: EndOfDayCompletionData,
}

/// Drives the end-of-day reconciliation workflow
#[derive(Clone)]
pub struct EndOfDayService {
    attendance_service: AttendanceService,
    coordinator: BatchCommitCoordinator,
}

impl EndOfDayService {
    pub fn new(api: Arc<dyn AttendanceApi>) -> Self {
        Self {
            attendance_service: AttendanceService::new(api.clone()),
            coordinator: BatchCommitCoordinator::new(api),
        }
    }

    /// Fetch and classify the day, opening the step flow when needed
    pub async fn start(&self, date: NaiveDate) -> Result<EndOfDayStart> {
        info!("Finalizing day {}", date);

        let store = self.attendance_service.load_day(date).await?;
        match ReconciliationFlow::begin(classify(&store)) {
            ReconciliationStart::AlreadyComplete => {
                info!("Day {} has nothing to reconcile", date);
                Ok(EndOfDayStart::AlreadyComplete(store.completion_data()))
            }
            ReconciliationStart::InProgress(flow) => Ok(EndOfDayStart::InProgress(flow)),
        }
    }

    /// Apply the flow's decisions and refetch the day.
    ///
    /// Commit failures surface inside the report, not as an `Err`; only the
    /// final refetch can fail here.
    pub async fn submit(&self, date: NaiveDate, flow: ReconciliationFlow) -> Result<EndOfDayOutcome> {
        let report = self.coordinator.run(flow.into_decisions()).await;

        let store = self.attendance_service.load_day(date).await?;
        let completion = store.completion_data();

        info!(
            "Day {} finalized: {} patient(s), {} completed, {} missed",
            date, completion.total_patients, completion.completed, completion.missed
        );

        Ok(EndOfDayOutcome { report, completion })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reconciliation::{IncompleteResolution, ReconciliationStep};
    use crate::io::mock::{record, test_date, MockApi};
    use shared::AttendanceStatus::*;
    use shared::TreatmentType::*;

    #[tokio::test]
    async fn test_clean_day_short_circuits_with_totals() {
        let api = Arc::new(MockApi::new());
        api.seed(vec![record("a1", "Maria", Rod, Completed, test_date())]);
        let service = EndOfDayService::new(api.clone());

        match service.start(test_date()).await.unwrap() {
            EndOfDayStart::AlreadyComplete(completion) => {
                assert_eq!(completion.total_patients, 1);
                assert_eq!(completion.completed, 1);
                assert_eq!(completion.missed, 0);
            }
            EndOfDayStart::InProgress(_) => panic!("clean day must not open the flow"),
        }
    }

    // Day with two checked-in attendances (A, B) and one scheduled-but-absent
    // one (C): A is completed, B re-queued, C justified with a note.
    #[tokio::test]
    async fn test_full_reconciliation_flow() {
        let api = Arc::new(MockApi::new());
        api.seed(vec![
            record("a", "Maria", Spiritual, CheckedIn, test_date()),
            record("b", "Joao", LightBath, CheckedIn, test_date()),
            record("c", "Ana", Rod, Scheduled, test_date()),
        ]);
        let service = EndOfDayService::new(api.clone());

        let mut flow = match service.start(test_date()).await.unwrap() {
            EndOfDayStart::InProgress(flow) => flow,
            EndOfDayStart::AlreadyComplete(_) => panic!("expected the flow to open"),
        };

        assert_eq!(flow.step(), ReconciliationStep::Incomplete);
        assert!(flow.resolve("a", IncompleteResolution::Complete));
        assert!(flow.resolve("b", IncompleteResolution::Reschedule));
        assert!(flow.advance());
        assert!(flow.set_justification("c", true, "called in sick"));
        assert!(flow.advance());
        assert_eq!(flow.step(), ReconciliationStep::Confirm);

        let outcome = service.submit(test_date(), flow).await.unwrap();

        assert!(outcome.report.success());
        let completed_batch = outcome.report.completed.expect("complete batch ran");
        assert_eq!(completed_batch.results.len(), 1);
        assert_eq!(completed_batch.results[0].attendance_id, "a");
        let rescheduled_batch = outcome.report.rescheduled.expect("reschedule batch ran");
        assert_eq!(rescheduled_batch.results[0].attendance_id, "b");
        let absence_batch = outcome.report.absences.expect("absence batch ran");
        assert_eq!(absence_batch.results[0].attendance_id, "c");

        // Remote state reflects the decisions
        assert_eq!(api.find("a").unwrap().status, Completed);
        assert_eq!(api.find("b").unwrap().status, Scheduled);
        let c = api.find("c").unwrap();
        assert_eq!(c.status, Missed);
        assert_eq!(c.absence_justified, Some(true));
        assert_eq!(c.absence_notes.as_deref(), Some("called in sick"));

        // Completion totals from the refetched day: the justified absence
        // is logically missed but not counted
        assert_eq!(outcome.completion.total_patients, 3);
        assert_eq!(outcome.completion.completed, 1);
        assert_eq!(outcome.completion.missed, 0);
    }

    #[tokio::test]
    async fn test_commit_failures_surface_in_the_report() {
        let api = Arc::new(MockApi::new());
        api.seed(vec![
            record("a", "Maria", Spiritual, CheckedIn, test_date()),
            record("b", "Joao", Spiritual, CheckedIn, test_date()),
        ]);
        api.fail_for("b");
        let service = EndOfDayService::new(api.clone());

        let mut flow = match service.start(test_date()).await.unwrap() {
            EndOfDayStart::InProgress(flow) => flow,
            EndOfDayStart::AlreadyComplete(_) => panic!("expected the flow to open"),
        };
        flow.resolve("a", IncompleteResolution::Complete);
        flow.resolve("b", IncompleteResolution::Complete);
        flow.advance();
        flow.advance();

        let outcome = service.submit(test_date(), flow).await.unwrap();

        assert!(!outcome.report.success());
        let batch = outcome.report.completed.unwrap();
        assert_eq!(batch.failed(), 1);

        // Partial application: the record that succeeded stays completed
        assert_eq!(api.find("a").unwrap().status, Completed);
        assert_eq!(api.find("b").unwrap().status, CheckedIn);
    }
}
