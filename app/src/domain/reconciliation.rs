//! # Reconciliation Engine
//!
//! End-of-day classification of a day's attendance records plus the step
//! flow that collects the user's decisions about them.
//!
//! Classification is a pure read over an already-fetched store snapshot:
//! records that reached check-in or a session but were never completed are
//! "incomplete"; scheduled records the patient never checked in for are
//! "absences". The flow walks `Incomplete -> Absences -> Confirm`, and the
//! accumulated decisions feed the batch commit coordinator.

use std::collections::HashMap;

use shared::{AbsenceJustification, TreatmentType};

use crate::domain::commands::end_of_day::EndOfDayDecisions;
use crate::domain::models::Attendance;
use crate::store::{AttendanceStore, StatusBucket};

/// The day's records split into the two sets the flow acts on
#[derive(Debug, Clone, PartialEq)]
pub struct DayClassification {
    /// Checked-in or in-progress, not completed by end of day
    pub incomplete: Vec<Attendance>,
    /// Scheduled with no check-in for the day
    pub absences: Vec<Attendance>,
}

impl DayClassification {
    /// Nothing left to resolve; the flow short-circuits with no steps
    pub fn is_clean(&self) -> bool {
        self.incomplete.is_empty() && self.absences.is_empty()
    }
}

/// Classify a store snapshot into incomplete and absent sets.
///
/// Scans every treatment type in declaration order; within each list the
/// store's insertion order is kept, no further sorting is imposed. Pure:
/// the same snapshot always yields the same classification.
pub fn classify(store: &AttendanceStore) -> DayClassification {
    let mut incomplete = Vec::new();
    for treatment_type in TreatmentType::ALL {
        for bucket in [StatusBucket::CheckedIn, StatusBucket::Ongoing] {
            incomplete.extend(store.bucket(treatment_type, bucket).iter().cloned());
        }
    }

    let mut absences = Vec::new();
    for treatment_type in TreatmentType::ALL {
        absences.extend(
            store
                .bucket(treatment_type, StatusBucket::Scheduled)
                .iter()
                .cloned(),
        );
    }

    DayClassification {
        incomplete,
        absences,
    }
}

/// Step of the end-of-day flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationStep {
    Incomplete,
    Absences,
    Confirm,
}

/// The user's decision about one incomplete attendance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteResolution {
    /// Mark the session completed now
    Complete,
    /// Re-queue the record as scheduled for a future pass
    Reschedule,
}

/// Outcome of starting the flow for a classified day
pub enum ReconciliationStart {
    /// Neither incomplete nor absent records exist; nothing to show
    AlreadyComplete,
    InProgress(ReconciliationFlow),
}

/// Counts shown on the confirmation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationSummary {
    pub to_complete: usize,
    pub to_reschedule: usize,
    pub justified: usize,
    pub unjustified: usize,
}

/// The three-step end-of-day dialog state.
///
/// Owns its classification snapshot and the decisions collected so far;
/// there is no ambient store behind it.
pub struct ReconciliationFlow {
    step: ReconciliationStep,
    classification: DayClassification,
    resolutions: HashMap<String, IncompleteResolution>,
    justifications: Vec<AbsenceJustification>,
}

impl ReconciliationFlow {
    /// Start the flow for a classified day.
    ///
    /// A clean day short-circuits; otherwise the flow opens on the
    /// Incomplete step, or directly on Absences when every record was
    /// resolved during the day.
    pub fn begin(classification: DayClassification) -> ReconciliationStart {
        if classification.is_clean() {
            return ReconciliationStart::AlreadyComplete;
        }

        let step = if classification.incomplete.is_empty() {
            ReconciliationStep::Absences
        } else {
            ReconciliationStep::Incomplete
        };

        // Every absence starts as an unjustified decision with empty notes;
        // the user edits decisions rather than creating them.
        let justifications = classification
            .absences
            .iter()
            .map(|a| AbsenceJustification {
                attendance_id: a.id.clone(),
                patient_name: a.patient_name.clone(),
                justified: false,
                notes: String::new(),
            })
            .collect();

        ReconciliationStart::InProgress(Self {
            step,
            classification,
            resolutions: HashMap::new(),
            justifications,
        })
    }

    pub fn step(&self) -> ReconciliationStep {
        self.step
    }

    pub fn incomplete(&self) -> &[Attendance] {
        &self.classification.incomplete
    }

    pub fn absences(&self) -> &[Attendance] {
        &self.classification.absences
    }

    /// The decision recorded for an incomplete attendance, if any
    pub fn resolution(&self, attendance_id: &str) -> Option<IncompleteResolution> {
        self.resolutions.get(attendance_id).copied()
    }

    /// Record a decision for one incomplete attendance.
    /// Returns false when the ID is not in the incomplete set.
    pub fn resolve(&mut self, attendance_id: &str, resolution: IncompleteResolution) -> bool {
        if !self
            .classification
            .incomplete
            .iter()
            .any(|a| a.id == attendance_id)
        {
            return false;
        }
        self.resolutions
            .insert(attendance_id.to_string(), resolution);
        true
    }

    /// Incomplete attendances still waiting on a decision
    pub fn unresolved_incomplete(&self) -> usize {
        self.classification
            .incomplete
            .iter()
            .filter(|a| !self.resolutions.contains_key(&a.id))
            .count()
    }

    pub fn justifications(&self) -> &[AbsenceJustification] {
        &self.justifications
    }

    /// Record the review of one absence.
    /// Returns false when the ID is not in the absence set.
    pub fn set_justification(
        &mut self,
        attendance_id: &str,
        justified: bool,
        notes: impl Into<String>,
    ) -> bool {
        match self
            .justifications
            .iter_mut()
            .find(|j| j.attendance_id == attendance_id)
        {
            Some(justification) => {
                justification.justified = justified;
                justification.notes = notes.into();
                true
            }
            None => false,
        }
    }

    /// Move to the next step.
    ///
    /// Rejected (state unchanged) from Incomplete while any record lacks a
    /// decision; the UI disables the control but the flow guards anyway.
    pub fn advance(&mut self) -> bool {
        match self.step {
            ReconciliationStep::Incomplete => {
                if self.unresolved_incomplete() > 0 {
                    return false;
                }
                self.step = ReconciliationStep::Absences;
                true
            }
            ReconciliationStep::Absences => {
                self.step = ReconciliationStep::Confirm;
                true
            }
            ReconciliationStep::Confirm => false,
        }
    }

    /// Move to the previous step; no-op before the first one
    pub fn back(&mut self) -> bool {
        match self.step {
            ReconciliationStep::Incomplete => false,
            ReconciliationStep::Absences => {
                if self.classification.incomplete.is_empty() {
                    return false;
                }
                self.step = ReconciliationStep::Incomplete;
                true
            }
            ReconciliationStep::Confirm => {
                self.step = ReconciliationStep::Absences;
                true
            }
        }
    }

    /// Counts for the confirmation step
    pub fn summary(&self) -> ReconciliationSummary {
        let to_complete = self
            .resolutions
            .values()
            .filter(|r| **r == IncompleteResolution::Complete)
            .count();
        let to_reschedule = self
            .resolutions
            .values()
            .filter(|r| **r == IncompleteResolution::Reschedule)
            .count();
        let justified = self.justifications.iter().filter(|j| j.justified).count();
        let unjustified = self.justifications.len() - justified;

        ReconciliationSummary {
            to_complete,
            to_reschedule,
            justified,
            unjustified,
        }
    }

    /// Close the flow and emit the decisions for the batch commit.
    ///
    /// Incomplete records without a decision are not included; the advance
    /// guard means there are none once the Confirm step was reached.
    pub fn into_decisions(self) -> EndOfDayDecisions {
        let mut complete = Vec::new();
        let mut reschedule = Vec::new();
        for attendance in self.classification.incomplete {
            match self.resolutions.get(&attendance.id) {
                Some(IncompleteResolution::Complete) => complete.push(attendance),
                Some(IncompleteResolution::Reschedule) => reschedule.push(attendance),
                None => {}
            }
        }

        EndOfDayDecisions {
            complete,
            reschedule,
            justifications: self.justifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mock::{attendance, test_date};
    use shared::AttendanceStatus::*;
    use shared::TreatmentType::*;

    fn busy_day_store() -> AttendanceStore {
        AttendanceStore::from_records(
            test_date(),
            vec![
                attendance("a1", "Maria", Spiritual, CheckedIn, test_date()),
                attendance("a2", "Joao", LightBath, InProgress, test_date()),
                attendance("a3", "Ana", LightBath, Scheduled, test_date()),
                attendance("a4", "Pedro", Rod, Completed, test_date()),
            ],
        )
    }

    #[test]
    fn test_classification_sets() {
        let classification = classify(&busy_day_store());

        let incomplete: Vec<&str> = classification
            .incomplete
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(incomplete, vec!["a1", "a2"]);

        let absences: Vec<&str> = classification
            .absences
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(absences, vec!["a3"]);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let store = busy_day_store();
        assert_eq!(classify(&store), classify(&store));
    }

    #[test]
    fn test_clean_day_short_circuits() {
        let store = AttendanceStore::from_records(
            test_date(),
            vec![attendance("a1", "Maria", Rod, Completed, test_date())],
        );

        match ReconciliationFlow::begin(classify(&store)) {
            ReconciliationStart::AlreadyComplete => {}
            ReconciliationStart::InProgress(_) => panic!("clean day must not open the flow"),
        }
    }

    #[test]
    fn test_flow_opens_on_absences_when_nothing_incomplete() {
        let store = AttendanceStore::from_records(
            test_date(),
            vec![attendance("a1", "Maria", Rod, Scheduled, test_date())],
        );

        let mut flow = match ReconciliationFlow::begin(classify(&store)) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => panic!("absences require the flow"),
        };
        assert_eq!(flow.step(), ReconciliationStep::Absences);

        // No incomplete step exists for this day, so back is a no-op
        assert!(!flow.back());
        assert_eq!(flow.step(), ReconciliationStep::Absences);
    }

    #[test]
    fn test_advance_rejected_while_unresolved() {
        let mut flow = match ReconciliationFlow::begin(classify(&busy_day_store())) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => panic!("busy day requires the flow"),
        };

        assert_eq!(flow.step(), ReconciliationStep::Incomplete);
        assert_eq!(flow.unresolved_incomplete(), 2);

        // Guard: cannot leave the step with pending decisions
        assert!(!flow.advance());
        assert_eq!(flow.step(), ReconciliationStep::Incomplete);

        assert!(flow.resolve("a1", IncompleteResolution::Complete));
        assert!(!flow.advance());

        assert!(flow.resolve("a2", IncompleteResolution::Reschedule));
        assert_eq!(flow.unresolved_incomplete(), 0);
        assert!(flow.advance());
        assert_eq!(flow.step(), ReconciliationStep::Absences);
    }

    #[test]
    fn test_resolve_rejects_unknown_id() {
        let mut flow = match ReconciliationFlow::begin(classify(&busy_day_store())) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => unreachable!(),
        };

        assert!(!flow.resolve("a99", IncompleteResolution::Complete));
        assert!(!flow.set_justification("a99", true, "notes"));
        assert_eq!(flow.unresolved_incomplete(), 2);
    }

    #[test]
    fn test_back_walks_the_steps() {
        let mut flow = match ReconciliationFlow::begin(classify(&busy_day_store())) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => unreachable!(),
        };

        flow.resolve("a1", IncompleteResolution::Complete);
        flow.resolve("a2", IncompleteResolution::Complete);
        assert!(flow.advance());
        assert!(flow.advance());
        assert_eq!(flow.step(), ReconciliationStep::Confirm);

        // Submit is separate from advance; Confirm is the last step
        assert!(!flow.advance());

        assert!(flow.back());
        assert_eq!(flow.step(), ReconciliationStep::Absences);
        assert!(flow.back());
        assert_eq!(flow.step(), ReconciliationStep::Incomplete);
        assert!(!flow.back());
    }

    #[test]
    fn test_summary_and_decisions() {
        // Day with 2 checked-in attendances and 1 scheduled-but-absent one
        let mut flow = match ReconciliationFlow::begin(classify(&busy_day_store())) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => unreachable!(),
        };

        flow.resolve("a1", IncompleteResolution::Complete);
        flow.resolve("a2", IncompleteResolution::Reschedule);
        assert!(flow.advance());
        assert!(flow.set_justification("a3", true, "called in sick"));
        assert!(flow.advance());

        let summary = flow.summary();
        assert_eq!(summary.to_complete, 1);
        assert_eq!(summary.to_reschedule, 1);
        assert_eq!(summary.justified, 1);
        assert_eq!(summary.unjustified, 0);

        let decisions = flow.into_decisions();
        assert_eq!(decisions.complete.len(), 1);
        assert_eq!(decisions.complete[0].id, "a1");
        assert_eq!(decisions.reschedule.len(), 1);
        assert_eq!(decisions.reschedule[0].id, "a2");
        assert_eq!(decisions.justifications.len(), 1);
        assert!(decisions.justifications[0].justified);
        assert_eq!(decisions.justifications[0].notes, "called in sick");
    }

    #[test]
    fn test_absences_default_to_unjustified() {
        let store = AttendanceStore::from_records(
            test_date(),
            vec![attendance("a1", "Maria", Rod, Scheduled, test_date())],
        );

        let mut flow = match ReconciliationFlow::begin(classify(&store)) {
            ReconciliationStart::InProgress(flow) => flow,
            ReconciliationStart::AlreadyComplete => unreachable!(),
        };

        assert_eq!(flow.justifications().len(), 1);
        assert!(!flow.justifications()[0].justified);

        // Advancing from Absences never blocks; decisions are pre-seeded
        assert!(flow.advance());
        assert_eq!(flow.step(), ReconciliationStep::Confirm);
    }
}
