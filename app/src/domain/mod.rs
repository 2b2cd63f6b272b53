//! # Domain Module
//!
//! Business logic for the attendance tracker. Services here operate on the
//! remote attendance system through the API traits in `io`, independently of
//! any UI surface.
//!
//! ## Module Organization
//!
//! - **attendance_service**: registration (with the duplicate guard) and
//!   lifecycle transitions for attendance records
//! - **patient_service**: patient registration and maintenance
//! - **reconciliation**: end-of-day classification and the step flow
//! - **batch_commit**: per-record commit of the end-of-day decisions
//! - **end_of_day**: orchestration of the finalize-day workflow
//! - **agenda**: daily views derived from a store snapshot
//!
//! ## Key Rules
//!
//! - For a patient, treatment type and date, at most one non-cancelled
//!   attendance may exist; the duplicate guard enforces this before creation
//! - Status changes follow the attendance lifecycle and are checked before
//!   the remote call is issued
//! - Every mutation is followed by a full refetch of the affected day; the
//!   local snapshot is never patched in place
//! - Classification is a pure read over a snapshot; batch commits capture
//!   per-record failures instead of raising them

pub mod agenda;
pub mod attendance_service;
pub mod batch_commit;
pub mod commands;
pub mod end_of_day;
pub mod models;
pub mod patient_service;
pub mod reconciliation;

pub use agenda::*;
pub use attendance_service::*;
pub use batch_commit::*;
pub use end_of_day::{EndOfDayOutcome, EndOfDayService, EndOfDayStart};
pub use patient_service::*;
pub use reconciliation::*;
