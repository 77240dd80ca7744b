//! Persistence seams for leave applications and the student directory.
//!
//! `LeaveStore::commit_decision` is the only way decision fields reach storage;
//! it is a compare-and-swap on the decision pair that was read, so two approvers
//! racing on the same request cannot both win.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::leave_application::{
    ApprovalMode, ApprovalStatus, DecisionState, LeaveApplication, NewLeave, StudentSnapshot,
};

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "{}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "corrupt leave row: {}", _0)]
    Corrupt(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::Corrupt(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Database(value)
    }
}

/// Selection predicates for list queries. Results are always newest first.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveFilter {
    All,
    Student(u64),
    /// Two-stage requests still waiting on the faculty.
    AwaitingFaculty,
    /// Rector-only requests with the rector open, plus two-stage requests the
    /// faculty already approved.
    AwaitingRector,
}

impl LeaveFilter {
    pub fn matches(&self, leave: &LeaveApplication) -> bool {
        match self {
            LeaveFilter::All => true,
            LeaveFilter::Student(id) => leave.student_id() == *id,
            LeaveFilter::AwaitingFaculty => {
                leave.mode() == ApprovalMode::FacultyRector
                    && leave.faculty_status() == ApprovalStatus::Pending
            }
            LeaveFilter::AwaitingRector => {
                leave.rector_status() == ApprovalStatus::Pending
                    && match leave.mode() {
                        ApprovalMode::Rector => true,
                        ApprovalMode::FacultyRector => {
                            leave.faculty_status() == ApprovalStatus::Approved
                        }
                    }
            }
        }
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn create(&self, draft: NewLeave) -> Result<LeaveApplication, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveApplication>, StoreError>;

    async fn find_by_filter(&self, filter: LeaveFilter)
    -> Result<Vec<LeaveApplication>, StoreError>;

    /// Writes the decision fields and derived status of `updated` only if the stored
    /// decision pair still equals `expected`. Returns whether the write happened.
    async fn commit_decision(
        &self,
        expected: DecisionState,
        updated: &LeaveApplication,
    ) -> Result<bool, StoreError>;

    /// Stores a pass path on an approved application. `None` when the application
    /// is missing or not approved.
    async fn attach_pass(
        &self,
        id: u64,
        path: &str,
    ) -> Result<Option<LeaveApplication>, StoreError>;
}

#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn find_student(&self, id: u64) -> Result<Option<StudentSnapshot>, StoreError>;
}
