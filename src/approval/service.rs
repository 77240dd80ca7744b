use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use tracing::{debug, error, info, instrument, warn};

use super::error::LeaveError;
use crate::model::leave_application::{
    ApprovalMode, Decision, LeaveApplication, LeaveStatus, NewLeave, TransitionRefused,
};
use crate::model::role::{Caller, Role};
use crate::pdf::pass::PassRenderer;
use crate::store::{LeaveFilter, LeaveStore, StoreError, StudentDirectory};

/// A lost compare-and-swap means another approver moved the request on.
const MAX_COMMIT_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// A faculty rejection also closes the rector stage as rejected.
    pub rejection_short_circuits: bool,
    /// Submissions with `from_date` after `to_date` are refused.
    pub enforce_date_order: bool,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            rejection_short_circuits: true,
            enforce_date_order: true,
        }
    }
}

/// Raw submission as received from a student; validated by `LeaveService::submit`.
#[derive(Debug, Clone, Default)]
pub struct LeaveSubmission {
    pub mode: Option<String>,
    pub reason: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Faculty,
    Rector,
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    students: Arc<dyn StudentDirectory>,
    passes: Arc<dyn PassRenderer>,
    policy: ApprovalPolicy,
}

fn require_role(caller: &Caller, role: Role, message: &'static str) -> Result<(), LeaveError> {
    if caller.role == role {
        Ok(())
    } else {
        Err(LeaveError::Forbidden(message))
    }
}

/// Timestamps at the one-second precision of the storage columns, so the
/// returned entity matches what a later read yields.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn storage_failure(leave_id: Option<u64>, err: StoreError) -> LeaveError {
    error!(error = %err, ?leave_id, "Leave store operation failed");
    LeaveError::from(err)
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        students: Arc<dyn StudentDirectory>,
        passes: Arc<dyn PassRenderer>,
        policy: ApprovalPolicy,
    ) -> Self {
        Self {
            store,
            students,
            passes,
            policy,
        }
    }

    #[instrument(name = "leave_submit", skip(self, submission), fields(caller_id = caller.id))]
    pub async fn submit(
        &self,
        caller: &Caller,
        submission: LeaveSubmission,
    ) -> Result<LeaveApplication, LeaveError> {
        require_role(caller, Role::Student, "Students only")?;

        let mode = submission
            .mode
            .as_deref()
            .map(str::trim)
            .and_then(|m| ApprovalMode::from_str(m).ok())
            .ok_or_else(|| {
                LeaveError::validation("Provide 'mode' as 'rector' or 'faculty+rector'.")
            })?;

        let reason = submission
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| LeaveError::validation("Provide a reason for the leave."))?;

        let (Some(from_date), Some(to_date)) = (submission.from_date, submission.to_date) else {
            return Err(LeaveError::validation("Provide fromDate and toDate."));
        };

        if self.policy.enforce_date_order && from_date > to_date {
            return Err(LeaveError::validation("fromDate cannot be after toDate."));
        }

        let student_snapshot = self
            .students
            .find_student(caller.id)
            .await
            .map_err(|e| storage_failure(None, e))?
            .ok_or(LeaveError::NotFound("Student not found"))?;

        let remarks = submission
            .remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let leave = self
            .store
            .create(NewLeave {
                student_id: caller.id,
                student_snapshot,
                mode,
                reason,
                from_date,
                to_date,
                remarks,
                submitted_at: stored_now(),
            })
            .await
            .map_err(|e| storage_failure(None, e))?;

        info!(leave_id = leave.id(), mode = %leave.mode(), "Leave request submitted");
        Ok(leave)
    }

    #[instrument(name = "leave_faculty_decide", skip(self, decision), fields(caller_id = caller.id, verdict = %decision.verdict))]
    pub async fn faculty_decide(
        &self,
        caller: &Caller,
        leave_id: u64,
        decision: Decision,
    ) -> Result<LeaveApplication, LeaveError> {
        require_role(caller, Role::Faculty, "Faculty only")?;
        self.commit_stage(Stage::Faculty, caller, leave_id, &decision)
            .await
    }

    #[instrument(name = "leave_rector_decide", skip(self, decision), fields(caller_id = caller.id, verdict = %decision.verdict))]
    pub async fn rector_decide(
        &self,
        caller: &Caller,
        leave_id: u64,
        decision: Decision,
    ) -> Result<LeaveApplication, LeaveError> {
        require_role(caller, Role::Rector, "Only rector can perform this action")?;
        self.commit_stage(Stage::Rector, caller, leave_id, &decision)
            .await
    }

    /// Records the decision for whichever stage the caller's role owns.
    pub async fn decide(
        &self,
        caller: &Caller,
        leave_id: u64,
        decision: Decision,
    ) -> Result<LeaveApplication, LeaveError> {
        match caller.role {
            Role::Faculty => self.faculty_decide(caller, leave_id, decision).await,
            Role::Rector => self.rector_decide(caller, leave_id, decision).await,
            Role::Student => Err(LeaveError::Forbidden(
                "Only faculty or rector can change approval status.",
            )),
        }
    }

    async fn commit_stage(
        &self,
        stage: Stage,
        caller: &Caller,
        leave_id: u64,
        decision: &Decision,
    ) -> Result<LeaveApplication, LeaveError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let current = self.load(leave_id).await?;
            let expected = current.decision_state();

            let mut updated = current;
            let now = stored_now();
            let transition = match stage {
                Stage::Faculty => updated.record_faculty_decision(
                    caller.id,
                    decision,
                    now,
                    self.policy.rejection_short_circuits,
                ),
                Stage::Rector => updated.record_rector_decision(caller.id, decision, now),
            };
            if let Err(refused) = transition {
                info!(leave_id, %refused, "Decision refused");
                return Err(refused.into());
            }

            let committed = self
                .store
                .commit_decision(expected, &updated)
                .await
                .map_err(|e| storage_failure(Some(leave_id), e))?;

            if committed {
                info!(leave_id, ?stage, status = %updated.status(), "Decision recorded");
                return Ok(updated);
            }
            debug!(leave_id, attempt, "Decision lost a concurrent write, re-reading");
        }

        warn!(leave_id, "Decision abandoned after repeated concurrent writes");
        Err(LeaveError::Conflict(
            "Leave request was changed concurrently, try again".to_string(),
        ))
    }

    async fn load(&self, leave_id: u64) -> Result<LeaveApplication, LeaveError> {
        self.store
            .find_by_id(leave_id)
            .await
            .map_err(|e| storage_failure(Some(leave_id), e))?
            .ok_or(LeaveError::NotFound("Leave not found"))
    }

    /// Renders and attaches the pass of an approved request. Rendering happens
    /// outside any store write; the path is attached only if still approved.
    pub async fn issue_pass(&self, leave_id: u64) -> Result<LeaveApplication, LeaveError> {
        let leave = self.load(leave_id).await?;
        if leave.status() != LeaveStatus::Approved {
            return Err(TransitionRefused::NotApproved.into());
        }

        let path = self.passes.render(&leave).await.map_err(|e| {
            error!(leave_id, error = %format!("{e:#}"), "Leave pass generation failed");
            LeaveError::DependencyFailure(e.to_string())
        })?;

        self.store
            .attach_pass(leave_id, &path)
            .await
            .map_err(|e| storage_failure(Some(leave_id), e))?
            .ok_or_else(|| TransitionRefused::NotApproved.into())
    }

    /// Fire-and-forget variant used after a rector approval: failures are logged
    /// and the approval stands without a pass.
    pub async fn issue_pass_best_effort(&self, leave_id: u64) -> Option<String> {
        match self.issue_pass(leave_id).await {
            Ok(leave) => leave.pdf_path().map(str::to_owned),
            Err(e) => {
                warn!(leave_id, error = %e, "Leave approved without a pass");
                None
            }
        }
    }

    pub async fn regenerate_pass(
        &self,
        caller: &Caller,
        leave_id: u64,
    ) -> Result<LeaveApplication, LeaveError> {
        require_role(caller, Role::Rector, "Only rector can perform this action")?;
        self.issue_pass(leave_id).await
    }

    pub async fn get(&self, caller: &Caller, leave_id: u64) -> Result<LeaveApplication, LeaveError> {
        let leave = self.load(leave_id).await?;
        if caller.role == Role::Student && leave.student_id() != caller.id {
            return Err(LeaveError::Forbidden("Students may only view their own leaves"));
        }
        Ok(leave)
    }

    async fn list(&self, filter: LeaveFilter) -> Result<Vec<LeaveApplication>, LeaveError> {
        self.store
            .find_by_filter(filter)
            .await
            .map_err(|e| storage_failure(None, e))
    }

    pub async fn list_for_student(
        &self,
        caller: &Caller,
    ) -> Result<Vec<LeaveApplication>, LeaveError> {
        require_role(caller, Role::Student, "Students only")?;
        self.list(LeaveFilter::Student(caller.id)).await
    }

    pub async fn pending_for_faculty(
        &self,
        caller: &Caller,
    ) -> Result<Vec<LeaveApplication>, LeaveError> {
        require_role(caller, Role::Faculty, "Faculty only")?;
        self.list(LeaveFilter::AwaitingFaculty).await
    }

    pub async fn pending_for_rector(
        &self,
        caller: &Caller,
    ) -> Result<Vec<LeaveApplication>, LeaveError> {
        require_role(caller, Role::Rector, "Only rector can perform this action")?;
        self.list(LeaveFilter::AwaitingRector).await
    }

    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<LeaveApplication>, LeaveError> {
        require_role(caller, Role::Rector, "Only rector can perform this action")?;
        self.list(LeaveFilter::All).await
    }
}
