use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::Serialize;
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

use crate::approval::status::recompute_overall_status;

/// Approval topology, fixed when the student submits.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, ToSchema, StrumDisplay, EnumString, AsRefStr,
)]
pub enum ApprovalMode {
    #[serde(rename = "rector")]
    #[strum(serialize = "rector")]
    Rector,
    #[serde(rename = "faculty+rector")]
    #[strum(serialize = "faculty+rector")]
    FacultyRector,
}

/// Decision state of a single approver.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, ToSchema, StrumDisplay, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Overall status, only ever produced by the status engine.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, ToSchema, StrumDisplay, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeaveStatus {
    Pending,
    SemiApproved,
    Approved,
    Rejected,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, StrumDisplay, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    fn outcome(self) -> ApprovalStatus {
        match self {
            Verdict::Approve => ApprovalStatus::Approved,
            Verdict::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// What an approver decided, with the optional reason attached to rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Option<String>,
}

impl Decision {
    pub fn approve() -> Self {
        Self {
            verdict: Verdict::Approve,
            reason: None,
        }
    }

    pub fn reject(reason: Option<String>) -> Self {
        Self {
            verdict: Verdict::Reject,
            reason,
        }
    }

    fn rejection_reason(&self) -> Option<String> {
        match self.verdict {
            Verdict::Approve => None,
            Verdict::Reject => self
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    #[schema(example = "Asha Patil")]
    pub name: String,
    #[schema(example = "CS-2021-044")]
    pub roll_number: Option<String>,
    #[schema(example = "Computer Science")]
    pub branch: Option<String>,
    #[schema(example = "3")]
    pub year: Option<String>,
    #[schema(example = "H-2")]
    pub hostel: Option<String>,
}

/// Submission data for a new application; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub student_id: u64,
    pub student_snapshot: StudentSnapshot,
    pub mode: ApprovalMode,
    pub reason: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub remarks: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One approver's persisted decision fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub status: ApprovalStatus,
    pub decided_by: Option<u64>,
    pub decided_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl StageRecord {
    pub fn pending() -> Self {
        Self {
            status: ApprovalStatus::Pending,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
        }
    }
}

/// The decision pair a conditional write is checked against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecisionState {
    pub faculty: ApprovalStatus,
    pub rector: ApprovalStatus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum TransitionRefused {
    #[display(fmt = "Faculty does not take part in rector-only leave requests")]
    FacultyNotInMode,
    #[display(fmt = "Faculty decision already recorded")]
    FacultyAlreadyDecided,
    #[display(fmt = "Faculty approval is required before the rector decides")]
    AwaitingFaculty,
    #[display(fmt = "Rector decision already recorded")]
    RectorAlreadyDecided,
    #[display(fmt = "Leave request is not approved")]
    NotApproved,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveApplication {
    #[schema(example = 1)]
    id: u64,
    #[schema(example = 1000)]
    student_id: u64,
    student_snapshot: StudentSnapshot,
    mode: ApprovalMode,
    #[schema(example = "medical")]
    reason: String,
    #[schema(example = "2024-01-10", format = "date", value_type = String)]
    from_date: NaiveDate,
    #[schema(example = "2024-01-12", format = "date", value_type = String)]
    to_date: NaiveDate,
    remarks: Option<String>,

    faculty_status: ApprovalStatus,
    faculty_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    faculty_decision_at: Option<DateTime<Utc>>,
    faculty_rejection_reason: Option<String>,

    rector_status: ApprovalStatus,
    rector_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    rector_decision_at: Option<DateTime<Utc>>,
    rector_rejection_reason: Option<String>,

    status: LeaveStatus,
    #[schema(example = "/uploads/leave-1.pdf")]
    pdf_path: Option<String>,

    #[schema(example = "2024-01-09T08:00:00Z", format = "date-time", value_type = String)]
    created_at: DateTime<Utc>,
    #[schema(example = "2024-01-09T08:00:00Z", format = "date-time", value_type = String)]
    updated_at: DateTime<Utc>,
}

impl LeaveApplication {
    /// A freshly submitted application: every stage pending.
    pub fn submitted(id: u64, draft: NewLeave) -> Self {
        Self::restore(
            id,
            draft,
            StageRecord::pending(),
            StageRecord::pending(),
            None,
            None,
        )
    }

    /// Rebuilds an application from stored fields. The overall status is derived
    /// again here, a stored status column is never trusted.
    pub fn restore(
        id: u64,
        draft: NewLeave,
        faculty: StageRecord,
        rector: StageRecord,
        pdf_path: Option<String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut leave = Self {
            id,
            student_id: draft.student_id,
            student_snapshot: draft.student_snapshot,
            mode: draft.mode,
            reason: draft.reason,
            from_date: draft.from_date,
            to_date: draft.to_date,
            remarks: draft.remarks,
            faculty_status: faculty.status,
            faculty_id: faculty.decided_by,
            faculty_decision_at: faculty.decided_at,
            faculty_rejection_reason: faculty.rejection_reason,
            rector_status: rector.status,
            rector_id: rector.decided_by,
            rector_decision_at: rector.decided_at,
            rector_rejection_reason: rector.rejection_reason,
            status: LeaveStatus::Pending,
            pdf_path: None,
            created_at: draft.submitted_at,
            updated_at: updated_at.unwrap_or(draft.submitted_at),
        };
        leave.refresh_status();
        if leave.status == LeaveStatus::Approved {
            leave.pdf_path = pdf_path;
        }
        leave
    }

    fn refresh_status(&mut self) {
        self.status =
            recompute_overall_status(self.mode, self.faculty_status, self.rector_status);
    }

    pub fn record_faculty_decision(
        &mut self,
        actor: u64,
        decision: &Decision,
        at: DateTime<Utc>,
        rejection_short_circuits: bool,
    ) -> Result<(), TransitionRefused> {
        if self.mode != ApprovalMode::FacultyRector {
            return Err(TransitionRefused::FacultyNotInMode);
        }
        if self.faculty_status != ApprovalStatus::Pending {
            return Err(TransitionRefused::FacultyAlreadyDecided);
        }

        self.faculty_status = decision.verdict.outcome();
        self.faculty_id = Some(actor);
        self.faculty_decision_at = Some(at);
        self.faculty_rejection_reason = decision.rejection_reason();

        // rector stage closes with the request; no rector acted, so no rector id/time
        if decision.verdict == Verdict::Reject && rejection_short_circuits {
            self.rector_status = ApprovalStatus::Rejected;
        }

        self.updated_at = at;
        self.refresh_status();
        Ok(())
    }

    pub fn record_rector_decision(
        &mut self,
        actor: u64,
        decision: &Decision,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionRefused> {
        if self.rector_status != ApprovalStatus::Pending {
            return Err(TransitionRefused::RectorAlreadyDecided);
        }
        if self.mode == ApprovalMode::FacultyRector
            && self.faculty_status != ApprovalStatus::Approved
        {
            return Err(TransitionRefused::AwaitingFaculty);
        }

        self.rector_status = decision.verdict.outcome();
        self.rector_id = Some(actor);
        self.rector_decision_at = Some(at);
        self.rector_rejection_reason = decision.rejection_reason();

        self.updated_at = at;
        self.refresh_status();
        Ok(())
    }

    pub fn attach_pass(&mut self, path: String, at: DateTime<Utc>) -> Result<(), TransitionRefused> {
        if self.status != LeaveStatus::Approved {
            return Err(TransitionRefused::NotApproved);
        }
        self.pdf_path = Some(path);
        self.updated_at = at;
        Ok(())
    }

    pub fn decision_state(&self) -> DecisionState {
        DecisionState {
            faculty: self.faculty_status,
            rector: self.rector_status,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn student_id(&self) -> u64 {
        self.student_id
    }

    pub fn student_snapshot(&self) -> &StudentSnapshot {
        &self.student_snapshot
    }

    pub fn mode(&self) -> ApprovalMode {
        self.mode
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to_date
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn faculty_status(&self) -> ApprovalStatus {
        self.faculty_status
    }

    pub fn faculty_stage(&self) -> StageRecord {
        StageRecord {
            status: self.faculty_status,
            decided_by: self.faculty_id,
            decided_at: self.faculty_decision_at,
            rejection_reason: self.faculty_rejection_reason.clone(),
        }
    }

    pub fn rector_status(&self) -> ApprovalStatus {
        self.rector_status
    }

    pub fn rector_stage(&self) -> StageRecord {
        StageRecord {
            status: self.rector_status,
            decided_by: self.rector_id,
            decided_at: self.rector_decision_at,
            rejection_reason: self.rector_rejection_reason.clone(),
        }
    }

    pub fn status(&self) -> LeaveStatus {
        self.status
    }

    pub fn pdf_path(&self) -> Option<&str> {
        self.pdf_path.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn draft(mode: ApprovalMode) -> NewLeave {
        NewLeave {
            student_id: 7,
            student_snapshot: StudentSnapshot {
                name: "Asha Patil".to_string(),
                roll_number: Some("CS-044".to_string()),
                branch: Some("CSE".to_string()),
                year: Some("3".to_string()),
                hostel: Some("H-2".to_string()),
            },
            mode,
            reason: "medical".to_string(),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 12).expect("valid date"),
            remarks: None,
            submitted_at: Utc.with_ymd_and_hms(2024, 1, 9, 8, 0, 0).unwrap(),
        }
    }

    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 0).unwrap()
    }

    #[test]
    fn submitted_application_is_fully_pending() {
        let leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        assert_eq!(leave.status(), LeaveStatus::Pending);
        assert_eq!(leave.faculty_status(), ApprovalStatus::Pending);
        assert_eq!(leave.rector_status(), ApprovalStatus::Pending);
        assert_eq!(leave.created_at(), leave.updated_at());
        assert!(leave.pdf_path().is_none());
    }

    #[test]
    fn faculty_approval_moves_to_semi_approved() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        leave
            .record_faculty_decision(20, &Decision::approve(), later(), true)
            .expect("faculty may decide");

        assert_eq!(leave.status(), LeaveStatus::SemiApproved);
        assert_eq!(leave.faculty_stage().decided_by, Some(20));
        assert_eq!(leave.faculty_stage().decided_at, Some(later()));
        assert_eq!(leave.updated_at(), later());
    }

    #[test]
    fn faculty_rejection_short_circuits_rector_stage() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        let decision = Decision::reject(Some("insufficient documentation".to_string()));
        leave
            .record_faculty_decision(20, &decision, later(), true)
            .expect("faculty may decide");

        assert_eq!(leave.status(), LeaveStatus::Rejected);
        assert_eq!(leave.rector_status(), ApprovalStatus::Rejected);
        assert_eq!(leave.rector_stage().decided_by, None);
        assert_eq!(
            leave.faculty_stage().rejection_reason.as_deref(),
            Some("insufficient documentation")
        );
    }

    #[test]
    fn faculty_rejection_without_short_circuit_leaves_rector_pending() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        leave
            .record_faculty_decision(20, &Decision::reject(None), later(), false)
            .expect("faculty may decide");

        assert_eq!(leave.status(), LeaveStatus::Rejected);
        assert_eq!(leave.rector_status(), ApprovalStatus::Pending);
    }

    #[test]
    fn faculty_cannot_decide_twice() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        leave
            .record_faculty_decision(20, &Decision::approve(), later(), true)
            .expect("first decision");
        let before = leave.clone();

        let second = leave.record_faculty_decision(21, &Decision::reject(None), later(), true);
        assert_eq!(second, Err(TransitionRefused::FacultyAlreadyDecided));
        assert_eq!(leave, before);
    }

    #[test]
    fn faculty_is_refused_on_rector_only_requests() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::Rector));
        let refused = leave.record_faculty_decision(20, &Decision::approve(), later(), true);
        assert_eq!(refused, Err(TransitionRefused::FacultyNotInMode));
        assert_eq!(leave.faculty_status(), ApprovalStatus::Pending);
    }

    #[test]
    fn rector_waits_for_faculty_in_two_stage_mode() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        let refused = leave.record_rector_decision(30, &Decision::approve(), later());
        assert_eq!(refused, Err(TransitionRefused::AwaitingFaculty));
        assert_eq!(leave.rector_status(), ApprovalStatus::Pending);
    }

    #[test]
    fn rector_alone_approves_rector_mode() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::Rector));
        leave
            .record_rector_decision(30, &Decision::approve(), later())
            .expect("rector may decide");
        assert_eq!(leave.status(), LeaveStatus::Approved);
        assert_eq!(leave.rector_stage().rejection_reason, None);
    }

    #[test]
    fn approval_ignores_supplied_reason() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::Rector));
        let decision = Decision {
            verdict: Verdict::Approve,
            reason: Some("looks fine".to_string()),
        };
        leave
            .record_rector_decision(30, &decision, later())
            .expect("rector may decide");
        assert_eq!(leave.rector_stage().rejection_reason, None);
    }

    #[test]
    fn pass_only_attaches_to_approved_requests() {
        let mut leave = LeaveApplication::submitted(1, draft(ApprovalMode::Rector));
        assert_eq!(
            leave.attach_pass("/uploads/leave-1.pdf".to_string(), later()),
            Err(TransitionRefused::NotApproved)
        );

        leave
            .record_rector_decision(30, &Decision::approve(), later())
            .expect("rector may decide");
        leave
            .attach_pass("/uploads/leave-1.pdf".to_string(), later())
            .expect("approved request takes a pass");
        assert_eq!(leave.pdf_path(), Some("/uploads/leave-1.pdf"));
    }

    #[test]
    fn restore_rederives_status_and_drops_stray_pass() {
        let faculty = StageRecord {
            status: ApprovalStatus::Approved,
            decided_by: Some(20),
            decided_at: Some(later()),
            rejection_reason: None,
        };
        let leave = LeaveApplication::restore(
            5,
            draft(ApprovalMode::FacultyRector),
            faculty,
            StageRecord::pending(),
            Some("/uploads/leave-5.pdf".to_string()),
            Some(later()),
        );
        assert_eq!(leave.status(), LeaveStatus::SemiApproved);
        assert_eq!(leave.pdf_path(), None);
        assert_eq!(leave.updated_at(), later());
    }

    #[test]
    fn wire_values_parse_and_render() {
        assert_eq!(
            ApprovalMode::from_str("faculty+rector"),
            Ok(ApprovalMode::FacultyRector)
        );
        assert!(ApprovalMode::from_str("faculty").is_err());
        assert_eq!(Verdict::from_str("reject"), Ok(Verdict::Reject));
        assert_eq!(LeaveStatus::SemiApproved.as_ref(), "semi-approved");

        let leave = LeaveApplication::submitted(1, draft(ApprovalMode::FacultyRector));
        let json = serde_json::to_value(&leave).expect("serializes");
        assert_eq!(json["mode"], "faculty+rector");
        assert_eq!(json["facultyStatus"], "pending");
        assert_eq!(json["studentSnapshot"]["rollNumber"], "CS-044");
        assert_eq!(json["fromDate"], "2024-01-10");
    }
}
