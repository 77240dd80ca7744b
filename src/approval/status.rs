use crate::model::leave_application::{ApprovalMode, ApprovalStatus, LeaveStatus};

/// Collapses both approvers' decisions into the overall status of a leave application.
///
/// Precedence matters: an explicit rejection from either stage wins over everything,
/// then the mode decides which stages count. In two-stage mode a rector approval
/// recorded while the faculty stage is still open does not advance the status.
pub fn recompute_overall_status(
    mode: ApprovalMode,
    faculty: ApprovalStatus,
    rector: ApprovalStatus,
) -> LeaveStatus {
    if faculty == ApprovalStatus::Rejected || rector == ApprovalStatus::Rejected {
        return LeaveStatus::Rejected;
    }

    match mode {
        ApprovalMode::Rector => match rector {
            ApprovalStatus::Approved => LeaveStatus::Approved,
            _ => LeaveStatus::Pending,
        },
        ApprovalMode::FacultyRector => match (faculty, rector) {
            (ApprovalStatus::Approved, ApprovalStatus::Approved) => LeaveStatus::Approved,
            (ApprovalStatus::Approved, ApprovalStatus::Pending) => LeaveStatus::SemiApproved,
            (ApprovalStatus::Pending, _) => LeaveStatus::Pending,
            _ => LeaveStatus::Pending,
        },
    }
}
