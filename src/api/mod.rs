pub mod faculty;
pub mod leave;
pub mod rector;

use actix_web::{HttpRequest, HttpResponse, error::JsonPayloadError, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::approval::error::LeaveError;
use crate::approval::service::LeaveService;
use crate::model::leave_application::{LeaveApplication, LeaveStatus};

#[derive(Serialize, ToSchema)]
pub struct LeaveDetail {
    pub leave: LeaveApplication,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveCreated {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    pub leave: LeaveApplication,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub leaves: Vec<LeaveApplication>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    #[schema(example = "Leave approved by rector")]
    pub message: String,
    pub leave: LeaveApplication,
    /// True when the approval queued generation of the leave pass.
    #[schema(example = true)]
    pub pass_queued: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassResponse {
    #[schema(example = "Leave pass regenerated")]
    pub message: String,
    #[schema(example = "/uploads/leave-1.pdf")]
    pub pdf_path: Option<String>,
    pub leave: LeaveApplication,
}

/// Optional body of the reject endpoints.
#[derive(Deserialize, ToSchema, Default)]
pub struct RejectLeave {
    #[schema(example = "insufficient documentation")]
    pub reason: Option<String>,
}

/// Answers a committed decision. A request that just became approved gets its
/// pass rendered on a detached task; a rendering failure only shows up in the logs.
pub(crate) fn decision_response(
    service: &web::Data<LeaveService>,
    leave: LeaveApplication,
    message: &str,
) -> HttpResponse {
    let pass_queued = leave.status() == LeaveStatus::Approved && leave.pdf_path().is_none();
    if pass_queued {
        let service = service.clone();
        let leave_id = leave.id();
        actix_web::rt::spawn(async move {
            if let Some(path) = service.issue_pass_best_effort(leave_id).await {
                info!(leave_id, pdf_path = %path, "Leave pass attached");
            }
        });
    }

    HttpResponse::Ok().json(DecisionResponse {
        message: message.to_string(),
        leave,
        pass_queued,
    })
}

pub(crate) fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    LeaveError::validation(format!("Invalid request body: {err}")).into()
}

/// Reason carried by an optional reject body. An empty body means no reason;
/// anything else must be a valid `RejectLeave` document.
pub(crate) fn rejection_reason(body: &[u8]) -> Result<Option<String>, LeaveError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let payload: RejectLeave = serde_json::from_slice(body)
        .map_err(|err| LeaveError::validation(format!("Invalid request body: {err}")))?;
    Ok(payload.reason)
}
