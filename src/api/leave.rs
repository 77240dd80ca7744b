use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{DecisionResponse, LeaveCreated, LeaveDetail, LeaveListResponse, decision_response};
use crate::approval::error::LeaveError;
use crate::approval::service::{LeaveService, LeaveSubmission};
use crate::auth::auth::AuthUser;
use crate::model::leave_application::{Decision, Verdict};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    /// `rector` or `faculty+rector`
    #[schema(example = "faculty+rector")]
    pub mode: Option<String>,
    #[schema(example = "medical")]
    pub reason: Option<String>,
    #[schema(example = "2024-01-10", format = "date", value_type = Option<String>)]
    pub from_date: Option<NaiveDate>,
    #[schema(example = "2024-01-12", format = "date", value_type = Option<String>)]
    pub to_date: Option<NaiveDate>,
    #[schema(example = "going home")]
    pub remarks: Option<String>,
}

impl From<ApplyLeave> for LeaveSubmission {
    fn from(body: ApplyLeave) -> Self {
        LeaveSubmission {
            mode: body.mode,
            reason: body.reason,
            from_date: body.from_date,
            to_date: body.to_date,
            remarks: body.remarks,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    /// `approve` or `reject`
    #[schema(example = "approve")]
    pub action: String,
    #[schema(example = "insufficient documentation")]
    pub reason: Option<String>,
}

/* =========================
Apply for leave (student)
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/apply",
    request_body(
        content = ApplyLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveCreated),
        (status = 400, description = "Missing or invalid mode, reason or dates", body = Object,
         example = json!({ "message": "Provide fromDate and toDate." })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students only"),
        (status = 404, description = "Student not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, LeaveError> {
    let leave = service
        .submit(&auth.caller(), payload.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(LeaveCreated {
        message: "Leave request submitted".to_string(),
        leave,
    }))
}

/* =========================
List my leaves (student)
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/my-leaves",
    responses(
        (status = 200, description = "The caller's leave requests, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<HttpResponse, LeaveError> {
    let leaves = service.list_for_student(&auth.caller()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { leaves }))
}

/* =========================
Get leave by id
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students may only view their own leaves"),
        (status = 404, description = "Leave not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let leave = service.get(&auth.caller(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveDetail { leave }))
}

/* =========================
Approve / reject by role
========================= */
#[utoipa::path(
    patch,
    path = "/api/leaves/status/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(
        content = UpdateLeaveStatus,
        description = "Decision of the calling faculty or rector",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Decision recorded", body = DecisionResponse),
        (status = 400, description = "Unknown action", body = Object,
         example = json!({ "message": "Action must be 'approve' or 'reject'." })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only faculty or rector can change approval status"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Decision already recorded or faculty approval missing")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_status(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> Result<HttpResponse, LeaveError> {
    let body = payload.into_inner();
    let verdict = Verdict::from_str(body.action.trim())
        .map_err(|_| LeaveError::validation("Action must be 'approve' or 'reject'."))?;

    let leave = service
        .decide(
            &auth.caller(),
            path.into_inner(),
            Decision {
                verdict,
                reason: body.reason,
            },
        )
        .await?;

    Ok(decision_response(&service, leave, "Leave status updated"))
}
