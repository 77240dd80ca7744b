use actix_web::{HttpResponse, web};

use super::{DecisionResponse, LeaveListResponse, RejectLeave, decision_response, rejection_reason};
use crate::approval::error::LeaveError;
use crate::approval::service::LeaveService;
use crate::auth::auth::AuthUser;
use crate::model::leave_application::Decision;

/* =========================
Faculty queue
========================= */
#[utoipa::path(
    get,
    path = "/api/faculty/leaves/pending",
    operation_id = "faculty_pending_leaves",
    responses(
        (status = 200, description = "Two-stage requests waiting on a faculty decision", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Faculty only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Faculty"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<HttpResponse, LeaveError> {
    let leaves = service.pending_for_faculty(&auth.caller()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { leaves }))
}

/* =========================
Faculty approve
========================= */
#[utoipa::path(
    patch,
    path = "/api/faculty/approve/{leave_id}",
    operation_id = "faculty_approve_leave",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved by faculty", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Faculty only"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Rector-only request or faculty decision already recorded", body = Object,
         example = json!({ "message": "Faculty decision already recorded" }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Faculty"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let leave = service
        .faculty_decide(&auth.caller(), path.into_inner(), Decision::approve())
        .await?;
    Ok(decision_response(&service, leave, "Leave approved by faculty"))
}

/* =========================
Faculty reject
========================= */
#[utoipa::path(
    patch,
    path = "/api/faculty/reject/{leave_id}",
    operation_id = "faculty_reject_leave",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(
        content = Option<RejectLeave>,
        description = "Optional rejection reason",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave rejected by faculty", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Faculty only"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Rector-only request or faculty decision already recorded")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Faculty"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, LeaveError> {
    let reason = rejection_reason(&body)?;
    let leave = service
        .faculty_decide(&auth.caller(), path.into_inner(), Decision::reject(reason))
        .await?;
    Ok(decision_response(&service, leave, "Leave rejected by faculty"))
}
