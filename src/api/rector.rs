use actix_web::{HttpResponse, web};
use tracing::info;

use super::{DecisionResponse, LeaveListResponse, PassResponse, RejectLeave, decision_response, rejection_reason};
use crate::approval::error::LeaveError;
use crate::approval::service::LeaveService;
use crate::auth::auth::AuthUser;
use crate::model::leave_application::Decision;

/* =========================
All leaves (rector)
========================= */
#[utoipa::path(
    get,
    path = "/api/rector/leaves",
    responses(
        (status = 200, description = "Every leave request, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only rector can perform this action")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Rector"
)]
pub async fn all_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<HttpResponse, LeaveError> {
    let leaves = service.list_all(&auth.caller()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { leaves }))
}

/* =========================
Rector queue
========================= */
#[utoipa::path(
    get,
    path = "/api/rector/leaves/pending",
    operation_id = "rector_pending_leaves",
    responses(
        (status = 200, description = "Requests waiting on the rector", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only rector can perform this action")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Rector"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<HttpResponse, LeaveError> {
    let leaves = service.pending_for_rector(&auth.caller()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { leaves }))
}

/* =========================
Rector approve
========================= */
#[utoipa::path(
    patch,
    path = "/api/rector/approve/{leave_id}",
    operation_id = "rector_approve_leave",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved, pass generation queued", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only rector can perform this action"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Faculty approval missing or rector decision already recorded", body = Object,
         example = json!({ "message": "Faculty approval is required before the rector decides" }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Rector"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let leave = service
        .rector_decide(&auth.caller(), path.into_inner(), Decision::approve())
        .await?;
    Ok(decision_response(&service, leave, "Leave approved by rector"))
}

/* =========================
Rector reject
========================= */
#[utoipa::path(
    patch,
    path = "/api/rector/reject/{leave_id}",
    operation_id = "rector_reject_leave",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(
        content = Option<RejectLeave>,
        description = "Optional rejection reason",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave rejected by rector", body = DecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only rector can perform this action"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Faculty approval missing or rector decision already recorded")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Rector"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, LeaveError> {
    let reason = rejection_reason(&body)?;
    let leave = service
        .rector_decide(&auth.caller(), path.into_inner(), Decision::reject(reason))
        .await?;
    Ok(decision_response(&service, leave, "Leave rejected by rector"))
}

/* =========================
Regenerate pass (rector)
========================= */
#[utoipa::path(
    post,
    path = "/api/admin/regenerate-pdf/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of an approved leave request")
    ),
    responses(
        (status = 200, description = "Leave pass regenerated", body = PassResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only rector can perform this action"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave request is not approved"),
        (status = 502, description = "Pass rendering failed", body = Object,
         example = json!({ "message": "Could not generate leave pass: disk full" }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Rector"
)]
pub async fn regenerate_pass(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let leave = service
        .regenerate_pass(&auth.caller(), path.into_inner())
        .await?;
    info!(
        leave_id = leave.id(),
        caller_id = auth.user_id,
        username = %auth.username,
        "Leave pass regenerated"
    );

    Ok(HttpResponse::Ok().json(PassResponse {
        message: "Leave pass regenerated".to_string(),
        pdf_path: leave.pdf_path().map(str::to_owned),
        leave,
    }))
}
