use crate::api::leave::{ApplyLeave, UpdateLeaveStatus};
use crate::api::{
    DecisionResponse, LeaveCreated, LeaveDetail, LeaveListResponse, PassResponse, RejectLeave,
};
use crate::model::leave_application::{
    ApprovalMode, ApprovalStatus, LeaveApplication, LeaveStatus, StudentSnapshot,
};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Pass API",
        version = "1.0.0",
        description = r#"
## Student Leave Approval

Students submit leave requests that are approved either by the **rector** alone
or by **faculty first, then the rector**.

### Status
- `pending`: nothing decided yet
- `semi-approved`: faculty approved, rector still open
- `approved`: every required approver approved; a PDF pass is generated
- `rejected`: any approver rejected

### Security
Every `/api` endpoint requires a **JWT Bearer** token. The `role` claim selects
what the caller may do: `1` student, `2` faculty, `3` rector.

### Errors
Failures answer `{"message": "..."}` with 400, 403, 404, 409 or 502.
"#,
    ),
    paths(
        crate::api::leave::apply_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::update_status,

        crate::api::faculty::pending_leaves,
        crate::api::faculty::approve_leave,
        crate::api::faculty::reject_leave,

        crate::api::rector::all_leaves,
        crate::api::rector::pending_leaves,
        crate::api::rector::approve_leave,
        crate::api::rector::reject_leave,
        crate::api::rector::regenerate_pass
    ),
    components(
        schemas(
            ApplyLeave,
            UpdateLeaveStatus,
            RejectLeave,
            LeaveApplication,
            StudentSnapshot,
            ApprovalMode,
            ApprovalStatus,
            LeaveStatus,
            LeaveCreated,
            LeaveDetail,
            LeaveListResponse,
            DecisionResponse,
            PassResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Student leave requests"),
        (name = "Faculty", description = "Faculty approval stage"),
        (name = "Rector", description = "Rector approval stage and leave passes"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
