//! Fixtures shared by the unit and HTTP tests.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::approval::service::{ApprovalPolicy, LeaveService, LeaveSubmission};
use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::model::leave_application::{ApprovalMode, LeaveApplication, NewLeave, StudentSnapshot};
use crate::model::role::{Caller, Role};
use crate::pdf::pass::PassRenderer;
use crate::store::memory::{MemoryLeaveStore, MemoryStudentDirectory};

pub const STUDENT_ID: u64 = 7;
pub const FACULTY_ID: u64 = 20;
pub const RECTOR_ID: u64 = 30;
pub const JWT_SECRET: &str = "test-secret";

pub fn student() -> Caller {
    Caller::new(STUDENT_ID, Role::Student)
}

pub fn faculty() -> Caller {
    Caller::new(FACULTY_ID, Role::Faculty)
}

pub fn rector() -> Caller {
    Caller::new(RECTOR_ID, Role::Rector)
}

pub fn snapshot() -> StudentSnapshot {
    StudentSnapshot {
        name: "Asha Patil".to_string(),
        roll_number: Some("CS-044".to_string()),
        branch: Some("CSE".to_string()),
        year: Some("3".to_string()),
        hostel: Some("H-2".to_string()),
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
}

pub fn new_leave(student_id: u64, mode: ApprovalMode) -> NewLeave {
    NewLeave {
        student_id,
        student_snapshot: snapshot(),
        mode,
        reason: "medical".to_string(),
        from_date: date(10),
        to_date: date(12),
        remarks: None,
        submitted_at: Utc::now(),
    }
}

pub fn submission(mode: &str) -> LeaveSubmission {
    LeaveSubmission {
        mode: Some(mode.to_string()),
        reason: Some("medical".to_string()),
        from_date: Some(date(10)),
        to_date: Some(date(12)),
        remarks: None,
    }
}

pub fn directory() -> Arc<MemoryStudentDirectory> {
    Arc::new(MemoryStudentDirectory::default().with_student(STUDENT_ID, snapshot()))
}

/// Pretends to render and reports the path a real renderer would produce.
pub struct StubRenderer;

#[async_trait]
impl PassRenderer for StubRenderer {
    async fn render(&self, leave: &LeaveApplication) -> anyhow::Result<String> {
        Ok(format!("/uploads/leave-{}.pdf", leave.id()))
    }
}

pub struct FailingRenderer;

#[async_trait]
impl PassRenderer for FailingRenderer {
    async fn render(&self, _leave: &LeaveApplication) -> anyhow::Result<String> {
        Err(anyhow!("disk full"))
    }
}

pub fn service_with(
    policy: ApprovalPolicy,
    renderer: Arc<dyn PassRenderer>,
) -> (LeaveService, Arc<MemoryLeaveStore>) {
    let store = Arc::new(MemoryLeaveStore::new());
    let service = LeaveService::new(store.clone(), directory(), renderer, policy);
    (service, store)
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
        "DATABASE_URL" => Some("mysql://unused".to_string()),
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn bearer(caller: &Caller) -> (&'static str, String) {
    let token = generate_access_token(
        caller.id,
        format!("{}-{}", caller.role, caller.id),
        caller.role.id(),
        JWT_SECRET,
        900,
    );
    ("Authorization", format!("Bearer {token}"))
}
