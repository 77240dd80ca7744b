use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{LeaveFilter, LeaveStore, StoreError, StudentDirectory};
use crate::model::leave_application::{
    DecisionState, LeaveApplication, NewLeave, StudentSnapshot,
};

#[derive(Default)]
struct Rows {
    next_id: u64,
    leaves: BTreeMap<u64, LeaveApplication>,
}

/// In-memory leave store. Check-and-write happens under one write lock.
#[derive(Default)]
pub struct MemoryLeaveStore {
    rows: RwLock<Rows>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn create(&self, draft: NewLeave) -> Result<LeaveApplication, StoreError> {
        let mut rows = self.rows.write().expect("leave rows poisoned");
        rows.next_id += 1;
        let leave = LeaveApplication::submitted(rows.next_id, draft);
        rows.leaves.insert(leave.id(), leave.clone());
        Ok(leave)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveApplication>, StoreError> {
        let rows = self.rows.read().expect("leave rows poisoned");
        Ok(rows.leaves.get(&id).cloned())
    }

    async fn find_by_filter(
        &self,
        filter: LeaveFilter,
    ) -> Result<Vec<LeaveApplication>, StoreError> {
        let rows = self.rows.read().expect("leave rows poisoned");
        let mut found: Vec<LeaveApplication> = rows
            .leaves
            .values()
            .filter(|leave| filter.matches(leave))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(found)
    }

    async fn commit_decision(
        &self,
        expected: DecisionState,
        updated: &LeaveApplication,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().expect("leave rows poisoned");
        match rows.leaves.get_mut(&updated.id()) {
            Some(current) if current.decision_state() == expected => {
                *current = updated.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn attach_pass(
        &self,
        id: u64,
        path: &str,
    ) -> Result<Option<LeaveApplication>, StoreError> {
        let mut rows = self.rows.write().expect("leave rows poisoned");
        let Some(current) = rows.leaves.get_mut(&id) else {
            return Ok(None);
        };
        match current.attach_pass(path.to_string(), Utc::now()) {
            Ok(()) => Ok(Some(current.clone())),
            Err(_) => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryStudentDirectory {
    students: RwLock<HashMap<u64, StudentSnapshot>>,
}

impl MemoryStudentDirectory {
    pub fn with_student(self, id: u64, snapshot: StudentSnapshot) -> Self {
        self.students
            .write()
            .expect("student directory poisoned")
            .insert(id, snapshot);
        self
    }

    pub fn rename(&self, id: u64, name: &str) {
        if let Some(student) = self
            .students
            .write()
            .expect("student directory poisoned")
            .get_mut(&id)
        {
            student.name = name.to_string();
        }
    }
}

#[async_trait]
impl StudentDirectory for MemoryStudentDirectory {
    async fn find_student(&self, id: u64) -> Result<Option<StudentSnapshot>, StoreError> {
        Ok(self
            .students
            .read()
            .expect("student directory poisoned")
            .get(&id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_application::{ApprovalMode, Decision};
    use crate::test_support::new_leave;

    #[actix_web::test]
    async fn ids_are_assigned_in_order() {
        let store = MemoryLeaveStore::new();
        let first = store
            .create(new_leave(7, ApprovalMode::Rector))
            .await
            .expect("create");
        let second = store
            .create(new_leave(7, ApprovalMode::Rector))
            .await
            .expect("create");
        assert_eq!((first.id(), second.id()), (1, 2));
    }

    #[actix_web::test]
    async fn stale_decision_commit_is_refused() {
        let store = MemoryLeaveStore::new();
        let leave = store
            .create(new_leave(7, ApprovalMode::FacultyRector))
            .await
            .expect("create");
        let expected = leave.decision_state();

        let mut approve = leave.clone();
        approve
            .record_faculty_decision(20, &Decision::approve(), Utc::now(), true)
            .expect("transition");
        let mut reject = leave.clone();
        reject
            .record_faculty_decision(21, &Decision::reject(None), Utc::now(), true)
            .expect("transition");

        assert!(store.commit_decision(expected, &approve).await.expect("commit"));
        assert!(!store.commit_decision(expected, &reject).await.expect("commit"));

        let stored = store.find_by_id(leave.id()).await.expect("find").expect("row");
        assert_eq!(stored, approve);
    }

    #[actix_web::test]
    async fn filter_results_are_newest_first() {
        let store = MemoryLeaveStore::new();
        for _ in 0..3 {
            store
                .create(new_leave(7, ApprovalMode::Rector))
                .await
                .expect("create");
        }
        store
            .create(new_leave(8, ApprovalMode::Rector))
            .await
            .expect("create");

        let ids: Vec<u64> = store
            .find_by_filter(LeaveFilter::Student(7))
            .await
            .expect("filter")
            .iter()
            .map(LeaveApplication::id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[actix_web::test]
    async fn pass_is_not_attached_before_approval() {
        let store = MemoryLeaveStore::new();
        let leave = store
            .create(new_leave(7, ApprovalMode::Rector))
            .await
            .expect("create");
        let attached = store
            .attach_pass(leave.id(), "/uploads/leave-1.pdf")
            .await
            .expect("attach");
        assert!(attached.is_none());
        assert!(store.attach_pass(99, "/uploads/x.pdf").await.expect("attach").is_none());
    }
}
