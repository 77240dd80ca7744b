use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{LeaveFilter, LeaveStore, StoreError, StudentDirectory};
use crate::model::leave_application::{
    ApprovalMode, ApprovalStatus, DecisionState, LeaveApplication, NewLeave, StageRecord,
    StudentSnapshot,
};

const LEAVE_COLUMNS: &str = r#"
    id, student_id,
    student_name, student_roll_number, student_branch, student_year, student_hostel,
    mode, reason, from_date, to_date, remarks,
    faculty_status, faculty_id, faculty_decision_at, faculty_rejection_reason,
    rector_status, rector_id, rector_decision_at, rector_rejection_reason,
    pdf_path, created_at, updated_at
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    student_id: u64,
    student_name: String,
    student_roll_number: Option<String>,
    student_branch: Option<String>,
    student_year: Option<String>,
    student_hostel: Option<String>,
    mode: String,
    reason: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    remarks: Option<String>,
    faculty_status: String,
    faculty_id: Option<u64>,
    faculty_decision_at: Option<DateTime<Utc>>,
    faculty_rejection_reason: Option<String>,
    rector_status: String,
    rector_id: Option<u64>,
    rector_decision_at: Option<DateTime<Utc>>,
    rector_rejection_reason: Option<String>,
    pdf_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("{column} = '{value}'")))
}

impl TryFrom<LeaveRow> for LeaveApplication {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let draft = NewLeave {
            student_id: row.student_id,
            student_snapshot: StudentSnapshot {
                name: row.student_name,
                roll_number: row.student_roll_number,
                branch: row.student_branch,
                year: row.student_year,
                hostel: row.student_hostel,
            },
            mode: parse_column::<ApprovalMode>("mode", &row.mode)?,
            reason: row.reason,
            from_date: row.from_date,
            to_date: row.to_date,
            remarks: row.remarks,
            submitted_at: row.created_at,
        };
        let faculty = StageRecord {
            status: parse_column::<ApprovalStatus>("faculty_status", &row.faculty_status)?,
            decided_by: row.faculty_id,
            decided_at: row.faculty_decision_at,
            rejection_reason: row.faculty_rejection_reason,
        };
        let rector = StageRecord {
            status: parse_column::<ApprovalStatus>("rector_status", &row.rector_status)?,
            decided_by: row.rector_id,
            decided_at: row.rector_decision_at,
            rejection_reason: row.rector_rejection_reason,
        };

        Ok(LeaveApplication::restore(
            row.id,
            draft,
            faculty,
            rector,
            row.pdf_path,
            Some(row.updated_at),
        ))
    }
}

fn filter_clause(filter: LeaveFilter) -> (&'static str, Option<u64>) {
    match filter {
        LeaveFilter::All => ("", None),
        LeaveFilter::Student(id) => (" WHERE student_id = ?", Some(id)),
        LeaveFilter::AwaitingFaculty => (
            " WHERE mode = 'faculty+rector' AND faculty_status = 'pending'",
            None,
        ),
        LeaveFilter::AwaitingRector => (
            r#" WHERE rector_status = 'pending'
                AND (mode = 'rector'
                     OR (mode = 'faculty+rector' AND faculty_status = 'approved'))"#,
            None,
        ),
    }
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn create(&self, draft: NewLeave) -> Result<LeaveApplication, StoreError> {
        let snapshot = &draft.student_snapshot;
        let result = sqlx::query(
            r#"
            INSERT INTO leave_applications
                (student_id,
                 student_name, student_roll_number, student_branch, student_year, student_hostel,
                 mode, reason, from_date, to_date, remarks,
                 faculty_status, rector_status, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', 'pending', 'pending', ?, ?)
            "#,
        )
        .bind(draft.student_id)
        .bind(&snapshot.name)
        .bind(&snapshot.roll_number)
        .bind(&snapshot.branch)
        .bind(&snapshot.year)
        .bind(&snapshot.hostel)
        .bind(draft.mode.as_ref())
        .bind(&draft.reason)
        .bind(draft.from_date)
        .bind(draft.to_date)
        .bind(&draft.remarks)
        .bind(draft.submitted_at)
        .bind(draft.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(LeaveApplication::submitted(result.last_insert_id(), draft))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveApplication>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_applications WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveApplication::try_from).transpose()
    }

    async fn find_by_filter(
        &self,
        filter: LeaveFilter,
    ) -> Result<Vec<LeaveApplication>, StoreError> {
        let (where_sql, student_id) = filter_clause(filter);
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_applications{where_sql} ORDER BY created_at DESC, id DESC"
        );
        debug!(sql = %sql, ?filter, "Fetching leave applications");

        let mut query = sqlx::query_as::<_, LeaveRow>(&sql);
        if let Some(id) = student_id {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveApplication::try_from)
            .collect()
    }

    async fn commit_decision(
        &self,
        expected: DecisionState,
        updated: &LeaveApplication,
    ) -> Result<bool, StoreError> {
        let faculty = updated.faculty_stage();
        let rector = updated.rector_stage();

        let result = sqlx::query(
            r#"
            UPDATE leave_applications
            SET faculty_status = ?, faculty_id = ?, faculty_decision_at = ?, faculty_rejection_reason = ?,
                rector_status = ?, rector_id = ?, rector_decision_at = ?, rector_rejection_reason = ?,
                status = ?, updated_at = ?
            WHERE id = ?
            AND faculty_status = ?
            AND rector_status = ?
            "#,
        )
        .bind(faculty.status.as_ref())
        .bind(faculty.decided_by)
        .bind(faculty.decided_at)
        .bind(&faculty.rejection_reason)
        .bind(rector.status.as_ref())
        .bind(rector.decided_by)
        .bind(rector.decided_at)
        .bind(&rector.rejection_reason)
        .bind(updated.status().as_ref())
        .bind(updated.updated_at())
        .bind(updated.id())
        .bind(expected.faculty.as_ref())
        .bind(expected.rector.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn attach_pass(
        &self,
        id: u64,
        path: &str,
    ) -> Result<Option<LeaveApplication>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_applications
            SET pdf_path = ?, updated_at = ?
            WHERE id = ?
            AND status = 'approved'
            "#,
        )
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[derive(FromRow)]
struct StudentRow {
    name: String,
    roll_number: Option<String>,
    branch: Option<String>,
    study_year: Option<String>,
    hostel: Option<String>,
}

pub struct MySqlStudentDirectory {
    pool: MySqlPool,
}

impl MySqlStudentDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentDirectory for MySqlStudentDirectory {
    async fn find_student(&self, id: u64) -> Result<Option<StudentSnapshot>, StoreError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT name, roll_number, branch, study_year, hostel
            FROM students
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|s| StudentSnapshot {
            name: s.name,
            roll_number: s.roll_number,
            branch: s.branch,
            year: s.study_year,
            hostel: s.hostel,
        }))
    }
}
