use crate::model::user::UserSummary;
use crate::schema::{project_submissions, submission_collaborators};
use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Varchar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Varchar)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "DRAFT",
            SubmissionStatus::Submitted => "SUBMITTED",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Varchar, Pg> for SubmissionStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Varchar, Pg> for SubmissionStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"DRAFT" => Ok(SubmissionStatus::Draft),
            b"SUBMITTED" => Ok(SubmissionStatus::Submitted),
            other => Err(format!(
                "Unrecognized submission status: {}",
                String::from_utf8_lossy(other)
            )
            .into()),
        }
    }
}

/// Status filter of submission listings. `Graded` means "a grade is
/// assigned" and is independent of the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    Draft,
    Submitted,
    Graded,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = project_submissions)]
pub struct ProjectSubmission {
    pub id: i64,
    pub classroom_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: String,
    pub repository_url: String,
    pub deployed_url: Option<String>,
    pub status: SubmissionStatus,
    pub grade: Option<i16>,
    pub teacher_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ProjectSubmission {
    pub fn is_submitted(&self) -> bool {
        self.status == SubmissionStatus::Submitted
    }

    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = project_submissions)]
pub struct NewProjectSubmission {
    pub classroom_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: String,
    pub repository_url: String,
    pub deployed_url: Option<String>,
    pub status: SubmissionStatus,
    // grade is NULL, teacher_notes defaults to '' in DB
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = project_submissions)]
pub struct SubmissionChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub deployed_url: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Queryable, Selectable, Debug, Clone, Copy, PartialEq)]
#[diesel(table_name = submission_collaborators)]
pub struct SubmissionCollaborator {
    pub submission_id: i64,
    pub user_id: i64,
}

/// A submission together with the facts access checks need: who owns the
/// classroom and who collaborates on the project.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionContext {
    pub submission: ProjectSubmission,
    pub classroom_teacher_id: i64,
    pub collaborator_ids: Vec<i64>,
}

impl SubmissionContext {
    pub fn is_collaborator(&self, user_id: i64) -> bool {
        self.collaborator_ids.contains(&user_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionResponse {
    pub id: i64,
    pub classroom_id: i64,
    pub classroom_title: String,
    pub title: String,
    pub description: String,
    pub repository_url: String,
    pub deployed_url: Option<String>,
    pub status: SubmissionStatus,
    pub grade: Option<i16>,
    pub is_graded: bool,
    pub teacher_notes: String,
    pub created_by: i64,
    pub collaborators: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmissionResponse {
    pub fn new(
        submission: ProjectSubmission,
        classroom_title: String,
        collaborators: Vec<UserSummary>,
    ) -> Self {
        SubmissionResponse {
            id: submission.id,
            classroom_id: submission.classroom_id,
            classroom_title,
            is_graded: submission.is_graded(),
            title: submission.title,
            description: submission.description,
            repository_url: submission.repository_url,
            deployed_url: submission.deployed_url,
            status: submission.status,
            grade: submission.grade,
            teacher_notes: submission.teacher_notes,
            created_by: submission.created_by,
            collaborators,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
            submitted_at: submission.submitted_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionDetailResponse {
    pub submission: SubmissionResponse,
    pub can_edit: bool,
    pub can_grade: bool,
    pub is_collaborator: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SubmissionStats {
    pub total: i64,
    /// SUBMITTED and not yet graded.
    pub pending: i64,
    pub graded: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeacherSubmissionListResponse {
    pub submissions: crate::response::Page<SubmissionResponse>,
    pub stats: SubmissionStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassroomSubmissionListResponse {
    pub classroom_id: i64,
    pub classroom_title: String,
    pub submissions: crate::response::Page<SubmissionResponse>,
    pub stats: SubmissionStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeResponse {
    pub submission_id: i64,
    pub grade: i16,
    pub teacher_notes: String,
}
