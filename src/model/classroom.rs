use crate::model::submission::SubmissionResponse;
use crate::model::user::UserSummary;
use crate::schema::{classroom_memberships, classrooms};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = classrooms)]
pub struct Classroom {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements_file: Option<String>,
    pub join_code: String,
    pub teacher_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = classrooms)]
pub struct NewClassroom {
    pub title: String,
    pub description: String,
    pub requirements_file: Option<String>,
    pub join_code: String,
    pub teacher_id: i64,
    // created_at, updated_at have DB defaults
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = classrooms)]
pub struct ClassroomChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements_file: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClassroomChangeset {
    pub fn has_updates(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.requirements_file.is_some()
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = classroom_memberships)]
pub struct ClassroomMembership {
    pub id: i64,
    pub classroom_id: i64,
    pub student_id: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = classroom_memberships)]
pub struct NewClassroomMembership {
    pub classroom_id: i64,
    pub student_id: i64,
    // joined_at has a DB default
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassroomSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements_file: Option<String>,
    pub teacher: UserSummary,
    /// Only present for the owning teacher.
    pub join_code: Option<String>,
    pub student_count: i64,
    /// Counts SUBMITTED projects only.
    pub submission_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemberResponse {
    pub membership_id: i64,
    pub student: UserSummary,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassroomDetailResponse {
    pub classroom: ClassroomSummary,
    pub is_owner: bool,
    pub is_member: bool,
    pub member_count: i64,
    pub members: Vec<MemberResponse>,
    /// Owner view: the most recent SUBMITTED projects.
    pub submissions: Vec<SubmissionResponse>,
    /// Member view: the project this student collaborates on, if any.
    pub my_submission: Option<SubmissionResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreatedClassroomResponse {
    pub classroom_id: i64,
    pub join_code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JoinClassroomResponse {
    pub membership_id: i64,
    pub classroom_id: i64,
    pub classroom_title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JoinCodeResponse {
    pub join_code: String,
}
