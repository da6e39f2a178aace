use crate::model::submission::SubmissionResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassroomOverview {
    pub id: i64,
    pub title: String,
    pub student_count: i64,
    pub drafts_count: i64,
    pub submitted_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MembershipOverview {
    pub classroom_id: i64,
    pub classroom_title: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeacherDashboard {
    pub classrooms: Vec<ClassroomOverview>,
    pub total_classrooms: i64,
    /// Distinct students across all owned classrooms.
    pub total_students: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StudentDashboard {
    pub memberships: Vec<MembershipOverview>,
    pub total_classrooms: i64,
    pub submissions: Vec<SubmissionResponse>,
    pub draft_count: i64,
    pub submitted_count: i64,
    pub graded_count: i64,
    pub average_grade: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardResponse {
    Teacher(TeacherDashboard),
    Student(StudentDashboard),
}
