use crate::errors::DomainError;
use crate::model::classroom::ClassroomChangeset;
use crate::model::submission::StatusFilter;
use crate::query::SubmissionFilter;
use crate::validation;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct ListClassroomsParams {
    pub user_id: i64,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetClassroomParams {
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateClassroomPayload {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub requirements_file: Option<String>,
}

/// Validated classroom fields, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassroomFields {
    pub title: String,
    pub description: String,
    pub requirements_file: Option<String>,
}

impl CreateClassroomPayload {
    pub fn validate(&self) -> Result<ClassroomFields, DomainError> {
        Ok(ClassroomFields {
            title: validation::title(&self.title)?,
            description: validation::description(&self.description)?,
            requirements_file: validation::requirements_file(self.requirements_file.as_deref())?,
        })
    }
}

/// Absent fields stay unchanged. An empty `requirements_file` removes the
/// attachment.
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateClassroomPayload {
    pub user_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements_file: Option<String>,
}

impl UpdateClassroomPayload {
    pub fn changeset(&self) -> Result<ClassroomChangeset, DomainError> {
        let changeset = ClassroomChangeset {
            title: self.title.as_deref().map(validation::title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(validation::description)
                .transpose()?,
            requirements_file: self
                .requirements_file
                .as_deref()
                .map(|file| validation::requirements_file(Some(file)))
                .transpose()?,
            updated_at: None,
        };
        if !changeset.has_updates() {
            return Err(DomainError::validation("No changes were provided."));
        }
        Ok(ClassroomChangeset {
            updated_at: Some(Utc::now()),
            ..changeset
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JoinClassroomPayload {
    pub user_id: i64,
    pub join_code: String,
}

/// Body of the single-actor classroom actions: delete, leave, regenerate
/// code and member removal.
#[derive(Serialize, Deserialize, Debug)]
pub struct ClassroomActionPayload {
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListMembersParams {
    pub user_id: i64,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClassroomSubmissionsParams {
    pub user_id: i64,
    pub status: Option<StatusFilter>,
    pub grade_min: Option<i32>,
    pub grade_max: Option<i32>,
    pub student: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ClassroomSubmissionsParams {
    pub fn filter(&self, classroom_id: i64) -> SubmissionFilter {
        SubmissionFilter {
            status: self.status,
            grade_min: self.grade_min,
            grade_max: self.grade_max,
            classroom_id: Some(classroom_id),
            student: self.student.clone(),
        }
    }
}
