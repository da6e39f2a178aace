use crate::errors::DomainError;
use crate::model::submission::{StatusFilter, SubmissionChangeset};
use crate::query::SubmissionFilter;
use crate::validation;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateSubmissionPayload {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub repository_url: String,
    pub deployed_url: Option<String>,
    /// Additional student members of the classroom; the creator is added
    /// automatically.
    #[serde(default)]
    pub collaborators: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionFields {
    pub title: String,
    pub description: String,
    pub repository_url: String,
    pub deployed_url: Option<String>,
}

impl CreateSubmissionPayload {
    pub fn validate(&self) -> Result<SubmissionFields, DomainError> {
        Ok(SubmissionFields {
            title: validation::title(&self.title)?,
            description: validation::description(&self.description)?,
            repository_url: validation::repository_url(&self.repository_url)?,
            deployed_url: validation::deployed_url(self.deployed_url.as_deref())?,
        })
    }
}

/// Absent fields stay unchanged; an empty `deployed_url` removes the link.
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateSubmissionPayload {
    pub user_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub deployed_url: Option<String>,
    pub collaborators: Option<Vec<i64>>,
}

impl UpdateSubmissionPayload {
    pub fn changeset(&self) -> Result<SubmissionChangeset, DomainError> {
        Ok(SubmissionChangeset {
            title: self.title.as_deref().map(validation::title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(validation::description)
                .transpose()?,
            repository_url: self
                .repository_url
                .as_deref()
                .map(validation::repository_url)
                .transpose()?,
            deployed_url: self
                .deployed_url
                .as_deref()
                .map(|url| validation::deployed_url(Some(url)))
                .transpose()?,
            updated_at: Some(Utc::now()),
        })
    }
}

/// Body of submit and delete.
#[derive(Serialize, Deserialize, Debug)]
pub struct SubmissionActionPayload {
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GradeSubmissionPayload {
    pub user_id: i64,
    pub grade: i32,
    #[serde(default)]
    pub teacher_notes: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetSubmissionParams {
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListSubmissionsParams {
    pub user_id: i64,
    pub status: Option<StatusFilter>,
    pub grade_min: Option<i32>,
    pub grade_max: Option<i32>,
    pub classroom_id: Option<i64>,
    pub student: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListSubmissionsParams {
    pub fn filter(&self) -> SubmissionFilter {
        SubmissionFilter {
            status: self.status,
            grade_min: self.grade_min,
            grade_max: self.grade_max,
            classroom_id: self.classroom_id,
            student: self.student.clone(),
        }
    }
}
