//! Filtering and pagination of role-scoped listings.

use crate::actor::Actor;
use crate::errors::DomainError;
use crate::lifecycle::{MAX_GRADE, MIN_GRADE};
use crate::model::submission::{StatusFilter, SubmissionStatus};
use crate::response::Page;
use crate::schema::{classrooms, project_submissions, submission_collaborators, users};
use diesel::pg::Pg;
use diesel::prelude::*;

pub const DEFAULT_CLASSROOMS_PER_PAGE: i64 = 12;
pub const DEFAULT_SUBMISSIONS_PER_PAGE: i64 = 20;
pub const DEFAULT_MEMBERS_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    per_page: i64,
}

impl Pagination {
    /// 1-based page number; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Pagination {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            page: self.page,
            per_page: self.per_page,
            total,
        }
    }
}

/// Wraps a search term into a case-insensitive substring pattern, escaping
/// the LIKE wildcards it contains.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn non_blank(term: Option<String>) -> Option<String> {
    term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn grade_bound(name: &str, value: Option<i32>) -> Result<Option<i16>, DomainError> {
    match value {
        None => Ok(None),
        Some(v) if (MIN_GRADE..=MAX_GRADE).contains(&v) => Ok(i16::try_from(v).ok()),
        Some(v) => Err(DomainError::validation(format!(
            "{} must be between {} and {} (got {}).",
            name, MIN_GRADE, MAX_GRADE, v
        ))),
    }
}

/// Conjunctive submission filters. Build with struct syntax and pass through
/// [`SubmissionFilter::validated_for`] before applying.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFilter {
    pub status: Option<StatusFilter>,
    pub grade_min: Option<i32>,
    pub grade_max: Option<i32>,
    pub classroom_id: Option<i64>,
    pub student: Option<String>,
}

impl SubmissionFilter {
    pub fn validated_for(self, actor: &Actor) -> Result<Self, DomainError> {
        if matches!(actor, Actor::Teacher(_)) && self.status == Some(StatusFilter::Draft) {
            return Err(DomainError::validation(
                "Draft submissions are not visible to teachers.",
            ));
        }
        let min = grade_bound("grade_min", self.grade_min)?;
        let max = grade_bound("grade_max", self.grade_max)?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(DomainError::validation(
                    "grade_min cannot be greater than grade_max.",
                ));
            }
        }
        Ok(SubmissionFilter {
            student: non_blank(self.student),
            ..self
        })
    }

    pub fn apply(
        &self,
        mut query: project_submissions::BoxedQuery<'static, Pg>,
    ) -> project_submissions::BoxedQuery<'static, Pg> {
        match self.status {
            Some(StatusFilter::Draft) => {
                query = query.filter(project_submissions::status.eq(SubmissionStatus::Draft))
            }
            Some(StatusFilter::Submitted) => {
                query = query.filter(project_submissions::status.eq(SubmissionStatus::Submitted))
            }
            Some(StatusFilter::Graded) => {
                query = query.filter(project_submissions::grade.is_not_null())
            }
            None => {}
        }
        if let Some(min) = self.grade_min.and_then(|v| i16::try_from(v).ok()) {
            query = query.filter(project_submissions::grade.ge(min));
        }
        if let Some(max) = self.grade_max.and_then(|v| i16::try_from(v).ok()) {
            query = query.filter(project_submissions::grade.le(max));
        }
        if let Some(classroom_id) = self.classroom_id {
            query = query.filter(project_submissions::classroom_id.eq(classroom_id));
        }
        if let Some(student) = &self.student {
            let pattern = like_pattern(student);
            query = query.filter(
                project_submissions::id.eq_any(
                    submission_collaborators::table
                        .inner_join(users::table)
                        .filter(
                            users::username
                                .ilike(pattern.clone())
                                .or(users::first_name.ilike(pattern.clone()))
                                .or(users::last_name.ilike(pattern)),
                        )
                        .select(submission_collaborators::submission_id),
                ),
            );
        }
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassroomFilter {
    pub search: Option<String>,
}

impl ClassroomFilter {
    pub fn new(search: Option<String>) -> Self {
        ClassroomFilter {
            search: non_blank(search),
        }
    }

    /// Matches title, description or the teacher's first/last name.
    pub fn apply(
        &self,
        query: classrooms::BoxedQuery<'static, Pg>,
    ) -> classrooms::BoxedQuery<'static, Pg> {
        let Some(search) = &self.search else {
            return query;
        };
        let pattern = like_pattern(search);
        query.filter(
            classrooms::title
                .ilike(pattern.clone())
                .or(classrooms::description.ilike(pattern.clone()))
                .or(classrooms::teacher_id.eq_any(
                    users::table
                        .filter(
                            users::first_name
                                .ilike(pattern.clone())
                                .or(users::last_name.ilike(pattern)),
                        )
                        .select(users::id),
                )),
        )
    }
}
