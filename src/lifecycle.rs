//! Status rules of a project submission.
//!
//! DRAFT is the only editable and deletable state. SUBMITTED is terminal for
//! the status; grading happens on top of it and never reopens the draft.

use crate::errors::DomainError;
use crate::model::submission::{ProjectSubmission, SubmissionStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub const MIN_GRADE: i32 = 1;
pub const MAX_GRADE: i32 = 20;

/// A grade known to be within `MIN_GRADE..=MAX_GRADE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade(i16);

impl Grade {
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
            return Err(DomainError::InvalidGrade(value));
        }
        i16::try_from(value)
            .map(Grade)
            .map_err(|_| DomainError::InvalidGrade(value))
    }

    pub fn value(self) -> i16 {
        self.0
    }
}

pub fn is_editable(status: SubmissionStatus) -> bool {
    status == SubmissionStatus::Draft
}

pub fn ensure_editable(submission: &ProjectSubmission) -> Result<(), DomainError> {
    if is_editable(submission.status) {
        Ok(())
    } else {
        Err(DomainError::NotEditable)
    }
}

pub fn ensure_gradable(submission: &ProjectSubmission) -> Result<(), DomainError> {
    match submission.status {
        SubmissionStatus::Submitted => Ok(()),
        SubmissionStatus::Draft => Err(DomainError::NotSubmitted),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { submitted_at: DateTime<Utc> },
    AlreadySubmitted,
}

/// Decides the DRAFT -> SUBMITTED transition. An already submitted project is
/// an expected outcome, not an error.
pub fn submit(status: SubmissionStatus, now: DateTime<Utc>) -> SubmitOutcome {
    match status {
        SubmissionStatus::Draft => SubmitOutcome::Submitted { submitted_at: now },
        SubmissionStatus::Submitted => SubmitOutcome::AlreadySubmitted,
    }
}

/// Builds the collaborator set of a submission: every requested collaborator
/// must be a student member of the classroom, and the creator is always in.
pub fn collaborator_set(
    creator_id: i64,
    requested: &[i64],
    classroom_student_ids: &[i64],
) -> Result<Vec<i64>, DomainError> {
    let outsiders: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| *id != creator_id && !classroom_student_ids.contains(id))
        .collect();

    if !outsiders.is_empty() {
        return Err(DomainError::validation(format!(
            "Collaborators must be students of this classroom (not members: {:?}).",
            outsiders
        )));
    }

    let mut set: BTreeSet<i64> = requested.iter().copied().collect();
    set.insert(creator_id);
    Ok(set.into_iter().collect())
}
