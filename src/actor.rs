//! The acting user of a request, as one of two disjoint roles.
//!
//! The persisted `is_teacher` flag is read once per request and turned into
//! an [`Actor`]. Role-gated operations ask for a [`Teacher`] or a [`Student`]
//! instead of re-checking the flag, so a user can never act in both roles.

use crate::errors::DomainError;
use crate::model::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Teacher {
    id: i64,
}

impl Teacher {
    pub fn new(id: i64) -> Self {
        Teacher { id }
    }

    pub fn id(self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Student {
    id: i64,
}

impl Student {
    pub fn new(id: i64) -> Self {
        Student { id }
    }

    pub fn id(self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Teacher(Teacher),
    Student(Student),
}

impl Actor {
    pub fn id(&self) -> i64 {
        match self {
            Actor::Teacher(teacher) => teacher.id(),
            Actor::Student(student) => student.id(),
        }
    }

    /// Capability check for teacher-only operations.
    pub fn teacher(&self) -> Result<Teacher, DomainError> {
        match self {
            Actor::Teacher(teacher) => Ok(*teacher),
            Actor::Student(_) => Err(DomainError::forbidden(
                "You must be a teacher to access this page.",
            )),
        }
    }

    /// Capability check for student-only operations.
    pub fn student(&self) -> Result<Student, DomainError> {
        match self {
            Actor::Student(student) => Ok(*student),
            Actor::Teacher(_) => Err(DomainError::forbidden(
                "This page is only accessible to students.",
            )),
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        if user.is_teacher {
            Actor::Teacher(Teacher::new(user.id))
        } else {
            Actor::Student(Student::new(user.id))
        }
    }
}
