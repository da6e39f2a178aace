//! Permission rules for classrooms and submissions.
//!
//! The predicates are pure and decide single-resource access. Listings use the
//! query scopes below instead, which must never return a row the matching
//! predicate would refuse.

use crate::actor::Actor;
use crate::lifecycle;
use crate::model::classroom::{Classroom, ClassroomMembership};
use crate::model::submission::{SubmissionContext, SubmissionStatus};
use crate::schema::{classroom_memberships, classrooms, project_submissions, submission_collaborators};
use diesel::pg::Pg;
use diesel::prelude::*;

pub fn can_manage_classroom(actor: &Actor, classroom: &Classroom) -> bool {
    matches!(actor, Actor::Teacher(teacher) if teacher.id() == classroom.teacher_id)
}

/// Owning teacher, or a student holding a membership of this classroom.
pub fn can_view_classroom(
    actor: &Actor,
    classroom: &Classroom,
    membership: Option<&ClassroomMembership>,
) -> bool {
    match actor {
        Actor::Teacher(teacher) => teacher.id() == classroom.teacher_id,
        Actor::Student(student) => membership.is_some_and(|m| {
            m.classroom_id == classroom.id && m.student_id == student.id()
        }),
    }
}

/// Direct access: the owning teacher sees drafts too, unlike in listings.
pub fn can_view_submission(actor: &Actor, ctx: &SubmissionContext) -> bool {
    match actor {
        Actor::Teacher(teacher) => teacher.id() == ctx.classroom_teacher_id,
        Actor::Student(student) => ctx.is_collaborator(student.id()),
    }
}

pub fn can_edit_submission(actor: &Actor, ctx: &SubmissionContext) -> bool {
    match actor {
        Actor::Teacher(_) => false,
        Actor::Student(student) => {
            lifecycle::is_editable(ctx.submission.status) && ctx.is_collaborator(student.id())
        }
    }
}

pub fn can_grade_submission(actor: &Actor, ctx: &SubmissionContext) -> bool {
    match actor {
        Actor::Teacher(teacher) => {
            teacher.id() == ctx.classroom_teacher_id && ctx.submission.is_submitted()
        }
        Actor::Student(_) => false,
    }
}

/// Row-level form of [`visible_submissions`].
pub fn listed_submission(actor: &Actor, ctx: &SubmissionContext) -> bool {
    match actor {
        Actor::Teacher(teacher) => {
            teacher.id() == ctx.classroom_teacher_id && ctx.submission.is_submitted()
        }
        Actor::Student(student) => ctx.is_collaborator(student.id()),
    }
}

/// Classrooms an actor may list: owned ones for teachers, joined ones for
/// students.
pub fn visible_classrooms(actor: &Actor) -> classrooms::BoxedQuery<'static, Pg> {
    match actor {
        Actor::Teacher(teacher) => classrooms::table
            .filter(classrooms::teacher_id.eq(teacher.id()))
            .into_boxed(),
        Actor::Student(student) => classrooms::table
            .filter(
                classrooms::id.eq_any(
                    classroom_memberships::table
                        .filter(classroom_memberships::student_id.eq(student.id()))
                        .select(classroom_memberships::classroom_id),
                ),
            )
            .into_boxed(),
    }
}

/// Submissions an actor may list. Teachers only ever see SUBMITTED projects
/// of their own classrooms; students see the projects they collaborate on.
pub fn visible_submissions(actor: &Actor) -> project_submissions::BoxedQuery<'static, Pg> {
    match actor {
        Actor::Teacher(teacher) => project_submissions::table
            .filter(
                project_submissions::classroom_id.eq_any(
                    classrooms::table
                        .filter(classrooms::teacher_id.eq(teacher.id()))
                        .select(classrooms::id),
                ),
            )
            .filter(project_submissions::status.eq(SubmissionStatus::Submitted))
            .into_boxed(),
        Actor::Student(student) => project_submissions::table
            .filter(
                project_submissions::id.eq_any(
                    submission_collaborators::table
                        .filter(submission_collaborators::user_id.eq(student.id()))
                        .select(submission_collaborators::submission_id),
                ),
            )
            .into_boxed(),
    }
}
