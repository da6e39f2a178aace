use crate::access;
use crate::actor::Actor;
use crate::errors::{AppError, DomainError};
use crate::model::classroom::{Classroom, ClassroomMembership, ClassroomSummary};
use crate::model::submission::{
    ProjectSubmission, SubmissionContext, SubmissionResponse, SubmissionStats, SubmissionStatus,
};
use crate::model::user::{User, UserSummary};
use crate::query::{Pagination, SubmissionFilter};
use crate::response::Page;
use crate::schema::{
    classroom_memberships, classrooms, project_submissions, submission_collaborators, users,
};
use deadpool_diesel::postgres::Pool;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use tracing::{debug, error};

/// Runs a blocking closure on a pooled connection.
pub(super) async fn run_query<T, F>(pool: &Pool, query: F) -> Result<T, AppError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await.map_err(|pool_err| {
        error!(
            "Failed to get DB connection object from pool: {:?}",
            pool_err
        );
        AppError::from(pool_err)
    })?;
    debug!("DB connection object obtained from pool for interaction");

    conn.interact(query).await?
}

/// Like [`run_query`], but inside one transaction: committed on `Ok`, rolled
/// back on any error.
pub(super) async fn run_transaction<T, F>(pool: &Pool, work: F) -> Result<T, AppError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    run_query(pool, move |conn| conn.transaction(work)).await
}

pub(super) fn is_unique_violation(err: &DieselError, constraint: &str) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(constraint)
    )
}

pub(super) fn find_user(conn: &mut PgConnection, user_id: i64) -> Result<User, AppError> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            DomainError::not_found(format!("User with ID {} not found.", user_id)).into()
        })
}

pub(super) fn find_actor(conn: &mut PgConnection, user_id: i64) -> Result<Actor, AppError> {
    find_user(conn, user_id).map(|user| Actor::from(&user))
}

pub(super) fn find_classroom(
    conn: &mut PgConnection,
    classroom_id: i64,
) -> Result<Classroom, AppError> {
    classrooms::table
        .find(classroom_id)
        .select(Classroom::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            DomainError::not_found(format!("Classroom with ID {} not found.", classroom_id)).into()
        })
}

pub(super) fn find_membership(
    conn: &mut PgConnection,
    classroom_id: i64,
    student_id: i64,
) -> Result<Option<ClassroomMembership>, AppError> {
    Ok(classroom_memberships::table
        .filter(classroom_memberships::classroom_id.eq(classroom_id))
        .filter(classroom_memberships::student_id.eq(student_id))
        .select(ClassroomMembership::as_select())
        .first(conn)
        .optional()?)
}

pub(super) fn classroom_student_ids(
    conn: &mut PgConnection,
    classroom_id: i64,
) -> Result<Vec<i64>, AppError> {
    Ok(classroom_memberships::table
        .filter(classroom_memberships::classroom_id.eq(classroom_id))
        .select(classroom_memberships::student_id)
        .load::<i64>(conn)?)
}

pub(super) fn load_submission_context(
    conn: &mut PgConnection,
    submission_id: i64,
) -> Result<SubmissionContext, AppError> {
    let (submission, classroom_teacher_id) = project_submissions::table
        .inner_join(classrooms::table)
        .filter(project_submissions::id.eq(submission_id))
        .select((ProjectSubmission::as_select(), classrooms::teacher_id))
        .first::<(ProjectSubmission, i64)>(conn)
        .optional()?
        .ok_or_else(|| {
            AppError::from(DomainError::not_found(format!(
                "Submission with ID {} not found.",
                submission_id
            )))
        })?;

    let collaborator_ids = submission_collaborators::table
        .filter(submission_collaborators::submission_id.eq(submission_id))
        .select(submission_collaborators::user_id)
        .load::<i64>(conn)?;

    Ok(SubmissionContext {
        submission,
        classroom_teacher_id,
        collaborator_ids,
    })
}

/// Attaches classroom titles and collaborator summaries to submissions,
/// keeping their order.
pub(super) fn submission_responses(
    conn: &mut PgConnection,
    submissions: Vec<ProjectSubmission>,
) -> Result<Vec<SubmissionResponse>, AppError> {
    if submissions.is_empty() {
        return Ok(Vec::new());
    }
    let submission_ids: Vec<i64> = submissions.iter().map(|s| s.id).collect();
    let classroom_ids: Vec<i64> = submissions.iter().map(|s| s.classroom_id).collect();

    let titles: HashMap<i64, String> = classrooms::table
        .filter(classrooms::id.eq_any(&classroom_ids))
        .select((classrooms::id, classrooms::title))
        .load::<(i64, String)>(conn)?
        .into_iter()
        .collect();

    let mut collaborators: HashMap<i64, Vec<UserSummary>> = HashMap::new();
    let rows = submission_collaborators::table
        .inner_join(users::table)
        .filter(submission_collaborators::submission_id.eq_any(&submission_ids))
        .order((users::last_name.asc(), users::first_name.asc(), users::id.asc()))
        .select((submission_collaborators::submission_id, User::as_select()))
        .load::<(i64, User)>(conn)?;
    for (submission_id, user) in rows {
        collaborators
            .entry(submission_id)
            .or_default()
            .push(user.summary());
    }

    Ok(submissions
        .into_iter()
        .map(|submission| {
            let title = titles
                .get(&submission.classroom_id)
                .cloned()
                .unwrap_or_default();
            let members = collaborators.remove(&submission.id).unwrap_or_default();
            SubmissionResponse::new(submission, title, members)
        })
        .collect())
}

pub(super) fn submission_response(
    conn: &mut PgConnection,
    submission: ProjectSubmission,
) -> Result<SubmissionResponse, AppError> {
    let submission_id = submission.id;
    submission_responses(conn, vec![submission])?
        .pop()
        .ok_or_else(|| {
            AppError::from(DomainError::not_found(format!(
                "Submission with ID {} not found.",
                submission_id
            )))
        })
}

/// Counts over a scoped submission query. The query is rebuilt for every
/// count because boxed queries cannot be cloned.
pub(super) fn submission_stats<F>(
    conn: &mut PgConnection,
    scoped: F,
) -> Result<SubmissionStats, AppError>
where
    F: Fn() -> project_submissions::BoxedQuery<'static, Pg>,
{
    let total = scoped().count().get_result::<i64>(conn)?;
    let pending = scoped()
        .filter(project_submissions::status.eq(SubmissionStatus::Submitted))
        .filter(project_submissions::grade.is_null())
        .count()
        .get_result::<i64>(conn)?;
    let graded = scoped()
        .filter(project_submissions::grade.is_not_null())
        .count()
        .get_result::<i64>(conn)?;

    Ok(SubmissionStats {
        total,
        pending,
        graded,
    })
}

pub(super) fn student_counts(
    conn: &mut PgConnection,
    classroom_ids: &[i64],
) -> Result<HashMap<i64, i64>, AppError> {
    Ok(classroom_memberships::table
        .filter(classroom_memberships::classroom_id.eq_any(classroom_ids))
        .group_by(classroom_memberships::classroom_id)
        .select((classroom_memberships::classroom_id, count_star()))
        .load::<(i64, i64)>(conn)?
        .into_iter()
        .collect())
}

pub(super) fn submission_counts(
    conn: &mut PgConnection,
    classroom_ids: &[i64],
    status: SubmissionStatus,
) -> Result<HashMap<i64, i64>, AppError> {
    Ok(project_submissions::table
        .filter(project_submissions::classroom_id.eq_any(classroom_ids))
        .filter(project_submissions::status.eq(status))
        .group_by(project_submissions::classroom_id)
        .select((project_submissions::classroom_id, count_star()))
        .load::<(i64, i64)>(conn)?
        .into_iter()
        .collect())
}

/// Annotates classrooms with their teacher and member/submission counts. The
/// join code is only disclosed to the owner.
pub(super) fn classroom_summaries(
    conn: &mut PgConnection,
    actor: &Actor,
    classrooms: Vec<Classroom>,
) -> Result<Vec<ClassroomSummary>, AppError> {
    let ids: Vec<i64> = classrooms.iter().map(|c| c.id).collect();
    let teacher_ids: Vec<i64> = classrooms.iter().map(|c| c.teacher_id).collect();
    let teachers: HashMap<i64, UserSummary> = users::table
        .filter(users::id.eq_any(&teacher_ids))
        .select(User::as_select())
        .load::<User>(conn)?
        .into_iter()
        .map(|user| (user.id, user.summary()))
        .collect();
    let students = student_counts(conn, &ids)?;
    let submitted = submission_counts(conn, &ids, SubmissionStatus::Submitted)?;

    classrooms
        .into_iter()
        .map(|classroom| {
            let teacher = teachers.get(&classroom.teacher_id).cloned().ok_or_else(|| {
                AppError::from(DomainError::not_found(format!(
                    "User with ID {} not found.",
                    classroom.teacher_id
                )))
            })?;
            let is_owner = access::can_manage_classroom(actor, &classroom);
            Ok(ClassroomSummary {
                id: classroom.id,
                title: classroom.title,
                description: classroom.description,
                requirements_file: classroom.requirements_file,
                teacher,
                join_code: is_owner.then_some(classroom.join_code),
                student_count: students.get(&classroom.id).copied().unwrap_or(0),
                submission_count: submitted.get(&classroom.id).copied().unwrap_or(0),
                created_at: classroom.created_at,
            })
        })
        .collect()
}

pub(super) fn classroom_summary(
    conn: &mut PgConnection,
    actor: &Actor,
    classroom: Classroom,
) -> Result<ClassroomSummary, AppError> {
    let classroom_id = classroom.id;
    classroom_summaries(conn, actor, vec![classroom])?
        .pop()
        .ok_or_else(|| {
            AppError::from(DomainError::not_found(format!(
                "Classroom with ID {} not found.",
                classroom_id
            )))
        })
}

/// One page of the submissions an actor may list, newest first.
pub(super) fn submission_page(
    conn: &mut PgConnection,
    actor: &Actor,
    filter: &SubmissionFilter,
    pagination: Pagination,
) -> Result<Page<SubmissionResponse>, AppError> {
    let total = filter
        .apply(access::visible_submissions(actor))
        .count()
        .get_result::<i64>(conn)?;
    let submissions = filter
        .apply(access::visible_submissions(actor))
        .order((
            project_submissions::created_at.desc(),
            project_submissions::id.desc(),
        ))
        .limit(pagination.per_page())
        .offset(pagination.offset())
        .select(ProjectSubmission::as_select())
        .load(conn)?;

    let items = submission_responses(conn, submissions)?;
    Ok(pagination.into_page(items, total))
}
