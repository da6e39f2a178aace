use super::helper;
use crate::access;
use crate::actor::Actor;
use crate::errors::{AppError, DomainError};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::lifecycle::{self, Grade, SubmitOutcome};
use crate::model::submission::{
    GradeResponse, NewProjectSubmission, ProjectSubmission, SubmissionCollaborator,
    SubmissionContext, SubmissionDetailResponse, SubmissionResponse, SubmissionStatus,
    TeacherSubmissionListResponse,
};
use crate::payloads::submission::{
    CreateSubmissionPayload, GetSubmissionParams, GradeSubmissionPayload, ListSubmissionsParams,
    SubmissionActionPayload, UpdateSubmissionPayload,
};
use crate::query::{DEFAULT_SUBMISSIONS_PER_PAGE, Pagination};
use crate::response::{ApiResponse, Page};
use crate::schema::{project_submissions, submission_collaborators};
use axum::extract::State;
use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

const SUBMISSION_CONSTRAINT: &str = "unique_submission_per_student_per_classroom";

/// Edit and delete share one rule: a DRAFT, touched by one of its student
/// collaborators. Distinguishes a locked submission from a foreign one.
fn authorize_edit(actor: &Actor, ctx: &SubmissionContext) -> Result<(), DomainError> {
    match actor {
        Actor::Student(student) if ctx.is_collaborator(student.id()) => {
            lifecycle::ensure_editable(&ctx.submission)
        }
        _ => Err(DomainError::forbidden(
            "You can only modify project submissions you collaborate on.",
        )),
    }
}

fn replace_collaborators(
    conn: &mut PgConnection,
    submission_id: i64,
    user_ids: &[i64],
) -> Result<(), AppError> {
    diesel::delete(
        submission_collaborators::table
            .filter(submission_collaborators::submission_id.eq(submission_id)),
    )
    .execute(conn)?;
    let rows: Vec<SubmissionCollaborator> = user_ids
        .iter()
        .map(|&user_id| SubmissionCollaborator {
            submission_id,
            user_id,
        })
        .collect();
    diesel::insert_into(submission_collaborators::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

/// Creates the acting student's project in a classroom, starting as DRAFT.
///
/// Request Body: `CreateSubmissionPayload`. The creator is always added to
/// the collaborators; every other collaborator must be a student member.
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmissionResponse`: The new draft (200 OK).
/// * `403 Forbidden`: If the acting user is not a student member of the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `409 Conflict`: If the student already has a submission in this classroom.
/// * `422 Unprocessable Entity`: If a field or collaborator is invalid.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(pool, payload))]
pub async fn create_submission(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateSubmissionPayload>,
) -> Result<ApiResponse<SubmissionResponse>, AppError> {
    info!(
        "User {} attempting to create a submission in classroom {}",
        payload.user_id, classroom_id
    );
    debug!("Create submission payload: {:?}", payload);

    let response = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        helper::find_classroom(conn, classroom_id)?;
        let student = actor.student()?;
        if helper::find_membership(conn, classroom_id, student.id())?.is_none() {
            return Err(DomainError::forbidden(
                "You must be a member of this classroom to submit a project.",
            )
            .into());
        }
        let fields = payload.validate()?;
        let members = helper::classroom_student_ids(conn, classroom_id)?;
        let collaborators =
            lifecycle::collaborator_set(student.id(), &payload.collaborators, &members)?;

        let new_submission = NewProjectSubmission {
            classroom_id,
            created_by: student.id(),
            title: fields.title,
            description: fields.description,
            repository_url: fields.repository_url,
            deployed_url: fields.deployed_url,
            status: SubmissionStatus::Draft,
        };
        let submission = diesel::insert_into(project_submissions::table)
            .values(&new_submission)
            .returning(ProjectSubmission::as_returning())
            .get_result::<ProjectSubmission>(conn)
            .map_err(|e| {
                if helper::is_unique_violation(&e, SUBMISSION_CONSTRAINT) {
                    AppError::from(DomainError::DuplicateSubmission)
                } else {
                    AppError::from(e)
                }
            })?;

        replace_collaborators(conn, submission.id, &collaborators)?;
        helper::submission_response(conn, submission)
    })
    .await?;

    info!(
        "Submission {} created in classroom {} with {} collaborator(s)",
        response.id,
        classroom_id,
        response.collaborators.len()
    );
    Ok(ApiResponse::ok_with_message(
        response,
        "Project created as draft. You can edit it before submitting.",
    ))
}

/// Lists the submissions visible to the acting user.
///
/// Teachers see SUBMITTED projects of their own classrooms; students see
/// the projects they collaborate on.
///
/// Query Parameters:
/// * `user_id`: The acting user.
/// * `status` (optional): `DRAFT` (students only), `SUBMITTED` or `GRADED`.
/// * `grade_min`, `grade_max` (optional): Grade bounds within 1..=20.
/// * `classroom_id` (optional): Restrict to one classroom.
/// * `student` (optional): Case-insensitive match on a collaborator's name or username.
/// * `page`, `per_page` (optional): 1-based page, 20 per page by default.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Page<SubmissionResponse>` (200 OK).
/// * `404 Not Found`: If the user does not exist.
/// * `422 Unprocessable Entity`: If a filter is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn list_submissions(
    State(pool): State<Pool>,
    AppQuery(params): AppQuery<ListSubmissionsParams>,
) -> Result<ApiResponse<Page<SubmissionResponse>>, AppError> {
    info!("Listing submissions for user {}", params.user_id);
    debug!("List submissions params: {:?}", params);

    let pagination = Pagination::new(params.page, params.per_page, DEFAULT_SUBMISSIONS_PER_PAGE);

    let page = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;
        let filter = params.filter().validated_for(&actor)?;
        helper::submission_page(conn, &actor, &filter, pagination)
    })
    .await?;

    Ok(ApiResponse::ok(page))
}

/// Teacher variant of [`list_submissions`] with grading statistics over all
/// of the teacher's visible submissions.
///
/// Returns (wrapped in `ApiResponse`)
/// * `TeacherSubmissionListResponse` (200 OK).
/// * `403 Forbidden`: If the acting user is not a teacher.
/// * `404 Not Found`: If the user does not exist.
/// * `422 Unprocessable Entity`: If a filter is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn list_teacher_submissions(
    State(pool): State<Pool>,
    AppQuery(params): AppQuery<ListSubmissionsParams>,
) -> Result<ApiResponse<TeacherSubmissionListResponse>, AppError> {
    info!("Listing teacher submissions for user {}", params.user_id);
    debug!("Teacher submissions params: {:?}", params);

    let pagination = Pagination::new(params.page, params.per_page, DEFAULT_SUBMISSIONS_PER_PAGE);

    let response = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;
        actor.teacher()?;
        let filter = params.filter().validated_for(&actor)?;

        let submissions = helper::submission_page(conn, &actor, &filter, pagination)?;
        let stats = helper::submission_stats(conn, || access::visible_submissions(&actor))?;
        Ok(TeacherSubmissionListResponse { submissions, stats })
    })
    .await?;

    Ok(ApiResponse::ok(response))
}

/// Retrieves one submission with the acting user's permissions on it.
///
/// The owning teacher may open a draft directly even though listings never
/// show drafts to teachers.
///
/// Query Parameters:
/// * `user_id`: The acting user.
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmissionDetailResponse` (200 OK).
/// * `403 Forbidden`: If the user is neither a collaborator nor the owning teacher.
/// * `404 Not Found`: If the user or submission does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_submission(
    State(pool): State<Pool>,
    AppPath(submission_id): AppPath<i64>,
    AppQuery(params): AppQuery<GetSubmissionParams>,
) -> Result<ApiResponse<SubmissionDetailResponse>, AppError> {
    info!(
        "Fetching submission {} for user {}",
        submission_id, params.user_id
    );

    let detail = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;
        let ctx = helper::load_submission_context(conn, submission_id)?;
        if !access::can_view_submission(&actor, &ctx) {
            return Err(DomainError::forbidden(
                "You do not have permission to view this submission.",
            )
            .into());
        }

        let can_edit = access::can_edit_submission(&actor, &ctx);
        let can_grade = access::can_grade_submission(&actor, &ctx);
        let is_collaborator = ctx.is_collaborator(actor.id());
        let submission = helper::submission_response(conn, ctx.submission)?;
        Ok(SubmissionDetailResponse {
            submission,
            can_edit,
            can_grade,
            is_collaborator,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}

/// Edits a draft. Absent fields stay unchanged; when collaborators are given
/// they replace the current set, with the creator always kept.
///
/// Request Body: `UpdateSubmissionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmissionResponse`: The updated draft (200 OK).
/// * `403 Forbidden`: If the acting user is not a collaborator.
/// * `404 Not Found`: If the user or submission does not exist.
/// * `409 Conflict`: If the submission is no longer a draft.
/// * `422 Unprocessable Entity`: If a field or collaborator is invalid.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(pool, payload))]
pub async fn update_submission(
    State(pool): State<Pool>,
    AppPath(submission_id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateSubmissionPayload>,
) -> Result<ApiResponse<SubmissionResponse>, AppError> {
    info!(
        "User {} attempting to update submission {}",
        payload.user_id, submission_id
    );
    debug!("Update submission payload: {:?}", payload);

    let response = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        let ctx = helper::load_submission_context(conn, submission_id)?;
        authorize_edit(&actor, &ctx)?;
        let changeset = payload.changeset()?;

        let collaborators = match &payload.collaborators {
            Some(requested) => {
                let members = helper::classroom_student_ids(conn, ctx.submission.classroom_id)?;
                Some(lifecycle::collaborator_set(
                    ctx.submission.created_by,
                    requested,
                    &members,
                )?)
            }
            None => None,
        };

        // a concurrent submit makes this match no row
        let updated = diesel::update(
            project_submissions::table
                .filter(project_submissions::id.eq(submission_id))
                .filter(project_submissions::status.eq(SubmissionStatus::Draft)),
        )
        .set(&changeset)
        .returning(ProjectSubmission::as_returning())
        .get_result::<ProjectSubmission>(conn)
        .optional()?
        .ok_or_else(|| AppError::from(DomainError::NotEditable))?;

        if let Some(collaborators) = collaborators {
            replace_collaborators(conn, submission_id, &collaborators)?;
        }
        helper::submission_response(conn, updated)
    })
    .await?;

    info!("Submission {} updated", submission_id);
    Ok(ApiResponse::ok_with_message(
        response,
        "Project updated successfully!",
    ))
}

/// Deletes a draft.
///
/// Request Body: `SubmissionActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true on success (200 OK).
/// * `403 Forbidden`: If the acting user is not a collaborator.
/// * `404 Not Found`: If the user or submission does not exist.
/// * `409 Conflict`: If the submission is no longer a draft.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn delete_submission(
    State(pool): State<Pool>,
    AppPath(submission_id): AppPath<i64>,
    AppJson(payload): AppJson<SubmissionActionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!(
        "User {} attempting to delete submission {}",
        payload.user_id, submission_id
    );

    helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        let ctx = helper::load_submission_context(conn, submission_id)?;
        authorize_edit(&actor, &ctx)?;

        let deleted = diesel::delete(
            project_submissions::table
                .filter(project_submissions::id.eq(submission_id))
                .filter(project_submissions::status.eq(SubmissionStatus::Draft)),
        )
        .execute(conn)?;
        if deleted == 0 {
            return Err(DomainError::NotEditable.into());
        }
        Ok(())
    })
    .await?;

    info!("Submission {} deleted", submission_id);
    Ok(ApiResponse::ok_with_message(
        true,
        "Project deleted successfully.",
    ))
}

/// Submits a draft for grading. Submitting is one-way.
///
/// Request Body: `SubmissionActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true when the draft was submitted, false when it had already
///   been submitted (200 OK in both cases).
/// * `403 Forbidden`: If the acting user is not a collaborator.
/// * `404 Not Found`: If the user or submission does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn submit_submission(
    State(pool): State<Pool>,
    AppPath(submission_id): AppPath<i64>,
    AppJson(payload): AppJson<SubmissionActionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!(
        "User {} attempting to submit submission {}",
        payload.user_id, submission_id
    );

    let submitted = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        let ctx = helper::load_submission_context(conn, submission_id)?;
        let is_collaborator = matches!(actor, Actor::Student(s) if ctx.is_collaborator(s.id()));
        if !is_collaborator {
            return Err(DomainError::forbidden(
                "Only collaborators can submit this project.",
            )
            .into());
        }

        match lifecycle::submit(ctx.submission.status, Utc::now()) {
            SubmitOutcome::Submitted { submitted_at } => {
                let updated = diesel::update(
                    project_submissions::table
                        .filter(project_submissions::id.eq(submission_id))
                        .filter(project_submissions::status.eq(SubmissionStatus::Draft)),
                )
                .set((
                    project_submissions::status.eq(SubmissionStatus::Submitted),
                    project_submissions::submitted_at.eq(Some(submitted_at)),
                    project_submissions::updated_at.eq(submitted_at),
                ))
                .execute(conn)?;
                Ok(updated == 1)
            }
            SubmitOutcome::AlreadySubmitted => Ok(false),
        }
    })
    .await?;

    if submitted {
        info!("Submission {} submitted", submission_id);
        Ok(ApiResponse::ok_with_message(
            true,
            "Project submitted successfully! Your teacher can now review it.",
        ))
    } else {
        warn!("Submission {} was already submitted", submission_id);
        Ok(ApiResponse::ok_with_message(
            false,
            "This project has already been submitted.",
        ))
    }
}

/// Grades a submitted project of an owned classroom. Re-grading overwrites
/// the previous grade and notes.
///
/// Request Body: `GradeSubmissionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `GradeResponse` (200 OK).
/// * `403 Forbidden`: If the acting user is not the classroom's teacher.
/// * `404 Not Found`: If the user or submission does not exist.
/// * `409 Conflict`: If the submission is still a draft.
/// * `422 Unprocessable Entity`: If the grade is outside 1..=20.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn grade_submission(
    State(pool): State<Pool>,
    AppPath(submission_id): AppPath<i64>,
    AppJson(payload): AppJson<GradeSubmissionPayload>,
) -> Result<ApiResponse<GradeResponse>, AppError> {
    info!(
        "User {} attempting to grade submission {} with {}",
        payload.user_id, submission_id, payload.grade
    );
    debug!("Grade submission payload: {:?}", payload);

    let graded = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        let teacher = actor.teacher()?;
        let ctx = helper::load_submission_context(conn, submission_id)?;
        if teacher.id() != ctx.classroom_teacher_id {
            return Err(DomainError::forbidden(
                "You can only grade submissions in your own classrooms.",
            )
            .into());
        }
        let grade = Grade::new(payload.grade)?;
        lifecycle::ensure_gradable(&ctx.submission)?;

        diesel::update(
            project_submissions::table
                .filter(project_submissions::id.eq(submission_id))
                .filter(project_submissions::status.eq(SubmissionStatus::Submitted)),
        )
        .set((
            project_submissions::grade.eq(Some(grade.value())),
            project_submissions::teacher_notes.eq(payload.teacher_notes.trim()),
            project_submissions::updated_at.eq(Utc::now()),
        ))
        .returning((
            project_submissions::id,
            project_submissions::grade,
            project_submissions::teacher_notes,
        ))
        .get_result::<(i64, Option<i16>, String)>(conn)
        .optional()?
        .ok_or_else(|| AppError::from(DomainError::NotSubmitted))
    })
    .await?;

    let (submission_id, grade, teacher_notes) = graded;
    info!("Submission {} graded with {:?}", submission_id, grade);
    Ok(ApiResponse::ok_with_message(
        GradeResponse {
            submission_id,
            grade: grade.unwrap_or_default(),
            teacher_notes,
        },
        "Grade saved successfully!",
    ))
}
