use super::helper;
use crate::access;
use crate::actor::Actor;
use crate::errors::{AppError, DomainError};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::join_code;
use crate::model::classroom::{
    Classroom, ClassroomDetailResponse, ClassroomMembership, ClassroomSummary,
    CreatedClassroomResponse, JoinCodeResponse, MemberResponse, NewClassroom,
};
use crate::model::submission::{ClassroomSubmissionListResponse, ProjectSubmission, SubmissionStatus};
use crate::model::user::User;
use crate::payloads::classroom::{
    ClassroomActionPayload, ClassroomFields, ClassroomSubmissionsParams, CreateClassroomPayload,
    GetClassroomParams, ListClassroomsParams, UpdateClassroomPayload,
};
use crate::query::{
    ClassroomFilter, DEFAULT_CLASSROOMS_PER_PAGE, DEFAULT_SUBMISSIONS_PER_PAGE, Pagination,
};
use crate::response::{ApiResponse, Page};
use crate::schema::{classroom_memberships, classrooms, project_submissions, users};
use anyhow::anyhow;
use axum::extract::State;
use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

pub(super) const JOIN_CODE_CONSTRAINT: &str = "classrooms_join_code_unique";
const DETAIL_PREVIEW_SIZE: i64 = 10;

fn manage_denied() -> DomainError {
    DomainError::forbidden("You can only manage your own classrooms.")
}

/// Loads a classroom the actor owns, failing with `NotFound` or `Forbidden`.
pub(super) fn owned_classroom(
    conn: &mut PgConnection,
    actor: &Actor,
    classroom_id: i64,
) -> Result<Classroom, AppError> {
    actor.teacher()?;
    let classroom = helper::find_classroom(conn, classroom_id)?;
    if !access::can_manage_classroom(actor, &classroom) {
        return Err(manage_denied().into());
    }
    Ok(classroom)
}

/// Inserts a classroom with a fresh join code, drawing a new code whenever
/// the unique constraint reports a collision. Runs outside a transaction: a
/// failed statement would abort it.
fn insert_with_fresh_code(
    conn: &mut PgConnection,
    teacher_id: i64,
    fields: ClassroomFields,
) -> Result<Classroom, AppError> {
    for attempt in 1..=join_code::MAX_GENERATION_ATTEMPTS {
        let new_classroom = NewClassroom {
            title: fields.title.clone(),
            description: fields.description.clone(),
            requirements_file: fields.requirements_file.clone(),
            join_code: join_code::generate(),
            teacher_id,
        };
        match diesel::insert_into(classrooms::table)
            .values(&new_classroom)
            .returning(Classroom::as_returning())
            .get_result::<Classroom>(conn)
        {
            Ok(classroom) => return Ok(classroom),
            Err(e) if helper::is_unique_violation(&e, JOIN_CODE_CONSTRAINT) => {
                warn!(
                    "Join code {} already taken (attempt {}), drawing another",
                    new_classroom.join_code, attempt
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::InternalServerError(anyhow!(
        "Could not generate a unique join code after {} attempts",
        join_code::MAX_GENERATION_ATTEMPTS
    )))
}

/// Lists the classrooms visible to the acting user: owned ones for teachers,
/// joined ones for students. Newest first.
///
/// Query Parameters:
/// * `user_id`: The acting user.
/// * `search` (optional): Case-insensitive match on title, description or teacher name.
/// * `page`, `per_page` (optional): 1-based page, 12 per page by default.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Page<ClassroomSummary>` (200 OK). The join code is only set for the owner.
/// * `404 Not Found`: If the user does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn list_classrooms(
    State(pool): State<Pool>,
    AppQuery(params): AppQuery<ListClassroomsParams>,
) -> Result<ApiResponse<Page<ClassroomSummary>>, AppError> {
    info!("Listing classrooms for user {}", params.user_id);
    debug!("List classrooms params: {:?}", params);

    let pagination = Pagination::new(params.page, params.per_page, DEFAULT_CLASSROOMS_PER_PAGE);
    let filter = ClassroomFilter::new(params.search);

    let page = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;

        let total = filter
            .apply(access::visible_classrooms(&actor))
            .count()
            .get_result::<i64>(conn)?;
        let rows = filter
            .apply(access::visible_classrooms(&actor))
            .order((classrooms::created_at.desc(), classrooms::id.desc()))
            .limit(pagination.per_page())
            .offset(pagination.offset())
            .select(Classroom::as_select())
            .load::<Classroom>(conn)?;

        let items = helper::classroom_summaries(conn, &actor, rows)?;
        Ok(pagination.into_page(items, total))
    })
    .await?;

    info!(
        "Returning {} of {} classrooms for user {}",
        page.items.len(),
        page.total,
        params.user_id
    );
    Ok(ApiResponse::ok(page))
}

/// Retrieves a classroom with its members and submissions.
///
/// Owners see the 10 most recent SUBMITTED projects; members see their own
/// project, if any.
///
/// Query Parameters:
/// * `user_id`: The acting user.
///
/// Returns (wrapped in `ApiResponse`)
/// * `ClassroomDetailResponse` (200 OK).
/// * `403 Forbidden`: If the user neither owns nor belongs to the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_classroom(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppQuery(params): AppQuery<GetClassroomParams>,
) -> Result<ApiResponse<ClassroomDetailResponse>, AppError> {
    info!(
        "Fetching classroom {} for user {}",
        classroom_id, params.user_id
    );

    let detail = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;
        let classroom = helper::find_classroom(conn, classroom_id)?;
        let membership = match actor {
            Actor::Student(student) => helper::find_membership(conn, classroom_id, student.id())?,
            Actor::Teacher(_) => None,
        };
        if !access::can_view_classroom(&actor, &classroom, membership.as_ref()) {
            return Err(DomainError::forbidden(
                "You do not have permission to view this classroom.",
            )
            .into());
        }
        let is_owner = access::can_manage_classroom(&actor, &classroom);

        let member_count = classroom_memberships::table
            .filter(classroom_memberships::classroom_id.eq(classroom_id))
            .count()
            .get_result::<i64>(conn)?;
        let members = classroom_memberships::table
            .inner_join(users::table)
            .filter(classroom_memberships::classroom_id.eq(classroom_id))
            .order((users::last_name.asc(), users::first_name.asc()))
            .limit(DETAIL_PREVIEW_SIZE)
            .select((ClassroomMembership::as_select(), User::as_select()))
            .load::<(ClassroomMembership, User)>(conn)?
            .into_iter()
            .map(|(membership, student)| MemberResponse {
                membership_id: membership.id,
                student: student.summary(),
                joined_at: membership.joined_at,
            })
            .collect();

        let (submissions, my_submission) = if is_owner {
            let recent = project_submissions::table
                .filter(project_submissions::classroom_id.eq(classroom_id))
                .filter(project_submissions::status.eq(SubmissionStatus::Submitted))
                .order((
                    project_submissions::submitted_at.desc(),
                    project_submissions::id.desc(),
                ))
                .limit(DETAIL_PREVIEW_SIZE)
                .select(ProjectSubmission::as_select())
                .load(conn)?;
            (helper::submission_responses(conn, recent)?, None)
        } else {
            // a student may collaborate on several projects; their own comes first
            let own = access::visible_submissions(&actor)
                .filter(project_submissions::classroom_id.eq(classroom_id))
                .order((
                    project_submissions::created_by.eq(actor.id()).desc(),
                    project_submissions::id.asc(),
                ))
                .select(ProjectSubmission::as_select())
                .first(conn)
                .optional()?;
            let own = match own {
                Some(submission) => Some(helper::submission_response(conn, submission)?),
                None => None,
            };
            (Vec::new(), own)
        };

        let summary = helper::classroom_summary(conn, &actor, classroom)?;
        Ok(ClassroomDetailResponse {
            classroom: summary,
            is_owner,
            is_member: membership.is_some(),
            member_count,
            members,
            submissions,
            my_submission,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}

/// Creates a classroom owned by the acting teacher, with a fresh join code.
///
/// Request Body: `CreateClassroomPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `CreatedClassroomResponse`: The new classroom id and its join code (200 OK).
/// * `403 Forbidden`: If the acting user is not a teacher.
/// * `404 Not Found`: If the user does not exist.
/// * `422 Unprocessable Entity`: If a field is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn create_classroom(
    State(pool): State<Pool>,
    AppJson(payload): AppJson<CreateClassroomPayload>,
) -> Result<ApiResponse<CreatedClassroomResponse>, AppError> {
    info!(
        "Attempting to create classroom '{}' by user {}",
        payload.title, payload.user_id
    );
    debug!("Create classroom payload: {:?}", payload);

    let user_id = payload.user_id;
    let fields = payload.validate()?;

    let classroom = helper::run_query(&pool, move |conn| {
        let teacher = helper::find_actor(conn, user_id)?.teacher()?;
        insert_with_fresh_code(conn, teacher.id(), fields)
    })
    .await?;

    info!(
        "Classroom {} created by teacher {} with join code {}",
        classroom.id, classroom.teacher_id, classroom.join_code
    );
    Ok(ApiResponse::ok_with_message(
        CreatedClassroomResponse {
            classroom_id: classroom.id,
            join_code: classroom.join_code,
        },
        format!("Classroom \"{}\" created successfully!", classroom.title),
    ))
}

/// Updates the title, description or requirements file of an owned classroom.
///
/// Request Body: `UpdateClassroomPayload` (absent fields stay unchanged)
///
/// Returns (wrapped in `ApiResponse`)
/// * `ClassroomSummary`: The updated classroom (200 OK).
/// * `403 Forbidden`: If the acting user does not own the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `422 Unprocessable Entity`: If a field is invalid or nothing changes.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn update_classroom(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateClassroomPayload>,
) -> Result<ApiResponse<ClassroomSummary>, AppError> {
    info!(
        "Attempting to update classroom {} by user {}",
        classroom_id, payload.user_id
    );
    debug!("Update classroom payload: {:?}", payload);

    let summary = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        owned_classroom(conn, &actor, classroom_id)?;
        let changeset = payload.changeset()?;

        let updated = diesel::update(classrooms::table.find(classroom_id))
            .set(&changeset)
            .returning(Classroom::as_returning())
            .get_result::<Classroom>(conn)?;
        helper::classroom_summary(conn, &actor, updated)
    })
    .await?;

    info!("Classroom {} updated", classroom_id);
    Ok(ApiResponse::ok_with_message(
        summary,
        "Classroom updated successfully!",
    ))
}

/// Deletes an owned classroom together with its memberships and submissions.
///
/// Request Body: `ClassroomActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true on success (200 OK).
/// * `403 Forbidden`: If the acting user does not own the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn delete_classroom(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppJson(payload): AppJson<ClassroomActionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!(
        "Attempting to delete classroom {} by user {}",
        classroom_id, payload.user_id
    );

    let title = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        let classroom = owned_classroom(conn, &actor, classroom_id)?;
        diesel::delete(classrooms::table.find(classroom_id)).execute(conn)?;
        Ok(classroom.title)
    })
    .await?;

    info!("Classroom {} ('{}') deleted", classroom_id, title);
    Ok(ApiResponse::ok_with_message(
        true,
        format!("Classroom \"{}\" deleted successfully.", title),
    ))
}

/// Replaces the join code of an owned classroom. The previous code stops
/// working immediately.
///
/// Request Body: `ClassroomActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `JoinCodeResponse`: The new code (200 OK).
/// * `403 Forbidden`: If the acting user does not own the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn regenerate_join_code(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppJson(payload): AppJson<ClassroomActionPayload>,
) -> Result<ApiResponse<JoinCodeResponse>, AppError> {
    info!(
        "Attempting to regenerate join code of classroom {} by user {}",
        classroom_id, payload.user_id
    );

    let code = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        owned_classroom(conn, &actor, classroom_id)?;

        for attempt in 1..=join_code::MAX_GENERATION_ATTEMPTS {
            let candidate = join_code::generate();
            let updated = diesel::update(classrooms::table.find(classroom_id))
                .set((
                    classrooms::join_code.eq(&candidate),
                    classrooms::updated_at.eq(Utc::now()),
                ))
                .execute(conn);
            match updated {
                Ok(_) => return Ok(candidate),
                Err(e) if helper::is_unique_violation(&e, JOIN_CODE_CONSTRAINT) => {
                    warn!(
                        "Join code {} already taken (attempt {}), drawing another",
                        candidate, attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::InternalServerError(anyhow!(
            "Could not generate a unique join code after {} attempts",
            join_code::MAX_GENERATION_ATTEMPTS
        )))
    })
    .await?;

    info!("Classroom {} has a new join code", classroom_id);
    Ok(ApiResponse::ok_with_message(
        JoinCodeResponse { join_code: code },
        "New join code generated successfully!",
    ))
}

/// Lists the SUBMITTED projects of an owned classroom with grading statistics.
///
/// Query Parameters:
/// * `user_id`: The acting teacher.
/// * `status` (optional): `SUBMITTED` or `GRADED`.
/// * `grade_min`, `grade_max` (optional): Grade bounds within 1..=20.
/// * `student` (optional): Case-insensitive match on a collaborator's name or username.
/// * `page`, `per_page` (optional): 1-based page, 20 per page by default.
///
/// Returns (wrapped in `ApiResponse`)
/// * `ClassroomSubmissionListResponse` (200 OK).
/// * `403 Forbidden`: If the acting user does not own the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `422 Unprocessable Entity`: If a filter is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn list_classroom_submissions(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppQuery(params): AppQuery<ClassroomSubmissionsParams>,
) -> Result<ApiResponse<ClassroomSubmissionListResponse>, AppError> {
    info!(
        "Listing submissions of classroom {} for user {}",
        classroom_id, params.user_id
    );
    debug!("Classroom submissions params: {:?}", params);

    let pagination = Pagination::new(params.page, params.per_page, DEFAULT_SUBMISSIONS_PER_PAGE);

    let response = helper::run_query(&pool, move |conn| {
        let actor = helper::find_actor(conn, params.user_id)?;
        let classroom = owned_classroom(conn, &actor, classroom_id)?;
        let filter = params.filter(classroom_id).validated_for(&actor)?;

        let submissions = helper::submission_page(conn, &actor, &filter, pagination)?;
        let stats = helper::submission_stats(conn, || {
            access::visible_submissions(&actor)
                .filter(project_submissions::classroom_id.eq(classroom_id))
        })?;

        Ok(ClassroomSubmissionListResponse {
            classroom_id,
            classroom_title: classroom.title,
            submissions,
            stats,
        })
    })
    .await?;

    Ok(ApiResponse::ok(response))
}
