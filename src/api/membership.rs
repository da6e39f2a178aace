use super::classroom::owned_classroom;
use super::helper;
use crate::access;
use crate::actor::Actor;
use crate::errors::{AppError, DomainError};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::join_code;
use crate::model::classroom::{
    Classroom, ClassroomMembership, JoinClassroomResponse, MemberResponse, NewClassroomMembership,
};
use crate::model::user::User;
use crate::payloads::classroom::{ClassroomActionPayload, JoinClassroomPayload, ListMembersParams};
use crate::query::{DEFAULT_MEMBERS_PER_PAGE, Pagination};
use crate::response::{ApiResponse, Page};
use crate::schema::{classroom_memberships, classrooms, users};
use axum::extract::State;
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

const MEMBERSHIP_CONSTRAINT: &str = "unique_membership_per_classroom";

/// Joins the classroom matching a join code. The code is matched
/// case-insensitively.
///
/// Request Body: `JoinClassroomPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `JoinClassroomResponse`: The new membership (200 OK).
/// * `403 Forbidden`: If the acting user is a teacher, or owns the classroom.
/// * `404 Not Found`: If the user does not exist or no classroom has this code.
/// * `409 Conflict`: If the student already belongs to the classroom.
/// * `422 Unprocessable Entity`: If the code is not 8 letters or digits.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn join_classroom(
    State(pool): State<Pool>,
    AppJson(payload): AppJson<JoinClassroomPayload>,
) -> Result<ApiResponse<JoinClassroomResponse>, AppError> {
    info!("User {} attempting to join a classroom", payload.user_id);
    debug!("Join classroom payload: {:?}", payload);

    let code = join_code::normalize(&payload.join_code);
    let user_id = payload.user_id;

    let joined = helper::run_query(&pool, move |conn| {
        let student = helper::find_actor(conn, user_id)?.student()?;
        if !join_code::is_well_formed(&code) {
            return Err(DomainError::validation(
                "Join code must be exactly 8 letters or digits.",
            )
            .into());
        }

        let classroom = classrooms::table
            .filter(classrooms::join_code.eq(&code))
            .select(Classroom::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                AppError::from(DomainError::not_found(
                    "Invalid join code. Please check and try again.",
                ))
            })?;
        if classroom.teacher_id == student.id() {
            return Err(DomainError::SelfJoinForbidden.into());
        }

        let inserted = diesel::insert_into(classroom_memberships::table)
            .values(&NewClassroomMembership {
                classroom_id: classroom.id,
                student_id: student.id(),
            })
            .returning(classroom_memberships::id)
            .get_result::<i64>(conn);

        match inserted {
            Ok(membership_id) => Ok(JoinClassroomResponse {
                membership_id,
                classroom_id: classroom.id,
                classroom_title: classroom.title,
            }),
            Err(e) if helper::is_unique_violation(&e, MEMBERSHIP_CONSTRAINT) => {
                Err(DomainError::AlreadyMember.into())
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    info!(
        "Student {} joined classroom {} (membership {})",
        user_id, joined.classroom_id, joined.membership_id
    );
    let message = format!("You have successfully joined {}!", joined.classroom_title);
    Ok(ApiResponse::ok_with_message(joined, message))
}

/// Removes the acting student's own membership. Their submissions stay.
///
/// Request Body: `ClassroomActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true on success (200 OK).
/// * `403 Forbidden`: If the acting user is a teacher.
/// * `404 Not Found`: If the user or classroom does not exist, or the student is not a member.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn leave_classroom(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppJson(payload): AppJson<ClassroomActionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!(
        "User {} attempting to leave classroom {}",
        payload.user_id, classroom_id
    );

    let title = helper::run_transaction(&pool, move |conn| {
        let student = helper::find_actor(conn, payload.user_id)?.student()?;
        let classroom = helper::find_classroom(conn, classroom_id)?;

        let deleted = diesel::delete(
            classroom_memberships::table
                .filter(classroom_memberships::classroom_id.eq(classroom_id))
                .filter(classroom_memberships::student_id.eq(student.id())),
        )
        .execute(conn)?;
        if deleted == 0 {
            return Err(DomainError::not_found("You are not a member of this classroom.").into());
        }
        Ok(classroom.title)
    })
    .await?;

    info!("User {} left classroom {}", payload.user_id, classroom_id);
    Ok(ApiResponse::ok_with_message(
        true,
        format!("You have left {}.", title),
    ))
}

/// Lists the students of a classroom ordered by last then first name.
///
/// Query Parameters:
/// * `user_id`: The acting user; must own or belong to the classroom.
/// * `page`, `per_page` (optional): 1-based page, 20 per page by default.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Page<MemberResponse>` (200 OK).
/// * `403 Forbidden`: If the user neither owns nor belongs to the classroom.
/// * `404 Not Found`: If the user or classroom does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn list_members(
    State(pool): State<Pool>,
    AppPath(classroom_id): AppPath<i64>,
    AppQuery(params): AppQuery<ListMembersParams>,
) -> Result<ApiResponse<Page<MemberResponse>>, AppError> {
    info!(
        "Listing members of classroom {} for user {}",
        classroom_id, params.user_id
    );

    let pagination = Pagination::new(params.page, params.per_page, DEFAULT_MEMBERS_PER_PAGE);

    let page = helper::run_query(&pool, move |conn| {
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

        let total = classroom_memberships::table
            .filter(classroom_memberships::classroom_id.eq(classroom_id))
            .count()
            .get_result::<i64>(conn)?;
        let members = classroom_memberships::table
            .inner_join(users::table)
            .filter(classroom_memberships::classroom_id.eq(classroom_id))
            .order((
                users::last_name.asc(),
                users::first_name.asc(),
                users::id.asc(),
            ))
            .limit(pagination.per_page())
            .offset(pagination.offset())
            .select((ClassroomMembership::as_select(), User::as_select()))
            .load::<(ClassroomMembership, User)>(conn)?
            .into_iter()
            .map(|(membership, student)| MemberResponse {
                membership_id: membership.id,
                student: student.summary(),
                joined_at: membership.joined_at,
            })
            .collect();

        Ok(pagination.into_page(members, total))
    })
    .await?;

    Ok(ApiResponse::ok(page))
}

/// Removes a student from an owned classroom. Existing submissions and their
/// collaborator lists are left untouched.
///
/// Request Body: `ClassroomActionPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true on success (200 OK).
/// * `403 Forbidden`: If the acting user does not own the classroom.
/// * `404 Not Found`: If the user, classroom or membership does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn remove_member(
    State(pool): State<Pool>,
    AppPath((classroom_id, student_id)): AppPath<(i64, i64)>,
    AppJson(payload): AppJson<ClassroomActionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    info!(
        "User {} attempting to remove student {} from classroom {}",
        payload.user_id, student_id, classroom_id
    );

    let display_name = helper::run_transaction(&pool, move |conn| {
        let actor = helper::find_actor(conn, payload.user_id)?;
        owned_classroom(conn, &actor, classroom_id)?;

        let deleted = diesel::delete(
            classroom_memberships::table
                .filter(classroom_memberships::classroom_id.eq(classroom_id))
                .filter(classroom_memberships::student_id.eq(student_id)),
        )
        .execute(conn)?;
        if deleted == 0 {
            warn!(
                "Student {} is not a member of classroom {}",
                student_id, classroom_id
            );
            return Err(DomainError::not_found(format!(
                "Student with ID {} is not a member of this classroom.",
                student_id
            ))
            .into());
        }
        helper::find_user(conn, student_id).map(|user| user.display_name())
    })
    .await?;

    info!(
        "Student {} removed from classroom {}",
        student_id, classroom_id
    );
    Ok(ApiResponse::ok_with_message(
        true,
        format!("{} has been removed from the classroom.", display_name),
    ))
}
