use super::helper;
use crate::access;
use crate::actor::{Actor, Student, Teacher};
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::model::dashboard::{
    ClassroomOverview, DashboardResponse, MembershipOverview, StudentDashboard, TeacherDashboard,
};
use crate::model::submission::{ProjectSubmission, SubmissionStatus};
use crate::payloads::dashboard::DashboardParams;
use crate::response::ApiResponse;
use crate::schema::{classroom_memberships, classrooms, project_submissions};
use axum::extract::State;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::dsl::{avg, count_distinct};
use diesel::prelude::*;
use tracing::{info, instrument};

const RECENT_ITEMS: i64 = 5;

/// Role-aware landing data.
///
/// Query Parameters:
/// * `user_id`: The acting user.
///
/// Returns (wrapped in `ApiResponse`)
/// * `DashboardResponse`: Tagged with `role`; teachers get their most recent
///   classrooms with student and submission counts, students get their
///   memberships, recent submissions and grade summary (200 OK).
/// * `404 Not Found`: If the user does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_dashboard(
    State(pool): State<Pool>,
    AppQuery(params): AppQuery<DashboardParams>,
) -> Result<ApiResponse<DashboardResponse>, AppError> {
    info!("Building dashboard for user {}", params.user_id);

    let dashboard = helper::run_query(&pool, move |conn| {
        match helper::find_actor(conn, params.user_id)? {
            Actor::Teacher(teacher) => {
                teacher_dashboard(conn, teacher).map(DashboardResponse::Teacher)
            }
            Actor::Student(student) => {
                student_dashboard(conn, student).map(DashboardResponse::Student)
            }
        }
    })
    .await?;

    Ok(ApiResponse::ok(dashboard))
}

fn teacher_dashboard(
    conn: &mut PgConnection,
    teacher: Teacher,
) -> Result<TeacherDashboard, AppError> {
    let recent = classrooms::table
        .filter(classrooms::teacher_id.eq(teacher.id()))
        .order((classrooms::created_at.desc(), classrooms::id.desc()))
        .limit(RECENT_ITEMS)
        .select((classrooms::id, classrooms::title))
        .load::<(i64, String)>(conn)?;
    let ids: Vec<i64> = recent.iter().map(|(id, _)| *id).collect();

    let students = helper::student_counts(conn, &ids)?;
    let drafts = helper::submission_counts(conn, &ids, SubmissionStatus::Draft)?;
    let submitted = helper::submission_counts(conn, &ids, SubmissionStatus::Submitted)?;

    let total_classrooms = classrooms::table
        .filter(classrooms::teacher_id.eq(teacher.id()))
        .count()
        .get_result::<i64>(conn)?;
    let total_students = classroom_memberships::table
        .filter(
            classroom_memberships::classroom_id.eq_any(
                classrooms::table
                    .filter(classrooms::teacher_id.eq(teacher.id()))
                    .select(classrooms::id),
            ),
        )
        .select(count_distinct(classroom_memberships::student_id))
        .get_result::<i64>(conn)?;

    Ok(TeacherDashboard {
        classrooms: recent
            .into_iter()
            .map(|(id, title)| ClassroomOverview {
                id,
                title,
                student_count: students.get(&id).copied().unwrap_or(0),
                drafts_count: drafts.get(&id).copied().unwrap_or(0),
                submitted_count: submitted.get(&id).copied().unwrap_or(0),
            })
            .collect(),
        total_classrooms,
        total_students,
    })
}

fn student_dashboard(
    conn: &mut PgConnection,
    student: Student,
) -> Result<StudentDashboard, AppError> {
    let actor = Actor::Student(student);

    let memberships = classroom_memberships::table
        .inner_join(classrooms::table)
        .filter(classroom_memberships::student_id.eq(student.id()))
        .order((
            classroom_memberships::joined_at.desc(),
            classroom_memberships::id.desc(),
        ))
        .limit(RECENT_ITEMS)
        .select((
            classroom_memberships::classroom_id,
            classrooms::title,
            classroom_memberships::joined_at,
        ))
        .load::<(i64, String, DateTime<Utc>)>(conn)?
        .into_iter()
        .map(|(classroom_id, classroom_title, joined_at)| MembershipOverview {
            classroom_id,
            classroom_title,
            joined_at,
        })
        .collect();
    let total_classrooms = classroom_memberships::table
        .filter(classroom_memberships::student_id.eq(student.id()))
        .count()
        .get_result::<i64>(conn)?;

    let recent = access::visible_submissions(&actor)
        .order((
            project_submissions::created_at.desc(),
            project_submissions::id.desc(),
        ))
        .limit(RECENT_ITEMS)
        .select(ProjectSubmission::as_select())
        .load(conn)?;
    let submissions = helper::submission_responses(conn, recent)?;

    let draft_count = access::visible_submissions(&actor)
        .filter(project_submissions::status.eq(SubmissionStatus::Draft))
        .count()
        .get_result::<i64>(conn)?;
    let submitted_count = access::visible_submissions(&actor)
        .filter(project_submissions::status.eq(SubmissionStatus::Submitted))
        .count()
        .get_result::<i64>(conn)?;
    let graded_count = access::visible_submissions(&actor)
        .filter(project_submissions::grade.is_not_null())
        .count()
        .get_result::<i64>(conn)?;
    let average_grade = access::visible_submissions(&actor)
        .select(avg(project_submissions::grade))
        .get_result::<Option<BigDecimal>>(conn)?
        .and_then(|average| average.to_f64());

    Ok(StudentDashboard {
        memberships,
        total_classrooms,
        submissions,
        draft_count,
        submitted_count,
        graded_count,
        average_grade,
    })
}
