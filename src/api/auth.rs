use super::helper;
use crate::errors::{AppError, DomainError};
use crate::extract::AppJson;
use crate::model::user::RegisteredUserResponse;
use crate::payloads::auth::RegisterPayload;
use crate::response::ApiResponse;
use crate::schema::users;
use axum::extract::State;
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

const EMAIL_CONSTRAINT: &str = "users_email_unique";
const USERNAME_CONSTRAINT: &str = "users_username_unique";

/// Registers the local profile of an authenticated user.
///
/// The role is chosen once here (`is_teacher`, student by default) and never
/// changes afterwards.
///
/// Request Body: `RegisterPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `RegisteredUserResponse`: The new user's id, username and role (200 OK).
/// * `422 Unprocessable Entity`: If a field is invalid, or the username or email is taken.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn register(
    State(pool): State<Pool>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<ApiResponse<RegisteredUserResponse>, AppError> {
    info!("Attempting to register user '{}'", payload.username);
    debug!("Register payload: {:?}", payload);

    let new_user = payload.validate()?;

    let registered = helper::run_query(&pool, move |conn| {
        let inserted = diesel::insert_into(users::table)
            .values(&new_user)
            .returning((users::id, users::username, users::is_teacher))
            .get_result::<(i64, String, bool)>(conn);

        match inserted {
            Ok((user_id, username, is_teacher)) => Ok(RegisteredUserResponse {
                user_id,
                username,
                is_teacher,
            }),
            Err(e) if helper::is_unique_violation(&e, EMAIL_CONSTRAINT) => Err(
                DomainError::validation("A user with this email already exists.").into(),
            ),
            Err(e) if helper::is_unique_violation(&e, USERNAME_CONSTRAINT) => Err(
                DomainError::validation("A user with that username already exists.").into(),
            ),
            Err(e) => Err(e.into()),
        }
    })
    .await
    .inspect_err(|e| warn!("Registration failed: {}", e))?;

    info!(
        "Registered user {} ('{}') as {}",
        registered.user_id,
        registered.username,
        if registered.is_teacher { "teacher" } else { "student" }
    );
    Ok(ApiResponse::ok(registered))
}
