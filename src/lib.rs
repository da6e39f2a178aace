use crate::cli::Args;
use anyhow::{Context, anyhow};
use axum::Router;
use axum::routing::{get, post};
use axum_keycloak_auth::PassthroughMode;
use axum_keycloak_auth::instance::{KeycloakAuthInstance, KeycloakConfig};
use axum_keycloak_auth::layer::KeycloakAuthLayer;
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

pub mod access;
pub mod actor;
pub mod cli;
pub mod errors;
pub mod extract;
pub mod join_code;
pub mod lifecycle;
pub mod model;
pub mod payloads;
pub mod query;
pub mod response;
pub mod schema;
pub mod validation;

mod api;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub async fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    if args.run_migrations {
        info!("Applying pending database migrations...");
        run_migrations(&pool)
            .await
            .context("Failed to apply database migrations")?;
    }

    info!("Initializing Keycloak authentication layer...");
    let keycloak_layer =
        init_protection_layer(args).context("Failed to initialize Keycloak layer")?;

    info!("Initializing router...");
    Ok(init_router_internal(pool, keycloak_layer))
}

/// Router without the authentication layer, for integration tests.
pub fn init_test_router(pool: Pool) -> Router {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/classrooms", classroom_routes())
        .nest("/submissions", submission_routes())
        .with_state(pool)
}

/// Applies every embedded migration not yet recorded in the database.
pub async fn run_migrations(pool: &Pool) -> anyhow::Result<()> {
    let conn = pool
        .get()
        .await
        .map_err(|e| anyhow!("Failed to get a connection for migrations: {}", e))?;
    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| anyhow!("Failed to run migrations: {}", e))
        })
        .await
        .map_err(|e| anyhow!("Migration task failed: {}", e))??;
    info!("Applied {} migration(s)", applied);
    Ok(())
}

fn init_router_internal(pool: Pool, keycloak_layer: KeycloakAuthLayer<String>) -> Router {
    let auth_api = auth_routes().layer(keycloak_layer.clone());
    let dashboard_api = dashboard_routes().layer(keycloak_layer.clone());
    let classroom_api = classroom_routes().layer(keycloak_layer.clone());
    let submission_api = submission_routes().layer(keycloak_layer);

    Router::new()
        .nest("/auth", auth_api)
        .nest("/dashboard", dashboard_api)
        .nest("/classrooms", classroom_api)
        .nest("/submissions", submission_api)
        .with_state(pool)
}

fn init_pool(conn_str: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(conn_str, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn init_protection_layer(args: &Args) -> anyhow::Result<KeycloakAuthLayer<String>> {
    let config = KeycloakConfig::builder()
        .server(args.keycloak_server_url.clone())
        .realm(args.keycloak_realm.clone())
        .build();

    let instance = KeycloakAuthInstance::new(config);

    let layer = KeycloakAuthLayer::builder()
        .instance(instance)
        .passthrough_mode(PassthroughMode::Block)
        .persist_raw_claims(false)
        .expected_audiences(vec![args.keycloak_audiences.clone()])
        .build();

    Ok(layer)
}

fn auth_routes() -> Router<Pool> {
    Router::new().route("/register", post(api::auth::register))
}

fn dashboard_routes() -> Router<Pool> {
    Router::new().route("/", get(api::dashboard::get_dashboard))
}

fn classroom_routes() -> Router<Pool> {
    Router::new()
        .route("/", get(api::classroom::list_classrooms))
        .route("/create", post(api::classroom::create_classroom))
        .route("/join", post(api::membership::join_classroom))
        .route("/{classroom_id}", get(api::classroom::get_classroom))
        .route(
            "/{classroom_id}/update",
            post(api::classroom::update_classroom),
        )
        .route(
            "/{classroom_id}/delete",
            post(api::classroom::delete_classroom),
        )
        .route(
            "/{classroom_id}/leave",
            post(api::membership::leave_classroom),
        )
        .route(
            "/{classroom_id}/regenerate_code",
            post(api::classroom::regenerate_join_code),
        )
        .route(
            "/{classroom_id}/members",
            get(api::membership::list_members),
        )
        .route(
            "/{classroom_id}/members/{student_id}/remove",
            post(api::membership::remove_member),
        )
        .route(
            "/{classroom_id}/submissions",
            get(api::classroom::list_classroom_submissions),
        )
        .route(
            "/{classroom_id}/submit",
            post(api::submission::create_submission),
        )
}

fn submission_routes() -> Router<Pool> {
    Router::new()
        .route("/", get(api::submission::list_submissions))
        .route(
            "/teacher",
            get(api::submission::list_teacher_submissions),
        )
        .route("/{submission_id}", get(api::submission::get_submission))
        .route(
            "/{submission_id}/update",
            post(api::submission::update_submission),
        )
        .route(
            "/{submission_id}/delete",
            post(api::submission::delete_submission),
        )
        .route(
            "/{submission_id}/submit",
            post(api::submission::submit_submission),
        )
        .route(
            "/{submission_id}/grade",
            post(api::submission::grade_submission),
        )
}
