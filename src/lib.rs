use crate::cli::Args;
use crate::progress::ProgressionRules;
use crate::store::{ContentStore, PgStore, SnapshotCache};
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use axum_keycloak_auth::PassthroughMode;
use axum_keycloak_auth::instance::{KeycloakAuthInstance, KeycloakConfig};
use axum_keycloak_auth::layer::KeycloakAuthLayer;
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use std::sync::Arc;
use tracing::info;

pub mod cli;
pub mod model;
pub mod payloads;
pub mod progress;
pub mod response;
pub mod schema;
pub mod store;

mod api;
mod errors;

/// Shared by every handler. The store is the source of truth; the snapshot
/// cache only answers when the store cannot.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub snapshots: Arc<SnapshotCache>,
    pub rules: ProgressionRules,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, rules: ProgressionRules) -> Self {
        AppState {
            store,
            snapshots: Arc::new(SnapshotCache::new()),
            rules,
        }
    }
}

pub fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing Keycloak authentication layer...");
    let keycloak_layer =
        init_protection_layer(args).context("Failed to initialize Keycloak layer")?;

    info!(
        "Initializing router ({} XP per lesson, {} XP per level)...",
        args.xp_per_lesson, args.xp_per_level
    );
    let state = AppState::new(Arc::new(PgStore::new(pool)), args.rules());
    Ok(init_router_internal(state, keycloak_layer))
}

/// Router without the authentication layer, over any store.
pub fn init_test_router(store: Arc<dyn ContentStore>, rules: ProgressionRules) -> Router {
    Router::new()
        .nest("/student", student_routes())
        .nest("/coordinator", coordinator_routes())
        .with_state(AppState::new(store, rules))
}

fn init_router_internal(state: AppState, keycloak_layer: KeycloakAuthLayer<String>) -> Router {
    let student_api = student_routes().layer(keycloak_layer.clone());
    let coordinator_api = coordinator_routes().layer(keycloak_layer);

    Router::new()
        .nest("/student", student_api)
        .nest("/coordinator", coordinator_api)
        .with_state(state)
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

fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/get_course_outline", get(api::student::get_course_outline))
        .route("/get_lesson", get(api::student::get_lesson))
        .route("/navigate", post(api::student::navigate))
        .route("/next_lesson", post(api::student::next_lesson))
        .route("/get_resume_point", get(api::student::get_resume_point))
        .route("/answer_quiz", post(api::student::answer_quiz))
        .route("/get_dashboard", get(api::student::get_dashboard))
        .route(
            "/get_module_materials",
            get(api::student::get_module_materials),
        )
        .route("/get_profile", get(api::student::get_profile))
        .route("/update_profile", post(api::student::update_profile))
        .route("/get_certificate", get(api::student::get_certificate))
}

fn coordinator_routes() -> Router<AppState> {
    Router::new()
        .route("/get_cohort_stats", get(api::coordinator::get_cohort_stats))
        .route("/list_students", get(api::coordinator::list_students))
        .route("/create_user", post(api::coordinator::create_user))
        .route("/set_user_active", post(api::coordinator::set_user_active))
        .route("/get_course", get(api::coordinator::get_course))
        .route("/upsert_module", post(api::coordinator::upsert_module))
        .route("/delete_module", post(api::coordinator::delete_module))
        .route("/move_module", post(api::coordinator::move_module))
        .route(
            "/set_module_active",
            post(api::coordinator::set_module_active),
        )
        .route("/upsert_lesson", post(api::coordinator::upsert_lesson))
        .route("/delete_lesson", post(api::coordinator::delete_lesson))
        .route("/move_lesson", post(api::coordinator::move_lesson))
        .route(
            "/set_lesson_active",
            post(api::coordinator::set_lesson_active),
        )
        .route(
            "/set_correct_option",
            post(api::coordinator::set_correct_option),
        )
        .route(
            "/update_certificate",
            post(api::coordinator::update_certificate),
        )
}
