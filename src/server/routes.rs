//! REST endpoints for step configuration and onboarding progress.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use super::password;
use crate::error::{ConfigError, DatabaseError, Error};
use crate::fields::{self, FieldId};
use crate::layout::BucketId;
use crate::profile::{CredentialsPayload, ProfileUpdate, Progress, UserSummary};
use crate::wizard::WizardStep;
use crate::wizard::validation;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn crate::store::Database>,
}

/// Build the Axum router with the configuration and onboarding routes.
pub fn onboarding_routes(db: Arc<dyn crate::store::Database>) -> Router {
    let state = AppState { db };

    Router::new()
        .route("/health", get(health))
        .route("/api/admin/config", get(get_config).post(save_config))
        .route("/api/onboarding/login", post(login))
        .route("/api/onboarding/register", post(register))
        .route("/api/onboarding/update", post(update_progress))
        .route("/api/onboarding/step/{email}", get(get_progress))
        .route("/api/data", get(list_users))
        .with_state(state)
}

/// CORS policy for browser frontends. `None` allows any origin.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match origin {
        None => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let value = origin
                .parse::<HeaderValue>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "ONBOARD_CORS_ORIGIN".into(),
                    message: e.to_string(),
                })?;
            Ok(layer.allow_origin(value))
        }
    }
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

fn internal(context: &str, e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    error!(error = %e, "{context}");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Run a password hash or verification off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Password(format!("hashing task failed: {e}")))?
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "onboard-flow"
    }))
}

// ── Step configuration ──────────────────────────────────────────────────

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.load_layout().await {
        Ok(layout) => (StatusCode::OK, Json(json!(layout))),
        Err(e) => internal("Failed to load step configuration", e),
    }
}

#[derive(Deserialize)]
struct SaveBucketRequest {
    page: u8,
    components: Vec<FieldId>,
}

async fn save_config(
    State(state): State<AppState>,
    Json(req): Json<SaveBucketRequest>,
) -> impl IntoResponse {
    let Ok(bucket) = BucketId::try_from(req.page) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            format!("Step {} is not configurable", req.page),
        );
    };
    if req.components.is_empty() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Each step must have at least one field.",
        );
    }
    for field in req.components.iter().filter(|f| !fields::is_known(f)) {
        warn!(%bucket, %field, "Saving unknown field component");
    }

    match state.db.save_bucket(bucket, &req.components).await {
        Ok(()) => {
            info!(%bucket, count = req.components.len(), "Step configuration saved");
            (StatusCode::OK, Json(json!({"status": "saved"})))
        }
        Err(e) => internal("Failed to save step configuration", e),
    }
}

// ── Onboarding ──────────────────────────────────────────────────────────

async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsPayload>,
) -> impl IntoResponse {
    let user = match state.db.find_user(&req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(email = %req.email, "Login for unknown user");
            return error_body(StatusCode::NOT_FOUND, "User not found");
        }
        Err(e) => return internal("Failed to look up user", e),
    };

    let stored = user.password_hash.clone();
    let matched = match blocking(move || password::verify(&req.password, &stored)).await {
        Ok(matched) => matched,
        Err(e) => return internal("Failed to verify password", e),
    };
    if !matched {
        info!(email = %user.email, "Login rejected: wrong password");
        return error_body(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let progress = Progress {
        current_step: user.current_step,
        profile: user.profile,
    };
    (StatusCode::OK, Json(json!(progress)))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsPayload>,
) -> impl IntoResponse {
    if let Err(e) = validation::check_credentials(&req.email, &req.password) {
        return error_body(StatusCode::BAD_REQUEST, e.to_string());
    }

    let email = req.email;
    let hashed = match blocking(move || password::hash(&req.password)).await {
        Ok(hashed) => hashed,
        Err(e) => return internal("Failed to hash password", e),
    };

    // New users resume at the first configurable step.
    let first_step = WizardStep::Step2.number();
    match state.db.create_user(&email, &hashed, first_step).await {
        Ok(()) => (StatusCode::CREATED, Json(json!({"status": "registered"}))),
        Err(DatabaseError::Constraint(_)) => {
            error_body(StatusCode::CONFLICT, "User already exists")
        }
        Err(e) => internal("Failed to register user", e),
    }
}

async fn update_progress(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> impl IntoResponse {
    if WizardStep::try_from(update.current_step).is_err() {
        return error_body(
            StatusCode::BAD_REQUEST,
            format!("Invalid step {}", update.current_step),
        );
    }

    match state.db.update_progress(&update).await {
        Ok(true) => {
            debug!(email = %update.email, step = update.current_step, "Progress saved");
            (StatusCode::OK, Json(json!({"status": "updated"})))
        }
        Ok(false) => error_body(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => internal("Failed to save progress", e),
    }
}

async fn get_progress(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    match state.db.find_user(&email).await {
        Ok(Some(user)) => {
            let progress = Progress {
                current_step: user.current_step,
                profile: user.profile,
            };
            (StatusCode::OK, Json(json!(progress)))
        }
        Ok(None) => error_body(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => internal("Failed to look up user", e),
    }
}

async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_users().await {
        Ok(users) => {
            let rows: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
            (StatusCode::OK, Json(json!(rows)))
        }
        Err(e) => internal("Failed to list users", e),
    }
}
