use axum::{
    extract::{Request, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::RegisterError,
    state::AppState,
    users::{
        dto::{Registration, RegisterResponse},
        extractors::read_registration_form,
        password::hash_password_blocking,
        repo::StoreError,
        repo_types::NewUser,
    },
};

pub const HOME_MESSAGE: &str = "Registration server is running. Ready to register users.";

pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", post(register))
}

/// Liveness check.
pub async fn home() -> &'static str {
    HOME_MESSAGE
}

/// POST /register (JSON, or url-encoded / multipart form as fallback)
///
/// The store connection is checked out before the body is read and is
/// released when `session` drops, on every return path.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<RegisterResponse>), RegisterError> {
    let mut session = match state.store.acquire().await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "could not acquire store connection");
            return Err(RegisterError::StoreUnavailable);
        }
    };

    let form = match read_registration_form(request, state.config.http.body_limit_bytes).await {
        Ok(f) => f,
        Err(e) => {
            warn!(
                limit = state.config.http.body_limit_bytes,
                "registration rejected: body too large"
            );
            return Err(e);
        }
    };
    let Registration {
        username,
        email,
        password,
    } = match form.into_registration() {
        Ok(r) => r,
        Err(e) => {
            warn!("registration rejected: missing fields");
            return Err(e);
        }
    };

    let password_hash = match hash_password_blocking(password).await {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err(RegisterError::Hashing(e.to_string()));
        }
    };

    let new_user = NewUser {
        username,
        email,
        password_hash,
    };
    let user = match session.insert_user(&new_user).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation { constraint }) => {
            warn!(username = %new_user.username, ?constraint, "username or email already registered");
            return Err(RegisterError::DuplicateEntry);
        }
        Err(e) => {
            error!(error = %e, username = %new_user.username, "create user failed");
            return Err(e.into());
        }
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}
