use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthBody, AuthRequest, AuthResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth", post(authenticate))
}

/// POST /auth — registration and login share one endpoint, split by the
/// `action` flag in the body.
#[instrument(skip(state, body))]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthBody>,
) -> Result<Json<AuthResponse>, ApiError> {
    match body.into_request()? {
        AuthRequest::Register {
            email,
            password,
            name,
        } => register(&state, email, password, name).await,
        AuthRequest::Login { email, password } => login(&state, email, password).await,
    }
}

async fn register(
    state: &AppState,
    email: String,
    password: String,
    name: String,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = email.trim().to_lowercase();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let hash = hash_password(&password)?;
    let user = User::create(&state.db, &email, &name, &hash).await?;

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id, &user.email, &user.name)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token,
        name: user.name,
        email: user.email,
    }))
}

async fn login(
    state: &AppState,
    email: String,
    password: String,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = email.trim().to_lowercase();

    // Unknown email and wrong password answer identically.
    let invalid_credentials = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login with unknown email");
            return Err(invalid_credentials());
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login with wrong password");
        return Err(invalid_credentials());
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id, &user.email, &user.name)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        name: user.name,
        email: user.email,
    }))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}
