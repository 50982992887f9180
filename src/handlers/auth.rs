use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::success;
use crate::models::{Role, User};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = body.name.unwrap_or_default().trim().to_string();
    let email = body.email.unwrap_or_default().trim().to_lowercase();
    let phone = body.phone.unwrap_or_default().trim().to_string();
    let password = body.password.unwrap_or_default();

    let mut missing = vec![];
    if name.is_empty() {
        missing.push("name".to_string());
    }
    if email.is_empty() {
        missing.push("email".to_string());
    }
    if phone.is_empty() {
        missing.push("phone".to_string());
    }
    if password.is_empty() {
        missing.push("password".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let db = state.db.lock().unwrap();

    if queries::get_user_by_email(&db, &email)?.is_some() {
        return Err(AppError::Validation("email already registered".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        phone,
        password_hash: auth::hash_password(&password)?,
        role: Role::User,
        profile_picture: None,
        created_at: Utc::now().naive_utc(),
    };
    queries::create_user(&db, &user)?;

    let token = auth::issue_token(&user, &state.config)?;
    Ok((
        StatusCode::CREATED,
        success(
            serde_json::json!({"token": token, "user": user}),
            "Registration successful",
        ),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.unwrap_or_default().trim().to_lowercase();
    let password = body.password.unwrap_or_default();

    let mut missing = vec![];
    if email.is_empty() {
        missing.push("email".to_string());
    }
    if password.is_empty() {
        missing.push("password".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let db = state.db.lock().unwrap();

    let user = queries::get_user_by_email(&db, &email)?.ok_or(AppError::Unauthorized)?;
    if !auth::verify_password(&password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = auth::issue_token(&user, &state.config)?;
    Ok(success(
        serde_json::json!({"token": token, "user": user}),
        "Login successful",
    ))
}
