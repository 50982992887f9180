use anyhow::Context;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn issue_token(user: &User, config: &AppConfig) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.jwt_expiry_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .context("failed to sign token")
}

fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Identifies the caller when a valid token is present. An absent or invalid
/// token is not an error here; booking creation accepts anonymous callers.
pub fn optional_caller(conn: &Connection, headers: &HeaderMap, secret: &str) -> Option<User> {
    let token = bearer_token(headers)?;
    let claims = decode_token(token, secret)?;
    queries::get_user_by_id(conn, &claims.sub).ok().flatten()
}

/// Guard for the back-office routes. The role is re-read from the database
/// rather than trusted from the token, so demotions take effect immediately.
pub fn require_admin(conn: &Connection, headers: &HeaderMap, secret: &str) -> Result<User, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = decode_token(token, secret).ok_or(AppError::Unauthorized)?;
    let user = queries::get_user_by_id(conn, &claims.sub)?.ok_or(AppError::Unauthorized)?;

    if !user.role.is_admin() {
        return Err(AppError::Forbidden("admin access required".to_string()));
    }

    Ok(user)
}

/// One-time startup task: make sure the account named by ADMIN_EMAIL exists
/// and holds the admin role. Safe to run on every boot.
pub fn ensure_admin(conn: &Connection, config: &AppConfig) -> anyhow::Result<()> {
    if config.admin_email.is_empty() || config.admin_password.is_empty() {
        return Ok(());
    }

    match queries::get_user_by_email(conn, &config.admin_email)? {
        Some(user) if user.role.is_admin() => {}
        Some(user) => {
            queries::set_user_role(conn, &user.id, Role::Admin)?;
            tracing::info!("promoted existing user to admin: {}", config.admin_email);
        }
        None => {
            let now = Utc::now().naive_utc();
            let admin = User {
                id: Uuid::new_v4().to_string(),
                name: "Admin".to_string(),
                email: config.admin_email.clone(),
                phone: String::new(),
                password_hash: hash_password(&config.admin_password)?,
                role: Role::Admin,
                profile_picture: None,
                created_at: now,
            };
            queries::create_user(conn, &admin)?;
            tracing::info!("admin user created: {}", config.admin_email);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            phone: "9999999999".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
            profile_picture: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            port: 0,
            database_url: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 1,
            admin_email: String::new(),
            admin_password: String::new(),
        }
    }

    #[test]
    fn token_roundtrip() {
        let config = test_config();
        let token = issue_token(&test_user(), &config).unwrap();
        let claims = decode_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn wrong_secret_rejected() {
        let config = test_config();
        let token = issue_token(&test_user(), &config).unwrap();
        assert!(decode_token(&token, "other-secret").is_none());
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }
}
