use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use ring::rand::SystemRandom;
use serde::{Deserialize, Serialize};

use crate::config::AppState;
use crate::error::ServiceError;
use crate::hash::PasswordHash;
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::token;

/// Minimum lengths enforced on registration, counted in characters.
const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize)]
pub struct CredentialParams {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

fn validate_registration(username: &str, password: &str) -> Result<(), ServiceError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ServiceError::Validation(
            "Username must be at least 3 characters long".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }
    Ok(())
}

fn validate_login(username: &str, password: &str) -> Result<(), ServiceError> {
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    Ok(())
}

/// Hash the password and insert the user row. A duplicate username surfaces
/// as `DuplicateUsername` via the unique-violation mapping.
pub fn create_user(
    conn: &mut diesel::pg::PgConnection,
    rng: &SystemRandom,
    username: &str,
    password: &str,
) -> Result<(), ServiceError> {
    let hash = PasswordHash::from_password(rng, password)?;
    let new_user = NewUser {
        username: username.to_string(),
        password_hash: hash.into_bytes(),
    };
    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)?;
    Ok(())
}

/// `POST /register`: validate, hash the password, insert the user.
/// Duplicate usernames surface as 409 via the unique-violation mapping.
pub async fn register(
    params: web::Json<CredentialParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    validate_registration(&params.username, &params.password)?;

    let params = params.into_inner();
    let pool = state.pool.clone();
    web::block(move || -> Result<(), ServiceError> {
        let mut conn = pool.get()?;
        let rng = SystemRandom::new();
        create_user(&mut conn, &rng, &params.username, &params.password)
    })
    .await??;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully",
    }))
}

/// `POST /login`: look up the stored hash, verify the password against it,
/// and issue a signed 24-hour session token.
pub async fn login(
    params: web::Json<CredentialParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    validate_login(&params.username, &params.password)?;

    let params = params.into_inner();
    let pool = state.pool.clone();
    let secret = state.token_secret.clone();
    let token = web::block(move || -> Result<String, ServiceError> {
        let mut conn = pool.get()?;
        let user: User = users::table
            .filter(users::username.eq(&params.username))
            .first(&mut conn)
            .optional()?
            .ok_or(ServiceError::UserNotFound)?;

        let stored = PasswordHash::from_bytes(user.password_hash);
        if !stored.verify(&params.password) {
            return Err(ServiceError::InvalidCredentials);
        }

        token::issue(&secret, &user.username)
    })
    .await??;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register)))
        .service(web::resource("/login").route(web::post().to(login)));
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_short_username_rejected() {
        let err = validate_registration("ab", "password123").unwrap_err();
        assert_eq!(err.to_string(), "Username must be at least 3 characters long");
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_registration("alice", "123").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");
    }

    #[test]
    fn test_missing_fields_rejected_as_short_username() {
        // Absent JSON fields deserialize to empty strings, which trip the
        // username length rule first.
        let err = validate_registration("", "").unwrap_err();
        assert_eq!(err.to_string(), "Username must be at least 3 characters long");
    }

    #[test]
    fn test_valid_registration_input_accepted() {
        assert!(validate_registration("alice", "password123").is_ok());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let err = validate_login("alice", "").unwrap_err();
        assert_eq!(err.to_string(), "Username and password are required");
        let err = validate_login("", "password123").unwrap_err();
        assert_eq!(err.to_string(), "Username and password are required");
        assert!(validate_login("alice", "password123").is_ok());
    }
}
