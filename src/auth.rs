//! Password hashing, bearer tokens and the request guards.
use std::io;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use futures::future::LocalBoxFuture;
use leptos::logging::{log, warn};
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::user::{LoginRequest, LoginResponse, PasswordChange, Role, User, UserInput};
use crate::models::check;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Hashing(e.to_string()))
}

/// False for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("[AUTH] Stored hash is unreadable: {}", e);
            false
        }
    }
}

/// How long a bearer token stays valid after login.
pub const TOKEN_TTL_HOURS: i64 = 24 * 7;

/// Tokens issued at or before this instant have expired.
pub fn token_cutoff() -> DateTime<Utc> {
    Utc::now() - Duration::hours(TOKEN_TTL_HOURS)
}

pub fn issue_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Checks credentials and stores a fresh token.
///
/// Any active account may log in; the dashboard itself refuses non-admins.
pub async fn login(db: &Database, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    let Some((user, hash)) = db.find_credentials(&request.email).await? else {
        log!("[AUTH] Login for unknown email {}", request.email);
        return Err(ApiError::InvalidCredentials);
    };
    if !user.active || !verify_password(&request.password, &hash) {
        log!("[AUTH] Rejected login for {}", user.email);
        return Err(ApiError::InvalidCredentials);
    }
    db.prune_tokens(token_cutoff()).await?;
    let token = issue_token();
    db.insert_token(&token, &user.id).await?;
    log!("[AUTH] {} logged in as {}", user.email, user.role.as_str());
    Ok(LoginResponse { token, user })
}

pub async fn change_password(
    db: &Database,
    user: &User,
    change: &PasswordChange,
) -> Result<(), ApiError> {
    check(change).map_err(ApiError::Validation)?;
    let hash = db
        .password_hash(&user.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if !verify_password(&change.current_password, &hash) {
        return Err(ApiError::Validation(vec![
            "Current password is incorrect".to_string(),
        ]));
    }
    db.set_password(&user.id, &hash_password(&change.new_password)?)
        .await?;
    log!("[AUTH] Password changed for {}", user.email);
    Ok(())
}

/// Creates the configured administrator unless an active admin already exists.
pub async fn bootstrap_admin(db: &Database, admin: &BootstrapAdmin) -> Result<Option<User>, ApiError> {
    if db.count_admins().await? > 0 {
        return Ok(None);
    }
    if db.email_taken(&admin.email, None).await? {
        warn!(
            "[AUTH] No active admin, but {} already belongs to another account",
            admin.email
        );
        return Ok(None);
    }
    let input = UserInput {
        name: admin.name.clone(),
        email: admin.email.clone(),
        role: Role::Admin,
        active: true,
        password: Some(admin.password.clone()),
    };
    check(&input).map_err(ApiError::Validation)?;
    let user = db
        .insert_user(&input, &hash_password(&admin.password)?)
        .await?;
    log!("[AUTH] Bootstrap admin created: {}", user.email);
    Ok(Some(user))
}

/// Extractor for any active account holding an unexpired token.
///
/// Missing, unknown and expired tokens fail with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let db = req.app_data::<web::Data<Database>>().cloned();
        let token = bearer_token(req).map(str::to_string);
        let path = req.path().to_string();

        Box::pin(async move {
            let db = db.ok_or_else(|| ApiError::Io(io::Error::other("database is not registered")))?;
            let Some(token) = token else {
                log!("[AUTH] No bearer token on {}", path);
                return Err(ApiError::Unauthorized);
            };
            let user = db
                .user_for_token(&token, token_cutoff())
                .await?
                .filter(|user| user.active)
                .ok_or(ApiError::Unauthorized)?;
            Ok(AuthUser { user, token })
        })
    }
}

/// Extractor for routes only an active administrator may call.
///
/// Fails like [`AuthUser`] for a bad token, and with 403 for a valid
/// token of a non-admin account.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: User,
    pub token: String,
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let authenticated = AuthUser::from_request(req, payload);
        let path = req.path().to_string();

        Box::pin(async move {
            let AuthUser { user, token } = authenticated.await?;
            if !user.is_admin() {
                warn!("[AUTH] {} is not an admin, refusing {}", user.email, path);
                return Err(ApiError::Forbidden);
            }
            Ok(AdminUser { user, token })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn hashes_verify_only_their_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(issue_token(), issue_token());
    }

    #[test]
    fn bearer_header_is_parsed() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        let admin = BootstrapAdmin {
            name: "Owner".into(),
            email: "owner@shop.test".into(),
            password: "long enough".into(),
        };
        assert!(bootstrap_admin(&db, &admin).await.unwrap().is_some());
        assert!(bootstrap_admin(&db, &admin).await.unwrap().is_none());

        let response = login(
            &db,
            &LoginRequest {
                email: "OWNER@shop.test".into(),
                password: "long enough".into(),
            },
        )
        .await
        .unwrap();
        assert!(response.user.is_admin());
        assert!(db
            .user_for_token(&response.token, token_cutoff())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        let admin = BootstrapAdmin {
            name: "Owner".into(),
            email: "owner@shop.test".into(),
            password: "long enough".into(),
        };
        bootstrap_admin(&db, &admin).await.unwrap();
        let err = login(
            &db,
            &LoginRequest {
                email: "owner@shop.test".into(),
                password: "guess".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }
}
