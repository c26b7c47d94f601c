use actix_web::{Either, HttpResponse, web};
use log::{info, warn};
use serde_json::json;

use shared::{AuthStatus, LoginRequest, RegisterRequest, UserSummary, is_valid_email};

use super::middleware::MaybeUser;
use super::password;
use super::session::SessionService;
use crate::db::repository::Repository;
use crate::error::ApiError;
use crate::export::ExportSink;

/// JSON and classic form submissions are both accepted, as the UI upgrades
/// progressively from plain forms to fetch calls.
type Body<T> = Either<web::Json<T>, web::Form<T>>;

pub async fn register(
    body: Body<RegisterRequest>,
    repo: web::Data<Repository>,
    sessions: web::Data<SessionService>,
    exporter: web::Data<dyn ExportSink>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();

    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(ApiError::Validation("all fields are required".into()));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    password::check_strength(&form.password).map_err(|msg| ApiError::Validation(msg.into()))?;
    if form.password != form.confirm_password {
        return Err(ApiError::Validation("passwords do not match".into()));
    }
    if !form.accept_terms {
        return Err(ApiError::Validation(
            "you must accept the terms of service".into(),
        ));
    }

    if repo.find_user_by_email(email).await?.is_some() {
        return Err(ApiError::Validation("email already registered".into()));
    }
    if repo.find_user_by_username(username).await?.is_some() {
        return Err(ApiError::Validation("username already taken".into()));
    }

    let password_hash =
        password::hash_password(&form.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = match repo.create_user(username, email, &password_hash).await {
        Ok(user) => user,
        // Lost a race against a concurrent registration on the same
        // email/username; report the conflicting column the same way as the
        // pre-check would have.
        Err(e) if e.is_unique_violation() => {
            let message = if e
                .unique_violation_message()
                .is_some_and(|m| m.contains("users.username"))
            {
                "username already taken"
            } else {
                "email already registered"
            };
            return Err(ApiError::Validation(message.into()));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = exporter.record_user(&user) {
        warn!("Failed to mirror user {} to CSV: {}", user.id, e);
    }

    info!("New user registered: {}", user.email);

    let token = sessions
        .issue_token(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created()
        .cookie(sessions.session_cookie(token))
        .json(UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
        }))
}

pub async fn login(
    body: Body<LoginRequest>,
    repo: web::Data<Repository>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();

    let identifier = form.identifier.trim();
    if identifier.is_empty() || form.password.is_empty() {
        return Err(ApiError::Validation(
            "please enter username/email and password".into(),
        ));
    }

    // Unknown account and wrong password take the same path so the response
    // never reveals whether the identifier exists.
    let user = match repo.find_user_by_identifier(identifier).await? {
        Some(user) if password::verify_password(&form.password, &user.password_hash) => user,
        _ => return Err(ApiError::InvalidCredentials),
    };

    info!("Login successful for user: {}", user.username);

    let token = sessions
        .issue_token(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .cookie(sessions.session_cookie(token))
        .json(UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
        }))
}

pub async fn logout(sessions: web::Data<SessionService>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(sessions.clear_cookie())
        .json(json!({ "message": "logged out successfully" }))
}

pub async fn check_auth(user: MaybeUser) -> HttpResponse {
    let status = match user.0 {
        Some(user) => AuthStatus {
            authenticated: true,
            username: Some(user.username),
            email: Some(user.email),
        },
        None => AuthStatus {
            authenticated: false,
            username: None,
            email: None,
        },
    };
    HttpResponse::Ok().json(status)
}
