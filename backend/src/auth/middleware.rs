use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use actix_web::{FromRequest, HttpRequest};
use futures::future::{Ready, err, ok};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use super::models::CurrentUser;
use super::session::{SESSION_COOKIE, SessionService};
use crate::error::ApiError;

/// Gate in front of the upload/history/feedback endpoints. Validates the
/// session token on every request and stashes the caller's identity in
/// request extensions; public paths pass through either way.
#[derive(Clone)]
pub struct AuthMiddleware {
    sessions: Arc<SessionService>,
}

impl AuthMiddleware {
    pub fn new(sessions: SessionService) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            sessions: self.sessions.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    sessions: Arc<SessionService>,
}

#[derive(Debug)]
enum AuthError {
    NoToken,
    VerificationFailed(String),
    InvalidClaims(String),
}

impl AuthError {
    fn log_message(&self, path: &str) -> String {
        match self {
            AuthError::NoToken => format!("No session token found for path: {}", path),
            AuthError::VerificationFailed(e) => {
                format!("Session token verification failed for path {}: {}", path, e)
            }
            AuthError::InvalidClaims(sub) => {
                format!("Invalid user id in session claims for path {}: {}", path, sub)
            }
        }
    }

    fn client_error_json(&self) -> serde_json::Value {
        let error_message = match self {
            AuthError::InvalidClaims(_) => "Invalid session claims",
            AuthError::VerificationFailed(_) => "Session verification failed",
            AuthError::NoToken => "Authentication required",
        };
        serde_json::json!({ "error": error_message })
    }
}

/// Routes reachable without a session. Everything else requires a valid
/// token.
fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/register" | "/login" | "/contact" | "/check_auth")
        || path.starts_with("/static/")
}

/// Pull the session token out of the request: the session cookie first, then
/// an Authorization bearer header for non-browser clients.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(str::to_string)
}

fn validate_request_token(
    req: &ServiceRequest,
    sessions: &SessionService,
) -> Result<CurrentUser, AuthError> {
    let token = extract_token(req).ok_or(AuthError::NoToken)?;

    let claims = sessions
        .verify_token(&token)
        .map_err(|e| AuthError::VerificationFailed(format!("{:?}", e)))?;

    log::debug!("Session token verified for user: {}", claims.sub);
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::InvalidClaims(claims.sub.clone()))?;

    Ok(CurrentUser {
        id,
        username: claims.name,
        email: claims.email,
    })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let sessions = self.sessions.clone();

        Box::pin(async move {
            let path_str = req.path().to_string();

            // Validate eagerly so optional-auth handlers (e.g. /check_auth)
            // still see the identity when a valid token rides along.
            let identity = validate_request_token(&req, &sessions);

            if let Ok(user) = &identity {
                req.extensions_mut().insert(user.clone());
            }

            if is_public_path(&path_str) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            match identity {
                Ok(_) => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(auth_error) => {
                    log::warn!("{}", auth_error.log_message(&path_str));

                    let (http_req, _payload) = req.into_parts();
                    let response = HttpResponse::Unauthorized()
                        .json(auth_error.client_error_json())
                        .map_into_right_body();
                    Ok(ServiceResponse::new(http_req, response))
                }
            }
        })
    }
}

/// Extractor for handlers behind the session gate. Missing identity is a
/// 401, which only happens if a gated route was registered outside the
/// middleware.
pub struct AuthenticatedUser(pub CurrentUser);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>() {
            Some(user) => ok(AuthenticatedUser(user.clone())),
            None => {
                log::warn!(
                    "AuthenticatedUser extractor: no identity in request extensions for path: {}",
                    req.path()
                );
                err(ApiError::Unauthorized.into())
            }
        }
    }
}

/// Extractor for optional-auth handlers.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequest for MaybeUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ok(MaybeUser(req.extensions().get::<CurrentUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/register"));
        assert!(is_public_path("/login"));
        assert!(is_public_path("/contact"));
        assert!(is_public_path("/check_auth"));
        assert!(is_public_path("/static/uploads/abc.png"));
    }

    #[test]
    fn gated_paths() {
        assert!(!is_public_path("/upload"));
        assert!(!is_public_path("/detection_history"));
        assert!(!is_public_path("/results/some-id"));
        assert!(!is_public_path("/feedback"));
        assert!(!is_public_path("/logout"));
    }
}
