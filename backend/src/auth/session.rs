use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::models::Claims;
use crate::db::models::User;

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("token encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("token decoding error: {0}")]
    Decoding(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
}

/// Issues and validates the signed, opaque-to-the-client session tokens that
/// gate the upload and history endpoints.
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionService {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, SessionError> {
        let now = Utc::now();
        let expiration = now + self.ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.username.clone(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(SessionError::Encoding)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, SessionError> {
        if token.is_empty() {
            return Err(SessionError::InvalidToken);
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(SessionError::InvalidToken);
        }

        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                let now = Utc::now().timestamp() as usize;
                if token_data.claims.exp < now {
                    log::warn!(
                        "Session token expired. Exp: {}, Now: {}",
                        token_data.claims.exp,
                        now
                    );
                    return Err(SessionError::TokenExpired);
                }
                Ok(token_data.claims)
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(SessionError::TokenExpired),
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Err(SessionError::InvalidToken)
                }
                _ => Err(SessionError::Decoding(err.to_string())),
            },
        }
    }

    /// Cookie delivering a freshly issued token to the browser.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::days(self.ttl.num_days()))
            .finish()
    }

    /// Removal cookie sent at logout.
    pub fn clear_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}
