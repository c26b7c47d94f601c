use std::env;
use std::path::PathBuf;

use log::warn;
use rand::Rng;

/// Runtime configuration, collected from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub data_dir: PathBuf,
    pub session_secret: String,
    pub session_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());

        // Sessions are signed with this secret. Operators who care about
        // session continuity across restarts must set SESSION_SECRET; the
        // generated fallback only keeps a development instance usable.
        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!(
                    "SESSION_SECRET is not set; generated a random secret. \
                    Existing sessions will not survive a restart."
                );
                let mut bytes = [0u8; 32];
                rand::rng().fill(&mut bytes[..]);
                hex::encode(bytes)
            }
        };

        let session_ttl_days = env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        Self {
            bind_address: format!("0.0.0.0:{}", port),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/app.db".to_string())
                .into(),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "static/uploads".to_string())
                .into(),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            session_secret,
            session_ttl_days,
        }
    }
}
