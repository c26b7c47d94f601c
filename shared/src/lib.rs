use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// The four screening classes the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiseaseClass {
    Cataract,
    Glaucoma,
    DiabeticRetinopathy,
    Normal,
}

impl DiseaseClass {
    pub const ALL: [DiseaseClass; 4] = [
        DiseaseClass::Cataract,
        DiseaseClass::Glaucoma,
        DiseaseClass::DiabeticRetinopathy,
        DiseaseClass::Normal,
    ];

    /// Short patient-facing summary shown alongside a prediction.
    pub fn description(&self) -> &'static str {
        match self {
            DiseaseClass::Normal => {
                "No signs of eye disease detected. Regular eye check-ups are still recommended."
            }
            DiseaseClass::Cataract => {
                "Signs consistent with cataracts, a clouding of the lens in the eye leading to decreased vision."
            }
            DiseaseClass::Glaucoma => {
                "Signs consistent with glaucoma, a group of eye conditions that damage the optic nerve."
            }
            DiseaseClass::DiabeticRetinopathy => {
                "Signs consistent with diabetic retinopathy, a diabetes complication affecting the eyes."
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectionResponse {
    pub id: Uuid,
    pub prediction: DiseaseClass,
    pub confidence: f64,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub prediction: String,
    pub confidence: f64,
    pub image_path: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryResponse {
    pub results: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    #[serde(alias = "name")]
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirm-password")]
    pub confirm_password: String,
    #[serde(alias = "terms", default)]
    pub accept_terms: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    /// Username or email address; either is accepted at login.
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeedbackRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Light-weight address check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}
