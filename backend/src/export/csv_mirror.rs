use std::fs::OpenOptions;
use std::path::PathBuf;

use csv::WriterBuilder;

use crate::db::models::{ContactMessage, DetectionResult, Feedback, User};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Best-effort duplication of primary-store writes into flat files, invoked
/// after the database write commits. Never load-bearing: callers log a
/// failure and carry on, and the primary store stays authoritative.
pub trait ExportSink: Send + Sync {
    fn record_user(&self, user: &User) -> Result<(), ExportError>;
    fn record_result(&self, result: &DetectionResult) -> Result<(), ExportError>;
    fn record_feedback(&self, feedback: &Feedback) -> Result<(), ExportError>;
    fn record_contact(&self, contact: &ContactMessage) -> Result<(), ExportError>;
}

/// Append-only CSV mirror, one file per entity type under the data
/// directory. Headers are written when a file is first created.
#[derive(Clone)]
pub struct CsvExporter {
    data_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn append(&self, file: &str, headers: &[&str], row: &[String]) -> Result<(), ExportError> {
        let path = self.data_dir.join(file);
        let write_headers = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if write_headers {
            writer.write_record(headers)?;
        }
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }
}

impl ExportSink for CsvExporter {
    // The password hash stays out of the mirror.
    fn record_user(&self, user: &User) -> Result<(), ExportError> {
        self.append(
            "users.csv",
            &["id", "username", "email", "created_at"],
            &[
                user.id.to_string(),
                user.username.clone(),
                user.email.clone(),
                user.created_at.to_rfc3339(),
            ],
        )
    }

    fn record_result(&self, result: &DetectionResult) -> Result<(), ExportError> {
        self.append(
            "results.csv",
            &[
                "id",
                "user_id",
                "image_path",
                "prediction",
                "confidence",
                "created_at",
            ],
            &[
                result.id.to_string(),
                result.user_id.to_string(),
                result.image_path.clone(),
                result.prediction.clone(),
                result.confidence.to_string(),
                result.created_at.to_rfc3339(),
            ],
        )
    }

    fn record_feedback(&self, feedback: &Feedback) -> Result<(), ExportError> {
        self.append(
            "feedback.csv",
            &["id", "user_id", "message", "created_at"],
            &[
                feedback.id.to_string(),
                feedback
                    .user_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                feedback.message.clone(),
                feedback.created_at.to_rfc3339(),
            ],
        )
    }

    fn record_contact(&self, contact: &ContactMessage) -> Result<(), ExportError> {
        self.append(
            "contacts.csv",
            &["id", "name", "email", "subject", "message", "created_at"],
            &[
                contact.id.to_string(),
                contact.name.clone(),
                contact.email.clone(),
                contact.subject.clone(),
                contact.message.clone(),
                contact.created_at.to_rfc3339(),
            ],
        )
    }
}
