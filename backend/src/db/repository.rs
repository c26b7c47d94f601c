use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{ContactMessage, DetectionResult, Feedback, User};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// True when the underlying failure was a UNIQUE constraint violation,
    /// e.g. a concurrent registration racing on the same email.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    }

    /// Message of the violated constraint, e.g.
    /// "UNIQUE constraint failed: users.username". Only present for unique
    /// violations; callers use it to name the conflicting column.
    pub fn unique_violation_message(&self) -> Option<&str> {
        match self {
            RepositoryError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Some(db.message())
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Login lookup: the identifier matches either username or email.
    pub async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, RepositoryError> {
        if let Some(user) = self.find_user_by_username(identifier).await? {
            return Ok(Some(user));
        }
        self.find_user_by_email(identifier).await
    }

    pub async fn insert_result(
        &self,
        user_id: Uuid,
        image_path: &str,
        prediction: &str,
        confidence: f64,
    ) -> Result<DetectionResult, RepositoryError> {
        let result = DetectionResult {
            id: Uuid::new_v4(),
            user_id,
            image_path: image_path.to_string(),
            prediction: prediction.to_string(),
            confidence,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO detection_results (id, user_id, image_path, prediction, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(result.id)
        .bind(result.user_id)
        .bind(&result.image_path)
        .bind(&result.prediction)
        .bind(result.confidence)
        .bind(result.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result)
    }

    /// All results owned by the user, newest first.
    pub async fn results_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<DetectionResult>, RepositoryError> {
        let results = sqlx::query_as::<_, DetectionResult>(
            r#"
            SELECT id, user_id, image_path, prediction, confidence, created_at
            FROM detection_results
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(results)
    }

    /// Owner-scoped lookup: a result belonging to another user is simply
    /// absent, so callers cannot distinguish "not yours" from "not there".
    pub async fn get_result(
        &self,
        user_id: Uuid,
        result_id: Uuid,
    ) -> Result<Option<DetectionResult>, RepositoryError> {
        let result = sqlx::query_as::<_, DetectionResult>(
            r#"
            SELECT id, user_id, image_path, prediction, confidence, created_at
            FROM detection_results
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(result_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(result)
    }

    pub async fn insert_feedback(
        &self,
        user_id: Option<Uuid>,
        message: &str,
    ) -> Result<Feedback, RepositoryError> {
        let feedback = Feedback {
            id: Uuid::new_v4(),
            user_id,
            message: message.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO feedback (id, user_id, message, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(feedback.id)
        .bind(feedback.user_id)
        .bind(&feedback.message)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(feedback)
    }

    pub async fn insert_contact(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<ContactMessage, RepositoryError> {
        let contact = ContactMessage {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO contact_messages (id, name, email, subject, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.subject)
        .bind(&contact.message)
        .bind(contact.created_at)
        .execute(&self.pool)
        .await?;

        Ok(contact)
    }
}
