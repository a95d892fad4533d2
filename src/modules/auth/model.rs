use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub security_question_1: String,
    pub security_answer_1_hash: String,
    pub security_question_2: String,
    pub security_answer_2_hash: String,
    pub security_question_3: String,
    pub security_answer_3_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Security questions in the order they are asked during recovery.
    pub fn security_questions(&self) -> [&str; 3] {
        [
            &self.security_question_1,
            &self.security_question_2,
            &self.security_question_3,
        ]
    }

    pub fn security_answer_hashes(&self) -> [&str; 3] {
        [
            &self.security_answer_1_hash,
            &self.security_answer_2_hash,
            &self.security_answer_3_hash,
        ]
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
