use chrono::{Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use crate::modules::auth::model::{PasswordReset, User};
use crate::services::{hashing, jwt::JwtService};

/// Reset tokens stay valid for half an hour and are single use.
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Incorrect answer to security question {0}")]
    WrongSecurityAnswer(usize),

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Password must be at least 8 characters")]
    WeakPassword,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
            Self::WrongSecurityAnswer(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidResetToken => StatusCode::BAD_REQUEST,
            Self::WeakPassword => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Hashing(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub struct LoginResult {
    pub user: User,
    pub access_token: String,
    pub expires_in: i64,
}

pub struct UserCrud<'a> {
    pool: Pool<MySql>,
    jwt_service: &'a JwtService,
}

impl<'a> UserCrud<'a> {
    pub fn new(pool: Pool<MySql>, jwt_service: &'a JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn create(&self, user: &User) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, name,
                security_question_1, security_answer_1_hash,
                security_question_2, security_answer_2_hash,
                security_question_3, security_answer_3_hash,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.security_question_1)
        .bind(&user.security_answer_1_hash)
        .bind(&user.security_question_2)
        .bind(&user.security_answer_2_hash)
        .bind(&user.security_question_3)
        .bind(&user.security_answer_3_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .jwt_service
            .create_access_token(&user.id, &user.email)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        Ok(LoginResult {
            user,
            access_token,
            expires_in: self.jwt_service.get_access_token_duration_secs(),
        })
    }

    /// Verify all three recovery answers in order, stopping at the
    /// first mismatch. Only a full pass issues a reset token.
    pub async fn verify_security_answers(
        &self,
        email: &str,
        answers: &[String],
    ) -> Result<PasswordReset, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        for (index, (answer, hash)) in answers
            .iter()
            .zip(user.security_answer_hashes())
            .enumerate()
        {
            let matches = hashing::verify_security_answer(answer, hash)
                .map_err(|e| AuthError::Hashing(e.to_string()))?;

            if !matches {
                return Err(AuthError::WrongSecurityAnswer(index + 1));
            }
        }

        self.create_password_reset(&user.id).await
    }

    async fn create_password_reset(&self, user_id: &str) -> Result<PasswordReset, AuthError> {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        let now = Utc::now();
        let reset = PasswordReset {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token,
            expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            used: false,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO password_resets (id, user_id, token, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reset.id)
        .bind(&reset.user_id)
        .bind(&reset.token)
        .bind(reset.expires_at)
        .bind(reset.used)
        .bind(reset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(reset)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::WeakPassword);
        }

        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidResetToken)?;

        if reset.used || reset.expires_at < Utc::now() {
            return Err(AuthError::InvalidResetToken);
        }

        let password_hash = hashing::hash_password(new_password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(&reset.user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("UPDATE password_resets SET used = TRUE WHERE id = ?")
            .bind(&reset.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
