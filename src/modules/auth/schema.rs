use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = 3, max = 3, message = "Exactly three security questions are required"))]
    pub security_questions: Vec<SecurityQuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct SecurityQuestionInput {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

// =============================================================================
// ME (Current User)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::modules::auth::model::User> for UserResponse {
    fn from(u: crate::modules::auth::model::User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

// =============================================================================
// PASSWORD RECOVERY
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SecurityAnswersRequest {
    pub email: String,
    #[validate(length(min = 3, max = 3, message = "Exactly three answers are required"))]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SecurityAnswersResponse {
    pub reset_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: &'static str,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
