use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, UserCrud},
    extractor::AuthUser,
    model::User,
    schema::{
        ErrorResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse, ResetPasswordRequest, ResetPasswordResponse,
        SecurityAnswersRequest, SecurityAnswersResponse, UserResponse,
    },
};
use crate::services::hashing;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply(e: AuthError) -> ErrorReply {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ErrorReply> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    if req.password != req.password_confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Passwords do not match")),
        ));
    }

    if req.password.len() < 8 {
        return Err(reply(AuthError::WeakPassword));
    }

    if req
        .security_questions
        .iter()
        .any(|q| q.question.trim().is_empty() || q.answer.trim().is_empty())
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Security questions and answers must not be empty")),
        ));
    }

    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    if crud.email_exists(&req.email).await.map_err(reply)? {
        return Err(reply(AuthError::EmailAlreadyExists));
    }

    let password_hash = hashing::hash_password(&req.password)
        .map_err(|e| reply(AuthError::Hashing(e.to_string())))?;

    let mut answer_hashes = Vec::with_capacity(3);
    for q in &req.security_questions {
        let hash = hashing::hash_security_answer(&q.answer)
            .map_err(|e| reply(AuthError::Hashing(e.to_string())))?;
        answer_hashes.push(hash);
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email.clone(),
        password_hash,
        name: req.name.clone(),
        security_question_1: req.security_questions[0].question.clone(),
        security_answer_1_hash: answer_hashes[0].clone(),
        security_question_2: req.security_questions[1].question.clone(),
        security_answer_2_hash: answer_hashes[1].clone(),
        security_question_3: req.security_questions[2].question.clone(),
        security_answer_3_hash: answer_hashes[2].clone(),
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = crud.create(&user).await {
        // Concurrent registration can slip past the email_exists check;
        // the unique index reports it as MySQL error 1062.
        if let AuthError::Database(ref db_err) = e {
            let msg = db_err.to_string();
            if msg.contains("Duplicate entry") || msg.contains("1062") {
                return Err(reply(AuthError::EmailAlreadyExists));
            }
        }
        return Err(reply(e));
    }

    let access_token = state
        .jwt_service
        .create_access_token(&user.id, &user.email)
        .map_err(|e| reply(AuthError::Token(e.to_string())))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            access_token,
            token_type: "Bearer",
            expires_in: state.jwt_service.get_access_token_duration_secs(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorReply> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let result = crud.login(&req.email, &req.password).await.map_err(reply)?;

    Ok(Json(LoginResponse {
        user: result.user.into(),
        access_token: result.access_token,
        token_type: "Bearer",
        expires_in: result.expires_in,
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ErrorReply> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let user = crud
        .find_by_id(&user.id)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(AuthError::UserNotFound))?;

    Ok(Json(user.into()))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ErrorReply> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let user = crud
        .find_by_email(&req.email)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(AuthError::UserNotFound))?;

    Ok(Json(ForgotPasswordResponse {
        questions: user
            .security_questions()
            .iter()
            .map(|q| q.to_string())
            .collect(),
    }))
}

pub async fn security_answers(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SecurityAnswersRequest>,
) -> Result<Json<SecurityAnswersResponse>, ErrorReply> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let reset = crud
        .verify_security_answers(&req.email, &req.answers)
        .await
        .map_err(reply)?;

    Ok(Json(SecurityAnswersResponse {
        reset_token: reset.token,
        expires_in: (reset.expires_at - Utc::now()).num_seconds(),
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, ErrorReply> {
    if req.password != req.password_confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Passwords do not match")),
        ));
    }

    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    crud.reset_password(&req.token, &req.password)
        .await
        .map_err(reply)?;

    Ok(Json(ResetPasswordResponse {
        message: "Password has been reset",
    }))
}
