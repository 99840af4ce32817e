use crate::api::schemas::{ErrorResponse, SuccessResponse};
use crate::auth::application::use_cases::verify_user_email::VerifyUserEmailError;
use crate::shared::api::ApiResponse;
use crate::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    /// Plaintext token from the verification link
    #[serde(default)]
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")]
    pub token: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailResponse {
    #[schema(example = "123e4567-e89b-12d3-a456-426614174000")]
    pub user_id: String,
}

fn map_verify_error(err: VerifyUserEmailError) -> HttpResponse {
    match &err {
        VerifyUserEmailError::MissingToken => {
            ApiResponse::bad_request(err.code(), "Verification token is required")
        }
        VerifyUserEmailError::TokenExpired => {
            ApiResponse::bad_request(err.code(), "Verification token has expired")
        }
        VerifyUserEmailError::TokenAlreadyUsed => {
            ApiResponse::bad_request(err.code(), "Verification token has already been used")
        }
        VerifyUserEmailError::TokenNotFound => {
            ApiResponse::not_found(err.code(), "Verification token not found")
        }
        VerifyUserEmailError::AccountNotFound => {
            ApiResponse::not_found(err.code(), "Account not found")
        }
        VerifyUserEmailError::DatabaseError(detail) => {
            error!(error = %detail, "Email verification failed");
            ApiResponse::internal_error()
        }
    }
}

/// Verify an email address
///
/// Consumes a verification token and activates the owning account.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "auth",
    request_body = VerifyEmailRequest,
    responses(
        (
            status = 200,
            description = "Email verified",
            body = inline(SuccessResponse<VerifyEmailResponse>),
            example = json!({
                "success": true,
                "data": { "userId": "123e4567-e89b-12d3-a456-426614174000" }
            })
        ),
        (
            status = 400,
            description = "Token missing, expired or already used",
            body = ErrorResponse,
            examples(
                ("Missing token" = (value = json!({
                    "success": false,
                    "error": { "code": "MISSING_TOKEN", "message": "Verification token is required" }
                }))),
                ("Expired" = (value = json!({
                    "success": false,
                    "error": { "code": "TOKEN_EXPIRED", "message": "Verification token has expired" }
                }))),
                ("Already used" = (value = json!({
                    "success": false,
                    "error": { "code": "TOKEN_ALREADY_USED", "message": "Verification token has already been used" }
                })))
            )
        ),
        (
            status = 404,
            description = "Unknown token",
            body = ErrorResponse,
            example = json!({
                "success": false,
                "error": { "code": "TOKEN_NOT_FOUND", "message": "Verification token not found" }
            })
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[post("/api/auth/verify-email")]
pub async fn verify_email_handler(
    req: web::Json<VerifyEmailRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.verify_user_email_use_case.execute(&req.token).await {
        Ok(verified) => {
            info!(user_id = %verified.user_id, "Email verified");
            ApiResponse::success(VerifyEmailResponse {
                user_id: verified.user_id.to_string(),
            })
        }
        Err(e) => {
            if !matches!(e, VerifyUserEmailError::DatabaseError(_)) {
                warn!(code = e.code(), "Email verification rejected");
            }
            map_verify_error(e)
        }
    }
}
