use crate::api::schemas::{ErrorResponse, SuccessResponse};
use crate::auth::adapter::incoming::web::extractors::AuthenticatedUser;
use crate::auth::application::use_cases::resend_verification::ResendVerificationError;
use crate::shared::api::ApiResponse;
use crate::AppState;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendVerificationResponse {
    /// Resends left before the limit is reached
    #[schema(example = 2)]
    pub remaining_attempts: u32,

    /// Expiry of the newly issued token
    #[schema(value_type = String, example = "2026-01-01T12:00:00Z")]
    pub expires_at: DateTime<Utc>,
}

fn map_resend_error(err: ResendVerificationError, user: &AuthenticatedUser) -> HttpResponse {
    let message = err.to_string();
    match &err {
        ResendVerificationError::AlreadyVerified => {
            ApiResponse::bad_request(err.code(), &message)
        }
        ResendVerificationError::AccountNotFound => ApiResponse::not_found(err.code(), &message),
        ResendVerificationError::ResendCooldownActive { retry_after_secs } => {
            warn!(user_id = %user.user_id, retry_after_secs, "Resend refused during cooldown");
            ApiResponse::too_many_requests(err.code(), &message, *retry_after_secs)
        }
        // Waiting does not help here, so no Retry-After.
        ResendVerificationError::ResendLimitExceeded { .. } => {
            warn!(user_id = %user.user_id, "Resend limit reached");
            ApiResponse::error(StatusCode::TOO_MANY_REQUESTS, err.code(), &message)
        }
        ResendVerificationError::DatabaseError(detail) => {
            error!(user_id = %user.user_id, error = %detail, "Resend verification failed");
            ApiResponse::internal_error()
        }
    }
}

/// Resend the verification email
///
/// Invalidates the caller's outstanding token and emails a fresh one,
/// subject to a per-account attempt limit and cooldown.
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    tag = "auth",
    security(("BearerAuth" = [])),
    responses(
        (
            status = 200,
            description = "New verification email sent",
            body = inline(SuccessResponse<ResendVerificationResponse>),
            example = json!({
                "success": true,
                "data": { "remainingAttempts": 2, "expiresAt": "2026-01-01T12:00:00Z" }
            })
        ),
        (
            status = 400,
            description = "Account already verified",
            body = ErrorResponse,
            example = json!({
                "success": false,
                "error": { "code": "ALREADY_VERIFIED", "message": "Account is already verified" }
            })
        ),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (
            status = 429,
            description = "Resend limit reached or cooldown active",
            body = ErrorResponse,
            headers(("Retry-After" = u64, description = "Seconds until the cooldown ends")),
            examples(
                ("Cooldown" = (value = json!({
                    "success": false,
                    "error": {
                        "code": "RESEND_COOLDOWN_ACTIVE",
                        "message": "Please wait 119 seconds before requesting another email"
                    }
                }))),
                ("Limit" = (value = json!({
                    "success": false,
                    "error": {
                        "code": "RESEND_LIMIT_EXCEEDED",
                        "message": "Maximum of 3 resend attempts reached"
                    }
                })))
            )
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[post("/api/auth/resend-verification")]
pub async fn resend_verification_handler(
    user: AuthenticatedUser,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.resend_verification_use_case.execute(user.user_id).await {
        Ok(outcome) => {
            info!(
                user_id = %user.user_id,
                remaining_attempts = outcome.remaining_attempts,
                "Verification email resent"
            );
            ApiResponse::success(ResendVerificationResponse {
                remaining_attempts: outcome.remaining_attempts,
                expires_at: outcome.token.expires_at,
            })
        }
        Err(e) => map_resend_error(e, &user),
    }
}
