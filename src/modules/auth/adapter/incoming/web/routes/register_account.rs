use crate::api::schemas::{ErrorResponse, SuccessResponse};
use crate::auth::application::orchestrator::account_registration::AccountRegistrationError;
use crate::shared::api::ApiResponse;
use crate::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Request body for account registration
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterAccountRequest {
    /// Email address, compared case-insensitively
    #[schema(example = "jane@example.com")]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountResponse {
    /// Account ID (UUID)
    #[schema(example = "123e4567-e89b-12d3-a456-426614174000")]
    pub user_id: String,

    /// Normalized email address
    #[schema(example = "jane@example.com")]
    pub email: String,

    #[schema(
        example = "Account created successfully. Please check your email to verify your account."
    )]
    pub message: String,
}

fn map_registration_error(err: AccountRegistrationError, email: &str) -> HttpResponse {
    match &err {
        AccountRegistrationError::InvalidEmail => {
            warn!(email = %email, "Invalid registration input");
            ApiResponse::bad_request(err.code(), "Invalid email format")
        }

        AccountRegistrationError::EmailAlreadyExists => {
            warn!(email = %email, "Email already registered");
            ApiResponse::conflict(err.code(), "Email already registered")
        }

        AccountRegistrationError::DatabaseError(detail) => {
            error!(email = %email, error = %detail, "Account registration failed");
            ApiResponse::internal_error()
        }
    }
}

/// Register a new account
///
/// Creates a pending account and emails a single-use verification link.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterAccountRequest,
    responses(
        (
            status = 201,
            description = "Account created",
            body = inline(SuccessResponse<RegisterAccountResponse>),
            example = json!({
                "success": true,
                "data": {
                    "userId": "123e4567-e89b-12d3-a456-426614174000",
                    "email": "jane@example.com",
                    "message": "Account created successfully. Please check your email to verify your account."
                }
            })
        ),
        (
            status = 400,
            description = "Invalid email or malformed body",
            body = ErrorResponse,
            example = json!({
                "success": false,
                "error": { "code": "INVALID_EMAIL", "message": "Invalid email format" }
            })
        ),
        (
            status = 409,
            description = "Email already registered",
            body = ErrorResponse,
            example = json!({
                "success": false,
                "error": { "code": "EMAIL_ALREADY_EXISTS", "message": "Email already registered" }
            })
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[post("/api/auth/register")]
pub async fn register_account_handler(
    req: web::Json<RegisterAccountRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!(email = %req.email, "Account registration attempt");

    match data
        .register_account_orchestrator
        .register_account(&req.email)
        .await
    {
        Ok(output) => ApiResponse::created(RegisterAccountResponse {
            user_id: output.user_id.to_string(),
            email: output.email,
            message: output.message,
        }),
        Err(e) => map_registration_error(e, &req.email),
    }
}
