use crate::api::schemas::{ErrorResponse, SuccessResponse};
use crate::auth::adapter::incoming::web::extractors::AuthenticatedUser;
use crate::auth::application::use_cases::soft_delete_user::SoftDeleteUserError;
use crate::shared::api::ApiResponse;
use crate::AppState;
use actix_web::{delete, web, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountResponse {
    /// When the account will be purged
    #[schema(value_type = String, example = "2026-02-01T12:00:00Z")]
    pub scheduled_deletion_at: DateTime<Utc>,

    #[schema(example = 30)]
    pub days_remaining: i64,
}

/// Schedule the caller's account for deletion
///
/// The account is deactivated immediately and purged after the grace period
/// unless it is recovered first.
#[utoipa::path(
    delete,
    path = "/api/account",
    tag = "account",
    security(("BearerAuth" = [])),
    responses(
        (
            status = 200,
            description = "Deletion scheduled",
            body = inline(SuccessResponse<DeleteAccountResponse>),
            example = json!({
                "success": true,
                "data": { "scheduledDeletionAt": "2026-02-01T12:00:00Z", "daysRemaining": 30 }
            })
        ),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (
            status = 409,
            description = "Deletion already scheduled",
            body = ErrorResponse,
            example = json!({
                "success": false,
                "error": {
                    "code": "DELETION_ALREADY_SCHEDULED",
                    "message": "Account deletion is already scheduled"
                }
            })
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[delete("/api/account")]
pub async fn delete_account_handler(
    user: AuthenticatedUser,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.soft_delete_user_use_case.execute(user.user_id).await {
        Ok(scheduled) => {
            info!(
                user_id = %user.user_id,
                scheduled_at = %scheduled.scheduled_at,
                "Account deletion scheduled"
            );
            ApiResponse::success(DeleteAccountResponse {
                scheduled_deletion_at: scheduled.scheduled_at,
                days_remaining: scheduled.days_remaining,
            })
        }

        Err(e @ SoftDeleteUserError::AccountNotFound) => {
            ApiResponse::not_found(e.code(), "Account not found")
        }

        Err(e @ SoftDeleteUserError::DeletionAlreadyScheduled) => {
            ApiResponse::conflict(e.code(), "Account deletion is already scheduled")
        }

        Err(SoftDeleteUserError::DatabaseError(detail)) => {
            error!(user_id = %user.user_id, error = %detail, "Scheduling account deletion failed");
            ApiResponse::internal_error()
        }
    }
}
