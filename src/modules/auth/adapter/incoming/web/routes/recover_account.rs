use crate::api::schemas::{ErrorResponse, SuccessResponse};
use crate::auth::adapter::incoming::web::extractors::AuthenticatedUser;
use crate::auth::application::domain::entities::Account;
use crate::auth::application::use_cases::recover_account::RecoverAccountError;
use crate::shared::api::ApiResponse;
use crate::AppState;
use actix_web::{post, web, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[schema(example = "123e4567-e89b-12d3-a456-426614174000")]
    pub id: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "active")]
    pub state: String,
    #[schema(example = true)]
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email,
            state: account.state.as_str().to_string(),
            is_active: account.is_active,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RecoverAccountResponse {
    pub account: AccountView,
}

/// Cancel a scheduled account deletion
///
/// Allowed only strictly before the scheduled purge time.
#[utoipa::path(
    post,
    path = "/api/account/recover",
    tag = "account",
    security(("BearerAuth" = [])),
    responses(
        (status = 200, description = "Account recovered", body = inline(SuccessResponse<RecoverAccountResponse>)),
        (
            status = 400,
            description = "Nothing to recover",
            body = ErrorResponse,
            examples(
                ("Not scheduled" = (value = json!({
                    "success": false,
                    "error": { "code": "NOT_SCHEDULED", "message": "Account is not scheduled for deletion" }
                }))),
                ("Expired" = (value = json!({
                    "success": false,
                    "error": { "code": "GRACE_PERIOD_EXPIRED", "message": "Recovery grace period has expired" }
                })))
            )
        ),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[post("/api/account/recover")]
pub async fn recover_account_handler(
    user: AuthenticatedUser,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.recover_account_use_case.execute(user.user_id).await {
        Ok(account) => {
            info!(user_id = %user.user_id, "Account recovered");
            ApiResponse::success(RecoverAccountResponse {
                account: AccountView::from(account),
            })
        }

        Err(e @ RecoverAccountError::NotScheduled) => {
            ApiResponse::bad_request(e.code(), "Account is not scheduled for deletion")
        }

        Err(e @ RecoverAccountError::GracePeriodExpired) => {
            ApiResponse::bad_request(e.code(), "Recovery grace period has expired")
        }

        Err(e @ RecoverAccountError::AccountNotFound) => {
            ApiResponse::not_found(e.code(), "Account not found")
        }

        Err(RecoverAccountError::DatabaseError(detail)) => {
            error!(user_id = %user.user_id, error = %detail, "Account recovery failed");
            ApiResponse::internal_error()
        }
    }
}
