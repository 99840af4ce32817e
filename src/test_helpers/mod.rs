use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::adapter::outgoing::AccountRepositoryPostgres;
use crate::auth::application::domain::entities::UserId;
use crate::auth::application::ports::outgoing::{AccountRepository, TokenClaims};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAccountResponse {
    user_id: Uuid,
    email: String,
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTokenResponse {
    token: String,
    expires_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    deleted_tokens: u64,
    deleted_pending_deletions: u64,
    deleted_users: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    environment: String,
}

fn random_email() -> String {
    let ts = Utc::now().timestamp();
    let suffix: String = (0..6)
        .map(|_| format!("{:x}", rand::random::<u8>() % 16))
        .collect();
    format!("user{}.{}@example.test", ts, suffix)
}

fn sign_access_token(user_id: Uuid) -> Result<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| actix_web::error::ErrorInternalServerError("JWT_SECRET is not set"))?;
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id,
        exp: now + 3600,
        iat: now,
        nbf: now,
        token_type: "access".to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        actix_web::error::ErrorInternalServerError(format!("Token encoding error: {}", e))
    })
}

/// Create a pending account and an access token for it
/// POST /test/accounts
pub async fn create_test_account(
    body: Option<web::Json<CreateAccountRequest>>,
    db: web::Data<Arc<DatabaseConnection>>,
) -> Result<HttpResponse> {
    let email = body
        .and_then(|b| b.into_inner().email)
        .unwrap_or_else(random_email)
        .to_lowercase();

    let accounts = AccountRepositoryPostgres::new(Arc::clone(db.get_ref()));
    let account = accounts
        .create_account(&email)
        .await
        .map_err(actix_web::error::ErrorConflict)?;

    let access_token = sign_access_token(account.id.value())?;

    Ok(HttpResponse::Created().json(TestAccountResponse {
        user_id: account.id.value(),
        email: account.email,
        access_token,
    }))
}

/// Issue a verification token and return its plaintext
/// POST /test/accounts/{user_id}/verification-token
pub async fn issue_test_token(
    user_id: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = UserId::from(user_id.into_inner());

    match data.issue_verification_token_use_case.execute(user_id).await {
        Ok(issued) => Ok(HttpResponse::Ok().json(TestTokenResponse {
            token: issued.plaintext.expose().to_string(),
            expires_at: issued.expires_at,
        })),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.code(),
            "message": e.to_string()
        }))),
    }
}

/// Remove an account and every row that references it
/// DELETE /test/cleanup/{user_id}
pub async fn cleanup_test_account(
    user_id: web::Path<Uuid>,
    db: web::Data<Arc<DatabaseConnection>>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();

    let txn = db.as_ref().begin().await.map_err(|e| {
        actix_web::error::ErrorInternalServerError(format!("Transaction error: {}", e))
    })?;

    let delete = |sql: &'static str| {
        Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, vec![user_id.into()])
    };

    let tokens = txn
        .execute(delete("DELETE FROM verification_tokens WHERE user_id = $1"))
        .await
        .map_err(|e| {
            actix_web::error::ErrorInternalServerError(format!("Failed to delete tokens: {}", e))
        })?;

    let deletions = txn
        .execute(delete(
            "DELETE FROM pending_deletions WHERE entity_type = 'account' AND entity_id = $1",
        ))
        .await
        .map_err(|e| {
            actix_web::error::ErrorInternalServerError(format!(
                "Failed to delete pending deletions: {}",
                e
            ))
        })?;

    let users = txn
        .execute(delete("DELETE FROM users WHERE id = $1"))
        .await
        .map_err(|e| {
            actix_web::error::ErrorInternalServerError(format!("Failed to delete user: {}", e))
        })?;

    if users.rows_affected() == 0 {
        txn.rollback().await.ok();
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found"
        })));
    }

    txn.commit()
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Commit failed: {}", e)))?;

    Ok(HttpResponse::Ok().json(CleanupResponse {
        deleted_tokens: tokens.rows_affected(),
        deleted_pending_deletions: deletions.rows_affected(),
        deleted_users: users.rows_affected(),
    }))
}

/// Health check for test helpers
/// GET /test/health
pub async fn health_check() -> Result<HttpResponse> {
    let env = std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());

    if env == "production" {
        tracing::error!("🚨 Test helper routes active in production!");
        return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "error",
            "reason": "test-helper-running-in-production"
        })));
    }

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        environment: env,
    }))
}

/// Configure test helper routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/test")
            .route("/health", web::get().to(health_check))
            .route("/accounts", web::post().to(create_test_account))
            .route(
                "/accounts/{user_id}/verification-token",
                web::post().to(issue_test_token),
            )
            .route("/cleanup/{user_id}", web::delete().to(cleanup_test_account)),
    );
}
