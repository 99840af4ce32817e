pub mod modules;
pub use modules::auth;
pub use modules::email;
pub mod health;
pub mod shared;
mod api;

// Test helpers module - only compiled with feature flag
#[cfg(feature = "test-helpers")]
mod test_helpers;

use crate::api::openapi::ApiDoc;
use crate::auth::adapter::outgoing::jwt::{JwtAccessTokenVerifier, JwtConfig};
use crate::auth::adapter::outgoing::{
    AccountRepositoryPostgres, PendingDeletionRepositoryPostgres, SystemClock,
    VerificationTokenRepositoryPostgres,
};
use crate::auth::application::orchestrator::account_registration::AccountRegistrationOrchestrator;
use crate::auth::application::ports::outgoing::{
    AccountRepository, Clock, PendingDeletionRepository, TokenProvider,
    VerificationTokenRepository,
};
use crate::auth::application::use_cases::{
    issue_verification_token::{IssueVerificationTokenService, IssueVerificationTokenUseCase},
    recover_account::{RecoverAccountService, RecoverAccountUseCase},
    resend_verification::{ResendVerificationService, ResendVerificationUseCase},
    soft_delete_user::{SoftDeleteUserService, SoftDeleteUserUseCase},
    verify_user_email::{VerifyUserEmailService, VerifyUserEmailUseCase},
};
use crate::email::adapter::outgoing::SmtpEmailSender;
use crate::email::application::ports::outgoing::UserEmailNotifier;
use crate::email::application::services::{BackgroundNotifier, UserEmailService};
use crate::shared::config::AppConfig;

use actix_web::{web, App, HttpServer};
use sea_orm::{ConnectOptions, Database};
use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub register_account_orchestrator: Arc<AccountRegistrationOrchestrator>,
    pub issue_verification_token_use_case: Arc<dyn IssueVerificationTokenUseCase>,
    pub verify_user_email_use_case: Arc<dyn VerifyUserEmailUseCase>,
    pub resend_verification_use_case: Arc<dyn ResendVerificationUseCase>,
    pub soft_delete_user_use_case: Arc<dyn SoftDeleteUserUseCase>,
    pub recover_account_use_case: Arc<dyn RecoverAccountUseCase>,
}

#[actix_web::main]
#[cfg(not(tarpaulin_include))]
async fn start() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting application...");

    // 🚨 SAFETY GUARD: Prevent test-helpers in production
    #[cfg(feature = "test-helpers")]
    {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        if env == "production" {
            return Err(io::Error::other(
                "test-helpers feature enabled in production environment",
            ));
        }
        tracing::warn!(
            "⚠️  Test helper routes are ENABLED for environment: {}",
            env
        );
    }

    // Try .env.{environment} first, then fall back to .env
    let rust_env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
    let env_file = format!(".env.{}", rust_env);
    if dotenvy::from_filename(&env_file).is_err() {
        dotenvy::dotenv().ok();
    }

    let config = AppConfig::from_env().map_err(|e| io::Error::other(e.to_string()))?;

    // SMTP
    let smtp_sender = SmtpEmailSender::from_config(&config.smtp, &config.email_from)
        .map_err(|e| io::Error::other(format!("Invalid SMTP configuration: {}", e)))?;

    let server_url = config.server_url();
    info!(server_url = %server_url, environment = %config.rust_env, "Configuration loaded");

    // Database connection
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(50)
        .min_connections(10)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let conn = Database::connect(opt)
        .await
        .map_err(|e| io::Error::other(format!("Failed to connect to database: {}", e)))?;

    let db_arc = Arc::new(conn);

    // Adapters
    let accounts: Arc<dyn AccountRepository> =
        Arc::new(AccountRepositoryPostgres::new(Arc::clone(&db_arc)));
    let tokens: Arc<dyn VerificationTokenRepository> =
        Arc::new(VerificationTokenRepositoryPostgres::new(Arc::clone(&db_arc)));
    let deletions: Arc<dyn PendingDeletionRepository> =
        Arc::new(PendingDeletionRepositoryPostgres::new(Arc::clone(&db_arc)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let user_email_service = UserEmailService::new(Arc::new(smtp_sender), &config.app_base_url);
    let notifier: Arc<dyn UserEmailNotifier> =
        Arc::new(BackgroundNotifier::new(Arc::new(user_email_service)));

    // Use cases
    let retry = config.retry_policy();

    let issue_verification_token: Arc<dyn IssueVerificationTokenUseCase> =
        Arc::new(IssueVerificationTokenService::new(
            Arc::clone(&accounts),
            Arc::clone(&tokens),
            Arc::clone(&notifier),
            Arc::clone(&clock),
            config.token_policy(),
            retry,
        ));

    let register_account_orchestrator = AccountRegistrationOrchestrator::new(
        Arc::clone(&accounts),
        Arc::clone(&issue_verification_token),
    );

    let verify_user_email_use_case =
        VerifyUserEmailService::new(Arc::clone(&tokens), Arc::clone(&clock), retry);

    let resend_verification_use_case = ResendVerificationService::new(
        Arc::clone(&accounts),
        Arc::clone(&tokens),
        Arc::clone(&notifier),
        Arc::clone(&clock),
        config.token_policy(),
        config.resend_policy(),
        retry,
    );

    let soft_delete_user_use_case = SoftDeleteUserService::new(
        Arc::clone(&accounts),
        Arc::clone(&deletions),
        Arc::clone(&clock),
        config.deletion_policy(),
        retry,
    );

    let recover_account_use_case =
        RecoverAccountService::new(Arc::clone(&deletions), Arc::clone(&clock), retry);

    let state = AppState {
        register_account_orchestrator: Arc::new(register_account_orchestrator),
        issue_verification_token_use_case: issue_verification_token,
        verify_user_email_use_case: Arc::new(verify_user_email_use_case),
        resend_verification_use_case: Arc::new(resend_verification_use_case),
        soft_delete_user_use_case: Arc::new(soft_delete_user_use_case),
        recover_account_use_case: Arc::new(recover_account_use_case),
    };

    let token_provider_arc: Arc<dyn TokenProvider + Send + Sync> = Arc::new(
        JwtAccessTokenVerifier::new(JwtConfig::from_app_config(&config)),
    );
    // Clone db_arc for use in HttpServer closure
    let db_for_server = Arc::clone(&db_arc);
    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        #[allow(unused_mut)]
        let mut app = App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(Arc::clone(&token_provider_arc)))
            .app_data(web::Data::new(Arc::clone(&db_for_server)))
            .app_data(crate::shared::api::custom_json_config())
            .configure(init_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            );

        // Conditionally add test routes
        #[cfg(feature = "test-helpers")]
        {
            app = app.configure(test_helpers::configure_routes);
        }

        app
    })
    .bind(server_url)?
    .run()
    .await
}

#[cfg(not(tarpaulin_include))]
fn init_routes(cfg: &mut web::ServiceConfig) {
    // Health
    cfg.service(crate::health::health);
    cfg.service(crate::health::readiness);
    // Auth
    cfg.service(crate::auth::adapter::incoming::web::routes::register_account_handler);
    cfg.service(crate::auth::adapter::incoming::web::routes::verify_email_handler);
    cfg.service(crate::auth::adapter::incoming::web::routes::resend_verification_handler);
    // Account
    cfg.service(crate::auth::adapter::incoming::web::routes::delete_account_handler);
    cfg.service(crate::auth::adapter::incoming::web::routes::recover_account_handler);
}

#[cfg(not(tarpaulin_include))]
fn main() {
    if let Err(e) = start() {
        eprintln!("Error starting app: {e}");
    }
}
