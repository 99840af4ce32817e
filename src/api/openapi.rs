use crate::api::schemas::{ErrorDetail, ErrorResponse, SuccessResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::auth::adapter::incoming::web::routes::{
    AccountView, DeleteAccountResponse, RecoverAccountResponse, RegisterAccountRequest,
    RegisterAccountResponse, ResendVerificationResponse, VerifyEmailRequest, VerifyEmailResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account Lifecycle API",
        version = "1.0.0",
        description = "Email verification and account deletion lifecycle"
    ),
    paths(
        // Auth endpoints
        crate::auth::adapter::incoming::web::routes::register_account_handler,
        crate::auth::adapter::incoming::web::routes::verify_email_handler,
        crate::auth::adapter::incoming::web::routes::resend_verification_handler,

        // Account endpoints
        crate::auth::adapter::incoming::web::routes::delete_account_handler,
        crate::auth::adapter::incoming::web::routes::recover_account_handler,
    ),
    components(
        schemas(
            // Response wrappers
            SuccessResponse<RegisterAccountResponse>,
            ErrorResponse,
            ErrorDetail,

            // Auth DTOs
            RegisterAccountRequest,
            RegisterAccountResponse,
            VerifyEmailRequest,
            VerifyEmailResponse,
            ResendVerificationResponse,

            // Account DTOs
            DeleteAccountResponse,
            RecoverAccountResponse,
            AccountView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and email verification"),
        (name = "account", description = "Account deletion and recovery"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token issued by the authentication service"))
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/auth/register",
            "/api/auth/verify-email",
            "/api/auth/resend-verification",
            "/api/account",
            "/api/account/recover",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components should exist");

        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
