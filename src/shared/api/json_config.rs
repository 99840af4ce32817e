use crate::shared::api::ApiResponse;
use actix_web::web::JsonConfig;
use tracing::warn;

/// Request bodies here are a single short field; anything larger is abuse.
const MAX_JSON_PAYLOAD_BYTES: usize = 4 * 1024;

pub fn custom_json_config() -> JsonConfig {
    JsonConfig::default()
        .limit(MAX_JSON_PAYLOAD_BYTES)
        .error_handler(|err, req| {
            let message = err.to_string();
            warn!(path = %req.path(), error = %message, "Rejected request body");
            actix_web::error::InternalError::from_response(
                err,
                ApiResponse::bad_request("VALIDATION_ERROR", &message),
            )
            .into()
        })
}
