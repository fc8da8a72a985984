pub mod clean;
pub mod config;

pub use clean::*;
pub use config::*;

use crate::config::MAX_PAYLOAD_CEILING;
use crate::error::AppError;
use crate::health;
use actix_web::web;

/// Room for the JSON wrapper around the base64 payload.
const JSON_ENVELOPE_BYTES: usize = 4096;

/// Largest request body that can carry a payload of `max_payload_bytes`.
pub fn body_limit_for(max_payload_bytes: usize) -> usize {
    max_payload_bytes.div_ceil(3) * 4 + JSON_ENVELOPE_BYTES
}

/// JSON body extraction failures get the same error envelope as everything else.
///
/// The body limit covers the largest payload any valid configuration allows,
/// so oversized audio is reported by payload validation, not here.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(body_limit_for(MAX_PAYLOAD_CEILING))
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid request body: {}", err)).into())
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root_status))
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(health::detailed_metrics))
        .route("/clean-audio", web::post().to(clean_audio))
        .route("/config", web::get().to(get_config))
        .route("/config", web::put().to(update_config));
}

/// Every route is served at the root (existing callers) and under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::scope("/api/v1").configure(routes))
        .configure(routes);
}
