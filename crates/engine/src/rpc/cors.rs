// CORS configuration for the sync endpoint.
//
// The host page and the engine run on different local origins, so the
// browser preflights the upgrade request. Allowed origins come from the
// `SITEWRIGHT_CORS_ORIGINS` environment variable (comma-separated), with
// permissive localhost defaults for development.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origins allowed when `SITEWRIGHT_CORS_ORIGINS` is unset.
const DEFAULT_DEV_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Environment variable that overrides the allowed origin list.
const CORS_ORIGINS_ENV: &str = "SITEWRIGHT_CORS_ORIGINS";

/// Build a [`CorsLayer`] from the environment. `"*"` allows any origin.
pub fn cors_layer() -> CorsLayer {
    cors_layer_from_env(std::env::var(CORS_ORIGINS_ENV).ok())
}

fn cors_layer_from_env(env_value: Option<String>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    match env_value.as_deref() {
        Some("*") => base.allow_origin(AllowOrigin::any()),
        Some(origins) => base.allow_origin(parse_origins(origins)),
        None => base.allow_origin(parse_origins(&DEFAULT_DEV_ORIGINS.join(","))),
    }
}

fn parse_origins(comma_separated: &str) -> Vec<HeaderValue> {
    comma_separated
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect()
}
