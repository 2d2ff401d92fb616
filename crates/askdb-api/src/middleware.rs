//! Cross-origin policy: the chat front end on localhost:3000 only.
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

pub fn cors() -> CorsLayer {
    // Credentials forbid a literal `*` for headers, so requested headers are echoed.
    CorsLayer::new()
        .allow_origin(HeaderValue::from_static(ALLOWED_ORIGIN))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
