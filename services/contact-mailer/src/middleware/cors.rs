use axum::http::{HeaderValue, Method};
use contact_relay_utils::{RelayError, RelayResult};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// CORS policy for the configured origins. No origins means any origin.
pub fn cors_layer(origins: &[String]) -> RelayResult<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| {
                RelayError::configuration(format!("CORS_ORIGIN contains an invalid origin: {}", origin))
            })
        })
        .collect::<RelayResult<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
