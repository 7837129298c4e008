use std::sync::Arc;

use axum::http::{header, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::{ConfigHandle, CorsConfig};

/// Cross-origin policy for the camps endpoints: any origin may read, only
/// the configured writer origins may POST. Origins are read from the live
/// configuration on every request.
pub fn camp_cors(config: Arc<ConfigHandle>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, parts: &Parts| {
            is_allowed(&config.snapshot().cors, origin, effective_method(parts))
        }))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// For a preflight this is the method the browser intends to send
fn effective_method(parts: &Parts) -> Method {
    if parts.method == Method::OPTIONS {
        if let Some(requested) = parts
            .headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|v| Method::from_bytes(v.as_bytes()).ok())
        {
            return requested;
        }
    }
    parts.method.clone()
}

pub fn is_allowed(cors: &CorsConfig, origin: &HeaderValue, method: Method) -> bool {
    match method {
        Method::GET | Method::HEAD => true,
        Method::POST => cors
            .camp_writer_origins
            .iter()
            .any(|allowed| allowed.as_bytes() == origin.as_bytes()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn cors() -> CorsConfig {
        CorsConfig {
            camp_writer_origins: vec!["http://wildermuth.com".into()],
        }
    }

    #[test]
    fn any_origin_may_read() {
        let origin = HeaderValue::from_static("http://random.example");
        assert!(is_allowed(&cors(), &origin, Method::GET));
        assert!(!is_allowed(&cors(), &origin, Method::POST));
        assert!(!is_allowed(&cors(), &origin, Method::DELETE));
    }

    #[test]
    fn writer_origin_may_post() {
        let origin = HeaderValue::from_static("http://wildermuth.com");
        assert!(is_allowed(&cors(), &origin, Method::POST));
        assert!(!is_allowed(&cors(), &origin, Method::PUT));
    }

    #[test]
    fn preflight_uses_requested_method() {
        let (parts, _) = Request::builder()
            .method(Method::OPTIONS)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(effective_method(&parts), Method::POST);
    }
}
