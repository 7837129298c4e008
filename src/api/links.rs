use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use once_cell::sync::Lazy;
use url::Url;

use crate::app::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

static LOCALHOST: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").expect("literal URL"));

/// Base URL that self links are resolved against, built once per request
#[derive(Debug, Clone)]
pub struct LinkContext {
    base: Url,
}

impl LinkContext {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Configured public base URL first, then the request's `Host`, then localhost
    pub fn resolve(public_base_url: Option<&str>, headers: &HeaderMap) -> Self {
        if let Some(base) = public_base_url.and_then(|s| Url::parse(s).ok()) {
            return Self::new(base);
        }

        let scheme = headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .filter(|s| matches!(*s, "http" | "https"))
            .unwrap_or("http");
        let base = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .and_then(|host| Url::parse(&format!("{}://{}", scheme, host)).ok())
            .filter(|url| url.path() == "/" && url.query().is_none());

        match base {
            Some(base) => Self::new(base),
            None => Self::localhost(),
        }
    }

    pub fn localhost() -> Self {
        Self::new(LOCALHOST.clone())
    }

    fn link(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    pub fn camp(&self, moniker: &str) -> String {
        self.link(&["api", "camps", moniker])
    }

    pub fn speaker(&self, moniker: &str, id: i32) -> String {
        self.link(&["api", "camps", moniker, "speakers", &id.to_string()])
    }

    pub fn talk(&self, moniker: &str, speaker_id: i32, id: i32) -> String {
        self.link(&[
            "api",
            "camps",
            moniker,
            "speakers",
            &speaker_id.to_string(),
            "talks",
            &id.to_string(),
        ])
    }
}

#[async_trait]
impl FromRequestParts<AppState> for LinkContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let config = state.config.snapshot();
        Ok(Self::resolve(config.server.public_base_url.as_deref(), &parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn links_use_host_header() {
        let links = LinkContext::resolve(None, &headers("localhost:5000"));
        assert_eq!(links.camp("ATL2016"), "http://localhost:5000/api/camps/ATL2016");
        assert_eq!(
            links.talk("ATL2016", 2, 9),
            "http://localhost:5000/api/camps/ATL2016/speakers/2/talks/9"
        );
    }

    #[test]
    fn configured_base_wins_and_keeps_prefix() {
        let links = LinkContext::resolve(Some("https://codecamp.example/v/"), &headers("internal:8080"));
        assert_eq!(
            links.speaker("ATL2016", 4),
            "https://codecamp.example/v/api/camps/ATL2016/speakers/4"
        );
    }

    #[test]
    fn forwarded_https_is_honoured() {
        let mut h = headers("codecamp.example");
        h.insert(FORWARDED_PROTO, HeaderValue::from_static("https"));
        let links = LinkContext::resolve(None, &h);
        assert_eq!(links.camp("X"), "https://codecamp.example/api/camps/X");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let links = LinkContext::localhost();
        assert_eq!(links.camp("a b/c"), "http://localhost/api/camps/a%20b%2Fc");
    }

    #[test]
    fn bad_host_falls_back_to_localhost() {
        let links = LinkContext::resolve(None, &headers("bad host"));
        assert_eq!(links.camp("X"), "http://localhost/api/camps/X");
    }
}
