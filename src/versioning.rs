//! API version negotiation.
//!
//! Clients pick a version with the `ver` query parameter or the
//! `X-MyCodeCamp-Version` header. Endpoints declare what they support with a
//! [`VersionTable`]; an unspecified version falls back to the configured default.

use std::fmt;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;

use crate::error::ApiError;

pub const VERSION_QUERY_PARAM: &str = "ver";
pub static VERSION_HEADER: HeaderName = HeaderName::from_static("x-mycodecamp-version");
pub static SUPPORTED_VERSIONS_HEADER: HeaderName = HeaderName::from_static("api-supported-versions");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const V1_0: ApiVersion = ApiVersion::new(1, 0);
    pub const V1_1: ApiVersion = ApiVersion::new(1, 1);
    pub const V2_0: ApiVersion = ApiVersion::new(2, 0);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Accepts `major` or `major.minor`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        if major.is_empty() || minor.is_empty() {
            return None;
        }
        if !major.bytes().chain(minor.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(major.parse().ok()?, minor.parse().ok()?))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version named by the request, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedVersion(pub Option<ApiVersion>);

impl RequestedVersion {
    pub fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        let mut raw: Vec<String> = Vec::new();

        if let Some(query) = parts.uri.query() {
            raw.extend(
                url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(k, _)| k.eq_ignore_ascii_case(VERSION_QUERY_PARAM))
                    .map(|(_, v)| v.into_owned()),
            );
        }
        for value in parts.headers.get_all(&VERSION_HEADER) {
            let value = value
                .to_str()
                .map_err(|_| ApiError::unsupported_api_version("The API version header is not valid text"))?;
            raw.extend(value.split(',').map(|v| v.trim().to_string()));
        }

        let mut found: Option<ApiVersion> = None;
        for text in raw.iter().filter(|t| !t.is_empty()) {
            let version = ApiVersion::parse(text).ok_or_else(|| {
                ApiError::unsupported_api_version(format!("The API version '{}' is not valid", text))
            })?;
            match found {
                Some(existing) if existing != version => {
                    return Err(ApiError::unsupported_api_version(
                        "The request specifies more than one API version",
                    ));
                }
                _ => found = Some(version),
            }
        }

        Ok(Self(found))
    }

    /// The version to serve, or 400 when the endpoint does not support it
    pub fn resolve<T>(&self, table: &VersionTable<T>, default: ApiVersion) -> Result<ApiVersion, ApiError> {
        let version = self.0.unwrap_or(default);
        if table.supports(version) {
            Ok(version)
        } else {
            Err(ApiError::unsupported_api_version(format!(
                "The requested API version {} is not supported by this resource; supported: {}",
                version,
                table.supported_header()
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestedVersion
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}

/// Maps each supported version to the value (usually a plain fn) serving it
pub struct VersionTable<T: 'static> {
    entries: &'static [(ApiVersion, T)],
}

impl<T> VersionTable<T> {
    pub const fn new(entries: &'static [(ApiVersion, T)]) -> Self {
        Self { entries }
    }

    pub fn supports(&self, version: ApiVersion) -> bool {
        self.entries.iter().any(|(v, _)| *v == version)
    }

    pub fn select(&self, version: ApiVersion) -> Option<&T> {
        self.entries.iter().find(|(v, _)| *v == version).map(|(_, t)| t)
    }

    pub fn versions(&self) -> impl Iterator<Item = ApiVersion> + '_ {
        self.entries.iter().map(|(v, _)| *v)
    }

    /// Value for the `api-supported-versions` response header
    pub fn supported_header(&self) -> String {
        self.versions().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    }
}
