use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use headers::{Cookie, HeaderMapExt};

use crate::app::AppState;
use crate::auth;
use crate::database::models::SUPER_USER_CLAIM;
use crate::error::ApiError;

/// Identity resolved from a bearer token or a session cookie
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser {
    pub username: String,
    pub claims: Vec<String>,
}

impl CurrentUser {
    pub fn has_claim(&self, claim: &str) -> bool {
        self.claims.iter().any(|c| c == claim)
    }

    pub fn is_super_user(&self) -> bool {
        self.has_claim(SUPER_USER_CLAIM)
    }
}

/// Attach a `CurrentUser` to the request when credentials resolve.
///
/// Anonymous requests pass through untouched; handlers decide whether they
/// need an identity through the `RequireUser` / `RequireSuperUser` extractors.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match resolve_user(&state, request.headers()).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => return e.into_response(),
    }
    next.run(request).await
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<CurrentUser>, ApiError> {
    let config = state.config.snapshot();

    let username = if let Some(token) = extract_bearer(headers) {
        match auth::validate_token(token, &config.tokens) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::debug!("Ignoring bearer token: {}", e);
                None
            }
        }
    } else if let Some(session_id) = headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(&config.sessions.cookie_name).map(str::to_string))
    {
        state.sessions.resolve(&session_id).await.map(|s| s.username)
    } else {
        None
    };

    let Some(username) = username else {
        return Ok(None);
    };

    // Claims are read from the store on every request
    match state.repo.get_user(&username).await? {
        Some(user) => Ok(Some(CurrentUser {
            username: user.username,
            claims: user.claims,
        })),
        None => {
            tracing::warn!("Credentials name unknown user {}", username);
            Ok(None)
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Any signed-in user; 401 otherwise
#[derive(Debug, Clone)]
pub struct RequireUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(RequireUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication is required"))
    }
}

/// The `SuperUsers` policy: signed in and holding `SuperUser=True`
#[derive(Debug, Clone)]
pub struct RequireSuperUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSuperUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if user.is_super_user() {
            Ok(RequireSuperUser(user))
        } else {
            Err(ApiError::forbidden("The SuperUsers policy is required"))
        }
    }
}
