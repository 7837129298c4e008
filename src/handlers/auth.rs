use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Duration;
use tracing::{error, info, warn};

use crate::api::models::CredentialModel;
use crate::api::JsonBody;
use crate::app::AppState;
use crate::auth::{self, IssuedToken};
use crate::config::SessionConfig;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

const LOGIN_FAILED: &str = "Could not authenticate user";
const TOKEN_FAILED: &str = "Failed to generate token.";

/// Check a username/password pair. Unknown users cost the same bcrypt work
/// as a wrong password.
async fn verify_credentials(state: &AppState, credentials: &CredentialModel) -> anyhow::Result<Option<User>> {
    let Some(user) = state.repo.get_user(&credentials.user_name).await? else {
        state.passwords.verify_absent(&credentials.password).await?;
        return Ok(None);
    };

    if state.passwords.verify(&credentials.password, &user.password_hash).await? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

fn session_cookie(config: &SessionConfig, session_id: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        session_id,
        config.lifetime_minutes * 60
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// POST /api/auth/login - start a cookie session
pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<CredentialModel>,
) -> Result<Response, ApiError> {
    let user = match verify_credentials(&state, &credentials).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Failed login for {}", credentials.user_name);
            return Err(ApiError::bad_request(LOGIN_FAILED));
        }
        Err(e) => {
            error!("Threw an exception in the login process: {:#}", e);
            return Err(ApiError::bad_request(LOGIN_FAILED));
        }
    };

    let config = state.config.snapshot();
    let session_id = state
        .sessions
        .create(&user.username, Duration::minutes(config.sessions.lifetime_minutes))
        .await;
    let cookie = HeaderValue::from_str(&session_cookie(&config.sessions, &session_id)).map_err(|e| {
        error!("Session cookie is not a valid header: {}", e);
        ApiError::bad_request(LOGIN_FAILED)
    })?;

    info!("User {} signed in", user.username);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response())
}

/// POST /api/auth/token - issue a bearer token valid for 15 minutes
pub async fn token(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<CredentialModel>,
) -> ApiResult<IssuedToken> {
    let user = match verify_credentials(&state, &credentials).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Token requested with bad credentials for {}", credentials.user_name);
            return Err(ApiError::bad_request(TOKEN_FAILED));
        }
        Err(e) => {
            error!("Threw an exception in the JWT token creation process: {:#}", e);
            return Err(ApiError::bad_request(TOKEN_FAILED));
        }
    };

    let config = state.config.snapshot();
    let issued = auth::issue_token(&user.username, &config.tokens).map_err(|e| {
        error!("Threw an exception in the JWT token creation process: {}", e);
        ApiError::bad_request(TOKEN_FAILED)
    })?;

    info!("Issued token for {}", user.username);
    Ok(ApiResponse::success(issued))
}
