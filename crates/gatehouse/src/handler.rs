//! Request handlers for `/auth/*` and the session gate in front of sign-out.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Request, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Response};
use gatehouse_account::{AccountId, AccountStore, PasswordHasher};
use gatehouse_cache::CacheStorage;
use gatehouse_session::{AuthError, SessionAuthenticator, SessionEntry};
use serde::{Deserialize, Serialize};

use crate::cookie::{clear_session_cookie, read_session_cookie, session_cookie};
use crate::error::GatehouseError;

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// `POST /auth/sign-up` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/sign-in` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub name: String,
    pub password: String,
}

/// `{"detail": "..."}`, used for both success messages and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// The validated session, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSession {
    pub session_id: String,
    pub account_id: AccountId,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared router state.
pub(crate) struct ServerState<S, H, C> {
    pub(crate) auth: Arc<SessionAuthenticator<S, H, C>>,
}

// Manual impl: the backends themselves don't need to be `Clone`.
impl<S, H, C> Clone for ServerState<S, H, C> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(crate) async fn sign_up<S, H, C>(
    State(state): State<ServerState<S, H, C>>,
    Json(body): Json<SignUpRequest>,
) -> Result<StatusCode, GatehouseError>
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    state
        .auth
        .sign_up(&body.name, &body.email, &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn sign_in<S, H, C>(
    State(state): State<ServerState<S, H, C>>,
    Json(body): Json<SignInRequest>,
) -> Result<Response, GatehouseError>
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    let signed_in = state.auth.sign_in(&body.name, &body.password).await?;
    let cookie = session_cookie(
        &signed_in.session_id,
        signed_in.secure,
        state.auth.config().ttl_secs,
    );

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(DetailResponse::new("Logged in successfully.")),
    )
        .into_response())
}

pub(crate) async fn sign_out<S, H, C>(
    State(state): State<ServerState<S, H, C>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, GatehouseError>
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    state.auth.sign_out(&current.session_id).await?;
    let cookie = clear_session_cookie(state.auth.config().secure_cookies);

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(DetailResponse::new(format!(
            "Session {} was removed.",
            current.session_id
        ))),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Rejects the request with 401 unless its `session` cookie names a live
/// session. On success the [`CurrentSession`] is available to the handler.
pub(crate) async fn require_session<S, H, C>(
    State(state): State<ServerState<S, H, C>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatehouseError>
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    let session_id =
        read_session_cookie(request.headers()).ok_or(AuthError::Unauthenticated)?;
    let account_id = state.auth.validate_session(&session_id).await?;

    request.extensions_mut().insert(CurrentSession {
        session_id,
        account_id,
    });
    Ok(next.run(request).await)
}
