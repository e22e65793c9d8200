//! Request extractors: bearer authentication and JSON bodies

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::providers::Caller;
use crate::server::state::AppState;

/// The caller behind `Authorization: Bearer <token>`
///
/// Rejects with 401 when the header is missing, malformed or unknown.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Caller);

/// A caller allowed to upload documents
///
/// Any caller that is not a known admin, including one with no credential,
/// is rejected with 403.
#[derive(Debug, Clone)]
pub struct Admin(pub Caller);

/// Token from a `Bearer` authorization value; the scheme is case-insensitive
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(Error::Unauthorized)?;

        match state.authorizer().authenticate(token).await? {
            Some(caller) => {
                tracing::debug!(uid = %caller.uid, role = %caller.role, "Authenticated");
                Ok(Self(caller))
            }
            None => Err(Error::Unauthorized),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match Authenticated::from_request_parts(parts, state).await {
            Ok(Authenticated(caller)) if caller.is_privileged() => Ok(Self(caller)),
            Ok(Authenticated(caller)) => {
                tracing::warn!(uid = %caller.uid, role = %caller.role, "Upload refused");
                Err(Error::Forbidden)
            }
            Err(Error::Unauthorized) => Err(Error::Forbidden),
            Err(e) => Err(e),
        }
    }
}

/// `Json` whose rejections render as the crate's 400 error body
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
        Ok(Self(value))
    }
}
