//! Request identity.
//!
//! Sign-in and sessions belong to the external identity provider. The proxy
//! in front of this server forwards the signed-in user's provider id in the
//! `x-user-id` header; these extractors turn that into a user.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::User;
use crate::store::StoreError;
use crate::AppState;

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required.")]
    MissingIdentity,
    #[error("Invalid user id header.")]
    InvalidIdentity,
    #[error("Complete onboarding before posting.")]
    NotOnboarded,
    #[error("Failed to load user: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingIdentity | AuthError::InvalidIdentity => StatusCode::UNAUTHORIZED,
            AuthError::NotOnboarded => StatusCode::FORBIDDEN,
            AuthError::Store(e) => {
                error!(error = %e, "Failed to load authenticated user");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load user").into_response();
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// The caller's identity-provider id. Does not require a user record.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(&USER_ID_HEADER)
            .ok_or(AuthError::MissingIdentity)?;
        let auth_id = value
            .to_str()
            .map_err(|_| AuthError::InvalidIdentity)?
            .trim();
        if auth_id.is_empty() {
            return Err(AuthError::InvalidIdentity);
        }
        Ok(AuthenticatedUser(auth_id.to_string()))
    }
}

/// A caller with a completed profile.
#[derive(Debug, Clone)]
pub struct OnboardedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for OnboardedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(auth_id) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        match app_state.store.get_user_by_auth_id(&auth_id).await? {
            Some(user) if user.onboarded => Ok(OnboardedUser(user)),
            _ => {
                warn!(auth_id = %auth_id, "Request from user who has not onboarded");
                Err(AuthError::NotOnboarded)
            }
        }
    }
}
