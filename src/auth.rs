use crate::errors::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::collections::HashMap;

/// Resolves bearer tokens to user ids from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct TokenAuth {
    tokens: HashMap<String, String>,
}

impl TokenAuth {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn user_for(&self, authorization: Option<&str>) -> Result<String, AppError> {
        let header = authorization.ok_or_else(|| AppError::unauthorized("No authorization header"))?;
        let token = bearer_token(header)
            .ok_or_else(|| AppError::unauthorized("Authorization must use the Bearer scheme"))?;

        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("User not authenticated"))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The authenticated caller. Extracting it rejects the request with 401
/// before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        state.auth.user_for(header).map(AuthUser)
    }
}
