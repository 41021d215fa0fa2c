//! Bearer-token authentication.
//!
//! Tokens are issued elsewhere. The server only knows a fixed table of
//! `token -> user id` pairs handed to it at start-up.

use crate::error::ApiError;
use crate::server::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rxlist_core::{RxListError, UserId};
use std::collections::HashMap;
use std::sync::Arc;

/// Known API tokens and the users they belong to.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, UserId>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `token=user_id` pairs.
    pub fn parse<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, RxListError> {
        let mut registry = Self::new();
        for pair in pairs {
            let (token, user) = pair.split_once('=').ok_or_else(|| RxListError::Config {
                message: format!("API token entry '{}' is not of the form token=user_id", pair),
            })?;
            let user: i64 = user.trim().parse().map_err(|_| RxListError::Config {
                message: format!("API token entry has an invalid user id: '{}'", user),
            })?;
            registry.insert(token.trim(), UserId(user));
        }
        Ok(registry)
    }

    pub fn insert(&mut self, token: impl Into<String>, user: UserId) {
        self.tokens.insert(token.into(), user);
    }

    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| state.tokens.resolve(token.trim()))
            .map(AuthUser)
            .ok_or(ApiError::Core(RxListError::Unauthenticated))
    }
}
