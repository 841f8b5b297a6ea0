// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::TrackerError;
use std::convert::Infallible;

/// Header carrying the identifier of the user performing the request.
pub const ACTOR_HEADER: &str = "x-user-id";

/// The identified user performing a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Fails with `NotAuthenticated` when no actor is available.
pub fn require(actor: Option<&Actor>) -> Result<&Actor, TrackerError> {
    actor.ok_or(TrackerError::NotAuthenticated)
}

/// Extracts the optional actor from the request headers.
/// Reads never need it, so a missing or blank header is not rejected here.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

impl MaybeActor {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Actor(value.to_string()));

        Ok(MaybeActor(actor))
    }
}
