//! Caller identity forwarded by the upstream authentication gateway

use crate::error::AppError;
use crate::models::{Actor, UserRole};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::str::FromStr;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER).ok_or_else(|| {
            AppError::Authentication("missing caller identity".to_string())
        })?;

        let raw_role = header_value(parts, USER_ROLE_HEADER)
            .ok_or_else(|| AppError::Authentication("missing caller role".to_string()))?;

        let role = UserRole::from_str(raw_role)
            .map_err(|_| AppError::Authentication(format!("unknown role '{}'", raw_role)))?;

        Ok(Actor::new(user_id, role))
    }
}

/// Trimmed header value; blank counts as missing
fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<Actor, AppError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_actor() {
        let actor = extract(
            Request::builder()
                .header(USER_ID_HEADER, "u-42")
                .header(USER_ROLE_HEADER, "supervisor"),
        )
        .await
        .unwrap();

        assert_eq!(actor, Actor::new("u-42", UserRole::Supervisor));
    }

    #[tokio::test]
    async fn test_missing_headers_rejected() {
        let err = extract(Request::builder()).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let err = extract(
            Request::builder()
                .header(USER_ID_HEADER, "u-42")
                .header(USER_ROLE_HEADER, "janitor"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
