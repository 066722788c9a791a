//! Organization context middleware
//!
//! Runs after authentication on tenant-scoped routes. Gathers the organization hints of
//! the request, resolves them with [`teampulse_core::org_context`] and attaches the
//! resulting `OrgContext` to the request extensions.

use axum::{
    body::{to_bytes, Body},
    extract::{Query, Request, State},
    http::{header::CONTENT_TYPE, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use teampulse_core::org_context::{self, ORGANIZATION_HEADER};
use teampulse_core::{AppError, OrgContextSources, OrgSelector};

use crate::auth::AuthUser;
use crate::constants::MAX_ORG_CONTEXT_BODY_BYTES;
use crate::error::HttpAppError;
use crate::state::OrgContextState;

const BODY_FIELDS: [&str; 2] = ["organization_id", "organizationId"];

pub async fn org_context_middleware(
    State(state): State<OrgContextState>,
    request: Request,
    next: Next,
) -> Response {
    match resolve(&state, request).await {
        Ok(request) => next.run(request).await,
        Err(e) => HttpAppError(e).into_response(),
    }
}

async fn resolve(state: &OrgContextState, request: Request) -> Result<Request, AppError> {
    let auth = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let mut sources = OrgContextSources {
        header: request
            .headers()
            .get(ORGANIZATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: None,
        query: query_organization(request.uri()),
        user: auth.user.organization_id,
    };

    let mut request = request;
    // the body only matters when the header has not already decided
    if state.flags.enable_organizations && sources.header.is_none() && is_json(&request) {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_ORG_CONTEXT_BODY_BYTES)
            .await
            .map_err(|_| AppError::BadRequest("Request body too large".to_string()))?;
        sources.body = body_organization(&bytes);
        request = Request::from_parts(parts, Body::from(bytes));
    }

    let (selector, source) = org_context::select(&sources, &state.flags)?;
    let organization_id = match selector {
        OrgSelector::Id(id) if state.flags.enable_organizations => state
            .organizations
            .get_by_id(id)
            .await?
            .map(|org| org.id)
            .ok_or_else(|| AppError::OrganizationNotFound(id.to_string()))?,
        OrgSelector::Id(id) => id,
        OrgSelector::External(clerk_id) => state
            .organizations
            .get_by_clerk_id(&clerk_id)
            .await?
            .map(|org| org.id)
            .ok_or(AppError::OrganizationNotFound(clerk_id))?,
    };

    let context = org_context::authorize(
        organization_id,
        source,
        auth.user.organization_id,
        auth.role,
        &state.flags,
    )?;

    tracing::debug!(organization_id = %context.organization_id, source = %context.source, "Organization context resolved");
    request.extensions_mut().insert(context);
    Ok(request)
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

fn query_organization(uri: &Uri) -> Option<String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.get("organization_id").cloned())
}

/// `organization_id` (or `organizationId`) of a JSON object body, as a string.
fn body_organization(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    BODY_FIELDS
        .iter()
        .find_map(|field| value.get(*field))
        .and_then(|v| v.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_organization() {
        let uri: Uri = "/api/teams?limit=5&organization_id=org_2abc".parse().unwrap();
        assert_eq!(query_organization(&uri).as_deref(), Some("org_2abc"));

        let uri: Uri = "/api/teams?limit=5".parse().unwrap();
        assert_eq!(query_organization(&uri), None);
    }

    #[test]
    fn test_body_organization_accepts_both_spellings() {
        assert_eq!(
            body_organization(br#"{"name":"Platform","organization_id":"org_1"}"#).as_deref(),
            Some("org_1")
        );
        assert_eq!(
            body_organization(br#"{"organizationId":"6f1c1b8e-2f3a-4d55-9a51-2c1c8e0a7b10"}"#)
                .as_deref(),
            Some("6f1c1b8e-2f3a-4d55-9a51-2c1c8e0a7b10")
        );
    }

    #[test]
    fn test_body_organization_ignores_non_objects() {
        assert_eq!(body_organization(b"[1,2,3]"), None);
        assert_eq!(body_organization(b"not json"), None);
        assert_eq!(body_organization(br#"{"organization_id": 42}"#), None);
    }
}
