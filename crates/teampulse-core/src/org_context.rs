//! Organization context resolution
//!
//! Every tenant-scoped request runs against exactly one organization. The candidate comes
//! from, in order: the `X-Organization-Id` header, an `organization_id` field in the JSON
//! body, the `organization_id` query parameter and finally the caller's own organization.
//! With multi-tenancy disabled the configured default organization is used instead and
//! the sources are ignored.
//!
//! Resolution is split in two so the lookup of external (Clerk) ids can stay in the
//! caller: [`select`] picks the candidate, [`authorize`] checks the caller may use it.

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use crate::flags::FeatureFlags;
use crate::models::UserRole;
use crate::AppError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Raw organization hints gathered from a request
#[derive(Debug, Clone, Default)]
pub struct OrgContextSources {
    pub header: Option<String>,
    pub body: Option<String>,
    pub query: Option<String>,
    pub user: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgSource {
    Default,
    Header,
    Body,
    Query,
    User,
}

impl Display for OrgSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            OrgSource::Default => "default",
            OrgSource::Header => "header",
            OrgSource::Body => "body",
            OrgSource::Query => "query",
            OrgSource::User => "user",
        };
        write!(f, "{}", s)
    }
}

/// How the chosen organization is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgSelector {
    /// Local organization UUID
    Id(Uuid),
    /// Identity-provider organization id such as `org_2abc...`
    External(String),
}

impl OrgSelector {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Uuid::parse_str(raw) {
            Ok(id) => OrgSelector::Id(id),
            Err(_) => OrgSelector::External(raw.to_string()),
        }
    }
}

/// Organization a request runs against, attached to request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgContext {
    pub organization_id: Uuid,
    pub source: OrgSource,
}

/// Pick the organization candidate.
///
/// Blank values are skipped. Returns `BadRequest` when multi-tenancy is on and no source
/// names an organization.
pub fn select(
    sources: &OrgContextSources,
    flags: &FeatureFlags,
) -> Result<(OrgSelector, OrgSource), AppError> {
    if !flags.enable_organizations {
        return Ok((
            OrgSelector::Id(flags.default_organization_id),
            OrgSource::Default,
        ));
    }

    let candidates = [
        (sources.header.as_deref(), OrgSource::Header),
        (sources.body.as_deref(), OrgSource::Body),
        (sources.query.as_deref(), OrgSource::Query),
    ];
    for (value, source) in candidates {
        if let Some(raw) = value.filter(|v| !v.trim().is_empty()) {
            return Ok((OrgSelector::parse(raw), source));
        }
    }

    match sources.user {
        Some(id) => Ok((OrgSelector::Id(id), OrgSource::User)),
        None => Err(AppError::BadRequest(
            "Organization context required".to_string(),
        )),
    }
}

/// Check that a caller with `role` (already the effective role) and home organization
/// `user_organization` may act on `organization_id`.
pub fn authorize(
    organization_id: Uuid,
    source: OrgSource,
    user_organization: Option<Uuid>,
    role: UserRole,
    flags: &FeatureFlags,
) -> Result<OrgContext, AppError> {
    let context = OrgContext {
        organization_id,
        source,
    };

    if !flags.enable_organizations || role.is_admin() {
        return Ok(context);
    }

    if user_organization == Some(organization_id) {
        Ok(context)
    } else {
        Err(AppError::Forbidden(
            "Access to this organization is not allowed".to_string(),
        ))
    }
}
