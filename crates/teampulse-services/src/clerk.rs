//! Clerk backend API client
//!
//! Used for the identity-provider side of invitations and for reading user profiles when
//! a Clerk session belongs to a user we have not seen yet.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use teampulse_core::AppError;
use uuid::Uuid;

const SERVICE: &str = "clerk";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Profile data needed to provision a local user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

/// External invitation to create alongside the local row
#[derive(Debug, Clone)]
pub struct ExternalInvitation {
    pub email: String,
    pub redirect_url: Option<String>,
    pub metadata: JsonValue,
    pub clerk_organization_id: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create the invitation and return its provider id.
    async fn create_invitation(&self, invitation: ExternalInvitation) -> Result<String, AppError>;

    async fn revoke_invitation(
        &self,
        external_id: &str,
        clerk_organization_id: Option<&str>,
    ) -> Result<(), AppError>;

    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, AppError>;
}

pub struct ClerkClient {
    http_client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl Debug for ClerkClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClerkClient")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CreateInvitationBody<'a> {
    email_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<&'a str>,
    public_metadata: &'a JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct InvitationResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    primary_email_address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl ClerkUser {
    fn into_identity(self) -> Result<IdentityUser, AppError> {
        let primary = self
            .primary_email_address_id
            .as_deref()
            .and_then(|pid| self.email_addresses.iter().find(|e| e.id == pid))
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
            .ok_or_else(|| AppError::external(SERVICE, None, "Clerk user has no email address"))?;

        let name = match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        };

        Ok(IdentityUser {
            id: self.id,
            email: primary,
            name,
        })
    }
}

impl ClerkClient {
    pub fn new(api_url: &str, secret_key: &str) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client for Clerk: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::external(SERVICE, None, format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), body = %error_text, "Clerk API request failed");
        Err(AppError::external(
            SERVICE,
            Some(status.as_u16()),
            format!("Clerk API request failed: {}", status),
        ))
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    #[tracing::instrument(skip(self, invitation), fields(org = ?invitation.clerk_organization_id))]
    async fn create_invitation(&self, invitation: ExternalInvitation) -> Result<String, AppError> {
        let (url, role) = match invitation.clerk_organization_id.as_deref() {
            Some(org_id) => (
                format!("{}/organizations/{}/invitations", self.api_url, org_id),
                Some("org:member"),
            ),
            None => (format!("{}/invitations", self.api_url), None),
        };

        let body = CreateInvitationBody {
            email_address: &invitation.email,
            redirect_url: invitation.redirect_url.as_deref(),
            public_metadata: &invitation.metadata,
            role,
        };

        let response = self.send(self.http_client.post(url).json(&body)).await?;
        let parsed: InvitationResponse = response.json().await.map_err(|e| {
            AppError::external(SERVICE, None, format!("Invalid invitation response: {}", e))
        })?;

        tracing::debug!(external_id = %parsed.id, "Clerk invitation created");
        Ok(parsed.id)
    }

    #[tracing::instrument(skip(self))]
    async fn revoke_invitation(
        &self,
        external_id: &str,
        clerk_organization_id: Option<&str>,
    ) -> Result<(), AppError> {
        let url = match clerk_organization_id {
            Some(org_id) => format!(
                "{}/organizations/{}/invitations/{}/revoke",
                self.api_url, org_id, external_id
            ),
            None => format!("{}/invitations/{}/revoke", self.api_url, external_id),
        };

        self.send(self.http_client.post(url)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, AppError> {
        let url = format!("{}/users/{}", self.api_url, user_id);
        let response = self.send(self.http_client.get(url)).await?;
        let user: ClerkUser = response.json().await.map_err(|e| {
            AppError::external(SERVICE, None, format!("Invalid user response: {}", e))
        })?;
        user.into_identity()
    }
}

/// Stand-in used when Clerk is not configured. Invitations only exist locally.
#[derive(Debug, Default, Clone)]
pub struct NoopIdentityProvider;

#[async_trait]
impl IdentityProvider for NoopIdentityProvider {
    async fn create_invitation(&self, invitation: ExternalInvitation) -> Result<String, AppError> {
        let id = format!("local_{}", Uuid::new_v4().simple());
        tracing::debug!(email = %invitation.email, external_id = %id, "Identity provider disabled; invitation kept local");
        Ok(id)
    }

    async fn revoke_invitation(
        &self,
        external_id: &str,
        _clerk_organization_id: Option<&str>,
    ) -> Result<(), AppError> {
        tracing::debug!(external_id, "Identity provider disabled; nothing to revoke");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, AppError> {
        Err(AppError::Unauthorized(format!(
            "Unknown identity {} and no identity provider configured",
            user_id
        )))
    }
}
