//! Clerk session-token validation (RS256 against the instance JWKS)
//!
//! Keys are fetched from the configured JWKS URL on demand and cached per `kid` for
//! [`JWKS_CACHE_TTL_SECS`]. An unknown `kid` triggers a refetch, which picks up rotated keys.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use teampulse_core::models::AuthProvider;
use teampulse_core::AppError;
use tokio::sync::RwLock;

use crate::auth::models::{ClerkClaims, VerifiedIdentity};
use crate::constants::JWKS_CACHE_TTL_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

/// Validates Clerk session tokens
#[derive(Clone)]
pub struct ClerkJwtVerifier {
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
}

impl ClerkJwtVerifier {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: JWKS_CACHE_TTL_SECS,
        }
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::external("clerk", None, format!("JWKS request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external(
                "clerk",
                Some(status.as_u16()),
                "JWKS endpoint returned an error",
            ));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| AppError::external("clerk", None, format!("Invalid JWKS document: {}", e)))
    }

    fn to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        if jwk.kty != "RSA" {
            return Err(AppError::Unauthorized(format!(
                "Unsupported key type: {}",
                jwk.kty
            )));
        }
        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            return Err(AppError::Unauthorized(
                "RSA key is missing modulus or exponent".to_string(),
            ));
        };
        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| AppError::Unauthorized(format!("Invalid RSA key: {}", e)))
    }

    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        tracing::debug!(kid = ?kid, "Fetching Clerk JWKS");
        let jwks = self.fetch_jwks().await?;
        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.kid.as_deref() == Some(kid))
                .ok_or_else(|| AppError::Unauthorized(format!("Unknown signing key {}", kid)))?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| AppError::Unauthorized("JWKS contains no keys".to_string()))?,
        };
        let key = Self::to_decoding_key(jwk)?;

        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key: key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
            },
        );

        Ok(key)
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let key = self.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_nbf = true;
        validation.leeway = 5;
        // Clerk session tokens carry `azp` rather than `aud`
        validation.validate_aud = false;

        let data = decode::<ClerkClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Clerk token rejected");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid session token".to_string()),
            }
        })?;

        Ok(VerifiedIdentity {
            provider: AuthProvider::Clerk,
            subject: data.claims.sub,
            email: data.claims.email,
            name: None,
            organization: data.claims.org_id,
        })
    }
}
