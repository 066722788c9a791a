//! Bearer token verification
//!
//! Three token families reach the API:
//! - HS256 tokens minted by the password login endpoints (`iss = teampulse`)
//! - HS256 Supabase Auth access tokens (`aud = authenticated`)
//! - RS256 Clerk session tokens, checked against the Clerk JWKS
//!
//! [`TokenVerifier`] routes on the header algorithm and tries the HS256 families in turn.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use teampulse_core::models::{AuthProvider, User};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::jwks::ClerkJwtVerifier;
use crate::auth::models::{LegacyClaims, SupabaseClaims, VerifiedIdentity};
use crate::constants::{LEGACY_TOKEN_ISSUER, SUPABASE_TOKEN_AUDIENCE};

/// Result of verifying a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedToken {
    /// Token minted by this server; `sub` is the local user id
    Legacy { user_id: Uuid },
    /// Token from an external identity provider
    External(VerifiedIdentity),
}

/// Issues and checks the tokens handed out by `/api/auth/login` and `/api/auth/register`.
#[derive(Clone)]
pub struct LegacyTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl LegacyTokens {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.expiry_hours);
        let claims = LegacyClaims {
            sub: user.id,
            email: user.email.clone(),
            iss: LEGACY_TOKEN_ISSUER.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<LegacyClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[LEGACY_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        decode::<LegacyClaims>(token, &self.decoding_key, &validation).map(|d| d.claims)
    }
}

/// Checks Supabase Auth access tokens with the project's JWT secret.
#[derive(Clone)]
pub struct SupabaseTokens {
    decoding_key: DecodingKey,
}

impl SupabaseTokens {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SUPABASE_TOKEN_AUDIENCE]);
        let claims = decode::<SupabaseClaims>(token, &self.decoding_key, &validation)?.claims;

        let name = claims
            .user_metadata
            .as_ref()
            .and_then(|m| m.get("full_name").or_else(|| m.get("name")))
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(VerifiedIdentity {
            provider: AuthProvider::Supabase,
            subject: claims.sub,
            email: claims.email,
            name,
            organization: None,
        })
    }
}

/// Verifies any bearer token the API accepts.
#[derive(Clone)]
pub struct TokenVerifier {
    legacy: LegacyTokens,
    supabase: Option<SupabaseTokens>,
    clerk: Option<ClerkJwtVerifier>,
}

impl TokenVerifier {
    pub fn new(
        legacy: LegacyTokens,
        supabase: Option<SupabaseTokens>,
        clerk: Option<ClerkJwtVerifier>,
    ) -> Self {
        Self {
            legacy,
            supabase,
            clerk,
        }
    }

    pub fn legacy(&self) -> &LegacyTokens {
        &self.legacy
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, AppError> {
        let header = decode_header(token)
            .map_err(|_| AppError::Unauthorized("Malformed bearer token".to_string()))?;

        match header.alg {
            Algorithm::RS256 => {
                let clerk = self.clerk.as_ref().ok_or_else(|| {
                    AppError::Unauthorized("Clerk session tokens are not accepted".to_string())
                })?;
                clerk.verify(token).await.map(VerifiedToken::External)
            }
            Algorithm::HS256 => {
                let legacy_err = match self.legacy.verify(token) {
                    Ok(claims) => return Ok(VerifiedToken::Legacy { user_id: claims.sub }),
                    Err(e) => e,
                };

                if let Some(supabase) = &self.supabase {
                    match supabase.verify(token) {
                        Ok(identity) => return Ok(VerifiedToken::External(identity)),
                        Err(e) => tracing::debug!(error = %e, "Not a Supabase token"),
                    }
                }

                match legacy_err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Err(AppError::Unauthorized("Token has expired".to_string()))
                    }
                    _ => Err(AppError::Unauthorized("Invalid token".to_string())),
                }
            }
            other => Err(AppError::Unauthorized(format!(
                "Unsupported token algorithm: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use teampulse_core::models::UserRole;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const SUPABASE_SECRET: &str = "supabase-project-jwt-secret-0123456789";

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            password_hash: None,
            auth_provider: "password".to_string(),
            auth_provider_id: None,
            role: UserRole::Manager,
            organization_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(
            LegacyTokens::new(SECRET, 24),
            Some(SupabaseTokens::new(SUPABASE_SECRET)),
            None,
        )
    }

    fn supabase_token(aud: &str) -> String {
        let claims = json!({
            "sub": "8d5c9a54-0d7e-4c1e-bb43-1f0a6ef3a111",
            "email": "grace@example.com",
            "aud": aud,
            "exp": Utc::now().timestamp() + 600,
            "user_metadata": { "full_name": "Grace Hopper" },
        });
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SUPABASE_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_legacy_token_round_trip() {
        let user = user();
        let verifier = verifier();
        let (token, expires_at) = verifier.legacy().issue(&user).unwrap();
        assert!(expires_at > Utc::now());

        let verified = verifier.verify(&token).await.unwrap();
        assert_eq!(verified, VerifiedToken::Legacy { user_id: user.id });
    }

    #[tokio::test]
    async fn test_supabase_token_maps_to_identity() {
        let verified = verifier().verify(&supabase_token("authenticated")).await.unwrap();
        let VerifiedToken::External(identity) = verified else {
            panic!("expected external identity");
        };
        assert_eq!(identity.provider, AuthProvider::Supabase);
        assert_eq!(identity.email.as_deref(), Some("grace@example.com"));
        assert_eq!(identity.name.as_deref(), Some("Grace Hopper"));
    }

    #[tokio::test]
    async fn test_supabase_token_with_wrong_audience_rejected() {
        let err = verifier().verify(&supabase_token("anon")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_expired_legacy_token() {
        let claims = LegacyClaims {
            sub: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            iss: LEGACY_TOKEN_ISSUER.to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Token has expired"));
    }

    #[tokio::test]
    async fn test_garbage_and_unconfigured_clerk_rejected() {
        assert!(verifier().verify("not.a.jwt").await.is_err());

        // {"alg":"RS256","typ":"JWT"}; the header alone decides the route
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.e30.c2ln";
        let err = verifier().verify(token).await.unwrap_err();
        assert!(
            matches!(err, AppError::Unauthorized(ref m) if m == "Clerk session tokens are not accepted")
        );
    }
}
