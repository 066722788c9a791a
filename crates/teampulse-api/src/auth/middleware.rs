use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teampulse_core::AppError;
use tokio::sync::Mutex;

use crate::auth::identity::IdentityResolver;
use crate::auth::jwt::TokenVerifier;
use crate::auth::models::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::InvitationService;
use crate::utils::ip_extraction::extract_client_ip;

/// Upper bound on tracked client IPs before expired entries are swept.
const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Counts failed authentication attempts per client IP in a fixed window.
#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
    max_entries: usize,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window: Duration::from_secs(window_seconds),
            max_entries: DEFAULT_MAX_TRACKED_CLIENTS,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Record a failure; returns true once the IP has reached the limit.
    pub async fn record_failure(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();

        if !guard.contains_key(ip) && guard.len() >= self.max_entries {
            guard.retain(|_ip, (_, reset_at)| *reset_at > now);

            if guard.len() >= self.max_entries {
                let oldest = guard
                    .iter()
                    .min_by_key(|(_, (_, reset_at))| *reset_at)
                    .map(|(ip, _)| ip.clone());
                if let Some(oldest) = oldest {
                    guard.remove(&oldest);
                    tracing::debug!(
                        evicted_ip = %oldest,
                        tracked = guard.len(),
                        "Evicted oldest auth failure entry due to capacity limit"
                    );
                }
            }
        }

        let (count, reset_at) = guard
            .entry(ip.to_string())
            .or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        *count += 1;
        *count >= self.max_failures
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_blocked(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if let Some((count, reset_at)) = guard.get(ip) {
            if Instant::now() >= *reset_at {
                guard.remove(ip);
                return false;
            }
            return *count >= self.max_failures;
        }
        false
    }
}

pub struct AuthState {
    pub verifier: TokenVerifier,
    pub identities: IdentityResolver,
    pub invitations: InvitationService,
    pub failure_limiter: Option<Arc<AuthFailureLimiter>>,
    pub trusted_proxy_count: usize,
    pub admin_enabled: bool,
}

impl AuthState {
    /// Count the failure against the client and build the rejection.
    async fn reject(&self, client_ip: &str, error: AppError) -> Response {
        tracing::debug!(client_ip, error = %error, "Authentication failed");
        if let Some(limiter) = &self.failure_limiter {
            if limiter.record_failure(client_ip).await {
                tracing::warn!(client_ip, "Auth failure limit reached");
                return too_many_failures();
            }
        }
        HttpAppError(error).into_response()
    }
}

fn too_many_failures() -> Response {
    let body = ErrorResponse {
        error: "Too many failed authentication attempts".to_string(),
        details: None,
        error_type: None,
        code: "TOO_MANY_AUTH_FAILURES".to_string(),
        recoverable: true,
        suggested_action: Some("Wait a few minutes before retrying".to_string()),
    };
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })
}

/// Authenticate the bearer token and attach [`AuthUser`] to the request.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(
        request.headers(),
        socket_addr.as_ref(),
        auth.trusted_proxy_count,
    );

    if let Some(limiter) = &auth.failure_limiter {
        if limiter.is_blocked(&client_ip).await {
            return too_many_failures();
        }
    }

    let verified = match bearer_token(request.headers()) {
        Ok(token) => auth.verifier.verify(token).await,
        Err(e) => Err(e),
    };
    let verified = match verified {
        Ok(v) => v,
        Err(e @ AppError::Unauthorized(_)) => return auth.reject(&client_ip, e).await,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let resolved = match auth.identities.resolve(verified).await {
        Ok(r) => r,
        Err(e @ AppError::Unauthorized(_)) => return auth.reject(&client_ip, e).await,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let mut user = resolved.user;
    if resolved.provisioned {
        match auth.invitations.accept_pending_for(&user).await {
            Ok(accepted) => {
                if let Some(last) = accepted.last() {
                    user.organization_id = Some(last.organization_id);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "Failed to accept pending invitations")
            }
        }
    }

    tracing::debug!(user_id = %user.id, role = %user.role, "Authenticated");
    request
        .extensions_mut()
        .insert(AuthUser::new(user, auth.admin_enabled));
    next.run(request).await
}
