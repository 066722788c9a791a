//! Background invitation expiry

use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::services::invitation::InvitationService;

/// Periodically runs [`InvitationService::expire_sweep`] until shut down.
pub struct ExpirySweeper {
    shutdown_tx: mpsc::Sender<()>,
}

impl ExpirySweeper {
    /// Spawn the sweep loop. Returns `None` when `interval_secs` is 0.
    pub fn start(invitations: InvitationService, interval_secs: u64) -> Option<Self> {
        if interval_secs == 0 {
            tracing::info!("Invitation expiry sweep disabled");
            return None;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            Self::worker_loop(invitations, interval_secs, shutdown_rx).await;
        });

        Some(Self { shutdown_tx })
    }

    async fn worker_loop(
        invitations: InvitationService,
        interval_secs: u64,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut sweep_interval = interval(Duration::from_secs(interval_secs));
        tracing::info!(interval_secs, "Invitation expiry sweeper started");

        loop {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    if let Err(e) = invitations.expire_sweep(Utc::now()).await {
                        tracing::error!(error = %e, "Invitation expiry sweep failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Invitation expiry sweeper shutting down");
                    break;
                }
            }
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::services::invitation::InvitationSettings;
    use crate::test_helpers::{test_user, InMemoryInvitationStore, RecordingIdentityProvider};
    use std::sync::Arc;
    use teampulse_core::models::{InvitationStatus, UserRole};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_with_zero_interval() {
        let store = InMemoryInvitationStore::default();
        let service = InvitationService::new(
            Arc::new(store),
            Arc::new(RecordingIdentityProvider::default()),
            InvitationSettings {
                max_pending_per_manager: 10,
                expiry_days: 7,
                redirect_url: None,
            },
        );
        assert!(ExpirySweeper::start(service, 0).is_none());
    }

    #[tokio::test]
    async fn test_first_tick_expires_overdue_invitations() {
        let store = InMemoryInvitationStore::default();
        let service = InvitationService::new(
            Arc::new(store.clone()),
            Arc::new(RecordingIdentityProvider::default()),
            InvitationSettings {
                max_pending_per_manager: 10,
                expiry_days: 7,
                redirect_url: None,
            },
        );
        let manager = AuthUser::new(test_user("m@example.com", UserRole::Manager), true);
        let invitation = service
            .issue(&manager, Uuid::new_v4(), Uuid::new_v4(), "late@example.com")
            .await
            .unwrap();
        store.set_expires_at(invitation.id, Utc::now() - chrono::Duration::hours(2));

        let sweeper = ExpirySweeper::start(service, 3600).unwrap();
        // the first interval tick fires immediately
        for _ in 0..50 {
            if store.status(invitation.id) == Some(InvitationStatus::Expired) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(store.status(invitation.id), Some(InvitationStatus::Expired));
        sweeper.shutdown().await;
    }
}
