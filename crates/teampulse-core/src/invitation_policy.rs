//! Invitation lifecycle rules
//!
//! Pure functions used by the invitation service: the per-manager ceiling, expiry
//! arithmetic and the allowed status transitions. Only PENDING invitations move, and
//! they move exactly once.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Invitation, InvitationStatus};
use crate::AppError;

pub const DEFAULT_MAX_PENDING_PER_MANAGER: i64 = 10;
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Reject a new invitation when the manager already has `ceiling` pending ones.
pub fn ensure_capacity(pending: i64, ceiling: i64) -> Result<(), AppError> {
    if pending >= ceiling {
        return Err(AppError::InvitationLimitReached {
            pending,
            limit: ceiling,
        });
    }
    Ok(())
}

pub fn expiry_from(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

/// A pending invitation whose expiry has passed. Non-pending invitations never expire.
pub fn is_expired(invitation: &Invitation, now: DateTime<Utc>) -> bool {
    invitation.status == InvitationStatus::Pending && invitation.expires_at <= now
}

pub fn can_transition(from: InvitationStatus, to: InvitationStatus) -> bool {
    matches!(
        (from, to),
        (
            InvitationStatus::Pending,
            InvitationStatus::Accepted | InvitationStatus::Revoked | InvitationStatus::Expired
        )
    )
}

pub fn ensure_transition(from: InvitationStatus, to: InvitationStatus) -> Result<(), AppError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invitation is {} and cannot become {}",
            from, to
        )))
    }
}

/// Emails are compared trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            email: "new.hire@example.com".to_string(),
            status,
            expires_at,
            team_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            external_id: None,
            accepted_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_capacity_ceiling_is_exclusive() {
        assert!(ensure_capacity(9, 10).is_ok());
        match ensure_capacity(10, 10) {
            Err(AppError::InvitationLimitReached { pending, limit }) => {
                assert_eq!(pending, 10);
                assert_eq!(limit, 10);
            }
            other => panic!("expected limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_expiry_offset() {
        let now = Utc::now();
        assert_eq!(expiry_from(now, 7) - now, Duration::days(7));
    }

    #[test]
    fn test_only_pending_invitations_expire() {
        let now = Utc::now();
        let past = now - Duration::minutes(1);
        assert!(is_expired(&invitation(InvitationStatus::Pending, past), now));
        assert!(is_expired(&invitation(InvitationStatus::Pending, now), now));
        assert!(!is_expired(
            &invitation(InvitationStatus::Pending, now + Duration::days(1)),
            now
        ));
        assert!(!is_expired(&invitation(InvitationStatus::Accepted, past), now));
        assert!(!is_expired(&invitation(InvitationStatus::Revoked, past), now));
    }

    #[test]
    fn test_transitions_leave_pending_only() {
        use InvitationStatus::*;
        assert!(can_transition(Pending, Accepted));
        assert!(can_transition(Pending, Revoked));
        assert!(can_transition(Pending, Expired));
        assert!(!can_transition(Pending, Pending));
        assert!(!can_transition(Accepted, Revoked));
        assert!(!can_transition(Revoked, Accepted));
        assert!(!can_transition(Expired, Pending));
        assert!(matches!(
            ensure_transition(Accepted, Revoked),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }
}
