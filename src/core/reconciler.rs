use thiserror::Error;
use uuid::Uuid;

use crate::models::requests::SwipeRequest;
use crate::models::{MatchPair, SwipeActionKind, SwipeTarget, SwiperRole};

/// Caller errors rejected before anything touches the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwipeError {
    #[error("Invalid action '{0}'. Must be: like, dislike, super_like, or skip")]
    InvalidAction(String),

    #[error("Invalid swiper type '{0}'. Must be: tenant or host")]
    InvalidRole(String),

    #[error("Provide exactly one of swiped_listing_id or swiped_requirement_id")]
    InvalidTarget,

    #[error("Cannot swipe on your own content")]
    SelfSwipe,
}

/// A swipe that has passed boundary validation and is ready for the ledger.
#[derive(Debug, Clone, Copy)]
pub struct SwipeCommand {
    pub swiper_id: Uuid,
    pub swiper_role: SwiperRole,
    pub target: SwipeTarget,
    pub swiped_user_id: Uuid,
    pub action: SwipeActionKind,
}

/// Column values for a match row about to be inserted. Timestamps are
/// assigned by the store at insert time.
#[derive(Debug, Clone, Copy)]
pub struct MatchSeed {
    pub tenant_id: Uuid,
    pub host_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub requirement_id: Option<Uuid>,
    pub contact_shared: bool,
    pub chat_enabled: bool,
}

/// Reconciliation policy: which swipes may form a match, who ends up as
/// tenant/host, and what the new match row looks like.
///
/// The transactional read-check-insert sequence lives in the store; this type
/// owns the pure decisions so they stay unit-testable without a database.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    auto_share_contact: bool,
}

impl Reconciler {
    pub fn new(auto_share_contact: bool) -> Self {
        Self { auto_share_contact }
    }

    /// Validate a raw swipe request into a command.
    ///
    /// Action and role strings map to `InvalidAction` / `InvalidRole` so the
    /// caller sees the taxonomy error, not a deserialization failure.
    pub fn validate(&self, actor_id: Uuid, req: &SwipeRequest) -> Result<SwipeCommand, SwipeError> {
        let action = parse_action(&req.action)?;
        let swiper_role = parse_role(&req.swiper_type)?;

        let target = SwipeTarget::from_ids(req.swiped_listing_id, req.swiped_requirement_id)
            .ok_or(SwipeError::InvalidTarget)?;

        if req.swiped_user_id == actor_id {
            return Err(SwipeError::SelfSwipe);
        }

        Ok(SwipeCommand {
            swiper_id: actor_id,
            swiper_role,
            target,
            swiped_user_id: req.swiped_user_id,
            action,
        })
    }

    /// Whether this write should run the reciprocity check.
    ///
    /// Every positive swipe does, including re-swipes and retried requests:
    /// reconciliation is idempotent, so a duplicate simply gets the surviving
    /// match back instead of creating a second one. Negative actions never
    /// reconcile, which is also what turns a dislike-to-like update into the
    /// moment the match forms.
    pub fn should_reconcile(&self, action: SwipeActionKind) -> bool {
        action.is_positive()
    }

    /// Derive the tenant/host assignment from the swiper's declared role.
    pub fn derive_pair(&self, cmd: &SwipeCommand) -> MatchPair {
        match cmd.swiper_role {
            SwiperRole::Tenant => MatchPair {
                tenant_id: cmd.swiper_id,
                host_id: cmd.swiped_user_id,
            },
            SwiperRole::Host => MatchPair {
                tenant_id: cmd.swiped_user_id,
                host_id: cmd.swiper_id,
            },
        }
    }

    /// Build the row for a match created by this swipe. Content ids propagate
    /// from the triggering swipe's target.
    pub fn seed(&self, cmd: &SwipeCommand) -> MatchSeed {
        let pair = self.derive_pair(cmd);
        MatchSeed {
            tenant_id: pair.tenant_id,
            host_id: pair.host_id,
            listing_id: cmd.target.listing_id(),
            requirement_id: cmd.target.requirement_id(),
            contact_shared: self.auto_share_contact,
            chat_enabled: true,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        // Contact is auto-shared the moment a match forms.
        Self::new(true)
    }
}

/// Canonical ordering of a user pair, used to key the per-pair advisory lock
/// so A-swipes-B and B-swipes-A serialize on the same lock.
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn parse_action(raw: &str) -> Result<SwipeActionKind, SwipeError> {
    match raw {
        "like" => Ok(SwipeActionKind::Like),
        "dislike" => Ok(SwipeActionKind::Dislike),
        "super_like" => Ok(SwipeActionKind::SuperLike),
        "skip" => Ok(SwipeActionKind::Skip),
        other => Err(SwipeError::InvalidAction(other.to_string())),
    }
}

fn parse_role(raw: &str) -> Result<SwiperRole, SwipeError> {
    match raw {
        "tenant" => Ok(SwiperRole::Tenant),
        "host" => Ok(SwiperRole::Host),
        other => Err(SwipeError::InvalidRole(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe_request(action: &str, swiper_type: &str, target_user: Uuid) -> SwipeRequest {
        SwipeRequest {
            swiper_type: swiper_type.to_string(),
            action: action.to_string(),
            swiped_listing_id: Some(Uuid::new_v4()),
            swiped_requirement_id: None,
            swiped_user_id: target_user,
        }
    }

    #[test]
    fn test_validate_accepts_listing_swipe() {
        let reconciler = Reconciler::default();
        let actor = Uuid::new_v4();
        let req = swipe_request("like", "tenant", Uuid::new_v4());

        let cmd = reconciler.validate(actor, &req).unwrap();
        assert_eq!(cmd.action, SwipeActionKind::Like);
        assert_eq!(cmd.swiper_role, SwiperRole::Tenant);
        assert!(cmd.target.listing_id().is_some());
    }

    #[test]
    fn test_validate_rejects_unknown_action() {
        let reconciler = Reconciler::default();
        let req = swipe_request("love", "tenant", Uuid::new_v4());

        let err = reconciler.validate(Uuid::new_v4(), &req).unwrap_err();
        assert_eq!(err, SwipeError::InvalidAction("love".to_string()));
    }

    #[test]
    fn test_validate_rejects_unknown_role() {
        let reconciler = Reconciler::default();
        let req = swipe_request("like", "agent", Uuid::new_v4());

        let err = reconciler.validate(Uuid::new_v4(), &req).unwrap_err();
        assert_eq!(err, SwipeError::InvalidRole("agent".to_string()));
    }

    #[test]
    fn test_validate_rejects_both_targets() {
        let reconciler = Reconciler::default();
        let mut req = swipe_request("like", "tenant", Uuid::new_v4());
        req.swiped_requirement_id = Some(Uuid::new_v4());

        let err = reconciler.validate(Uuid::new_v4(), &req).unwrap_err();
        assert_eq!(err, SwipeError::InvalidTarget);
    }

    #[test]
    fn test_validate_rejects_missing_target() {
        let reconciler = Reconciler::default();
        let mut req = swipe_request("like", "tenant", Uuid::new_v4());
        req.swiped_listing_id = None;

        let err = reconciler.validate(Uuid::new_v4(), &req).unwrap_err();
        assert_eq!(err, SwipeError::InvalidTarget);
    }

    #[test]
    fn test_validate_rejects_self_swipe() {
        let reconciler = Reconciler::default();
        let actor = Uuid::new_v4();
        let req = swipe_request("like", "tenant", actor);

        let err = reconciler.validate(actor, &req).unwrap_err();
        assert_eq!(err, SwipeError::SelfSwipe);
    }

    #[test]
    fn test_only_positive_actions_reconcile() {
        let r = Reconciler::default();

        assert!(r.should_reconcile(SwipeActionKind::Like));
        assert!(r.should_reconcile(SwipeActionKind::SuperLike));
        assert!(!r.should_reconcile(SwipeActionKind::Dislike));
        assert!(!r.should_reconcile(SwipeActionKind::Skip));
    }

    #[test]
    fn test_pair_derivation_by_role() {
        let reconciler = Reconciler::default();
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();

        let as_tenant = SwipeCommand {
            swiper_id: actor,
            swiper_role: SwiperRole::Tenant,
            target: SwipeTarget::Listing(Uuid::new_v4()),
            swiped_user_id: other,
            action: SwipeActionKind::Like,
        };
        let pair = reconciler.derive_pair(&as_tenant);
        assert_eq!(pair.tenant_id, actor);
        assert_eq!(pair.host_id, other);

        let as_host = SwipeCommand {
            swiper_role: SwiperRole::Host,
            target: SwipeTarget::Requirement(Uuid::new_v4()),
            ..as_tenant
        };
        let pair = reconciler.derive_pair(&as_host);
        assert_eq!(pair.tenant_id, other);
        assert_eq!(pair.host_id, actor);
    }

    #[test]
    fn test_seed_propagates_triggering_target() {
        let reconciler = Reconciler::default();
        let listing = Uuid::new_v4();
        let cmd = SwipeCommand {
            swiper_id: Uuid::new_v4(),
            swiper_role: SwiperRole::Tenant,
            target: SwipeTarget::Listing(listing),
            swiped_user_id: Uuid::new_v4(),
            action: SwipeActionKind::Like,
        };

        let seed = reconciler.seed(&cmd);
        assert_eq!(seed.listing_id, Some(listing));
        assert_eq!(seed.requirement_id, None);
        assert!(seed.contact_shared);
        assert!(seed.chat_enabled);
    }

    #[test]
    fn test_ordered_pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
        assert_eq!(ordered_pair(a, a), (a, a));
    }
}
