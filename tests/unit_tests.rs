// Unit tests for the StaySwipe reconciliation policy

use stayswipe::core::lifecycle::{ensure_active, LifecycleError, MatchPatch};
use stayswipe::core::reconciler::{ordered_pair, Reconciler, SwipeError};
use stayswipe::models::requests::SwipeRequest;
use stayswipe::models::{MatchStatus, SwipeActionKind, SwipeTarget, SwiperRole, VisitStatus};
use uuid::Uuid;

const ALL_ACTIONS: [SwipeActionKind; 4] = [
    SwipeActionKind::Like,
    SwipeActionKind::Dislike,
    SwipeActionKind::SuperLike,
    SwipeActionKind::Skip,
];

fn listing_swipe(action: &str, swiper_type: &str) -> SwipeRequest {
    SwipeRequest {
        swiper_type: swiper_type.to_string(),
        action: action.to_string(),
        swiped_listing_id: Some(Uuid::new_v4()),
        swiped_requirement_id: None,
        swiped_user_id: Uuid::new_v4(),
    }
}

#[test]
fn test_reconcile_gate_matches_positive_class() {
    let reconciler = Reconciler::default();

    for action in ALL_ACTIONS {
        assert_eq!(
            reconciler.should_reconcile(action),
            action.is_positive(),
            "gate disagrees with positive class for {:?}",
            action
        );
    }
}

#[test]
fn test_negative_swipes_never_reconcile() {
    let reconciler = Reconciler::default();

    assert!(!reconciler.should_reconcile(SwipeActionKind::Dislike));
    assert!(!reconciler.should_reconcile(SwipeActionKind::Skip));
}

#[test]
fn test_action_strings_round_trip_through_validation() {
    let reconciler = Reconciler::default();
    let actor = Uuid::new_v4();

    for (raw, expected) in [
        ("like", SwipeActionKind::Like),
        ("dislike", SwipeActionKind::Dislike),
        ("super_like", SwipeActionKind::SuperLike),
        ("skip", SwipeActionKind::Skip),
    ] {
        let cmd = reconciler
            .validate(actor, &listing_swipe(raw, "tenant"))
            .unwrap();
        assert_eq!(cmd.action, expected);
        assert_eq!(cmd.action.as_str(), raw);
    }
}

#[test]
fn test_unknown_action_is_a_caller_error() {
    let reconciler = Reconciler::default();
    let err = reconciler
        .validate(Uuid::new_v4(), &listing_swipe("maybe", "tenant"))
        .unwrap_err();

    assert!(matches!(err, SwipeError::InvalidAction(_)));
}

#[test]
fn test_tenant_and_host_swipes_derive_the_same_pair() {
    let reconciler = Reconciler::default();
    let tenant = Uuid::new_v4();
    let host = Uuid::new_v4();

    // Tenant swipes on the host's listing.
    let mut from_tenant = listing_swipe("like", "tenant");
    from_tenant.swiped_user_id = host;
    let tenant_cmd = reconciler.validate(tenant, &from_tenant).unwrap();

    // Host swipes on the tenant's requirement.
    let from_host = SwipeRequest {
        swiper_type: "host".to_string(),
        action: "like".to_string(),
        swiped_listing_id: None,
        swiped_requirement_id: Some(Uuid::new_v4()),
        swiped_user_id: tenant,
    };
    let host_cmd = reconciler.validate(host, &from_host).unwrap();

    let pair_a = reconciler.derive_pair(&tenant_cmd);
    let pair_b = reconciler.derive_pair(&host_cmd);

    // Whoever reconciles second, the roles land the same way.
    assert_eq!(pair_a, pair_b);
    assert_eq!(pair_a.tenant_id, tenant);
    assert_eq!(pair_a.host_id, host);
}

#[test]
fn test_seed_keeps_the_triggering_content() {
    let reconciler = Reconciler::default();
    let requirement = Uuid::new_v4();

    let req = SwipeRequest {
        swiper_type: "host".to_string(),
        action: "super_like".to_string(),
        swiped_listing_id: None,
        swiped_requirement_id: Some(requirement),
        swiped_user_id: Uuid::new_v4(),
    };
    let cmd = reconciler.validate(Uuid::new_v4(), &req).unwrap();
    let seed = reconciler.seed(&cmd);

    assert_eq!(seed.requirement_id, Some(requirement));
    assert_eq!(seed.listing_id, None);
}

#[test]
fn test_contact_sharing_policy_flows_into_the_seed() {
    let reconciler = Reconciler::new(false);
    let cmd = reconciler
        .validate(Uuid::new_v4(), &listing_swipe("like", "tenant"))
        .unwrap();

    assert!(!reconciler.seed(&cmd).contact_shared);
}

#[test]
fn test_target_is_exactly_one_of_listing_or_requirement() {
    assert!(SwipeTarget::from_ids(None, None).is_none());
    assert!(SwipeTarget::from_ids(Some(Uuid::new_v4()), Some(Uuid::new_v4())).is_none());

    let id = Uuid::new_v4();
    assert_eq!(
        SwipeTarget::from_ids(Some(id), None),
        Some(SwipeTarget::Listing(id))
    );
    assert_eq!(
        SwipeTarget::from_ids(None, Some(id)),
        Some(SwipeTarget::Requirement(id))
    );
}

#[test]
fn test_pair_lock_key_ignores_swipe_direction() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
}

#[test]
fn test_lifecycle_actions_blocked_after_terminal_states() {
    assert!(ensure_active(MatchStatus::Active).is_ok());

    for terminal in [MatchStatus::Unmatched, MatchStatus::DealClosed] {
        assert_eq!(
            ensure_active(terminal),
            Err(LifecycleError::NotActive(terminal))
        );
    }
}

#[test]
fn test_visit_patch_does_not_change_status() {
    let patch = MatchPatch::schedule_visit(chrono::Utc::now());

    assert!(patch.match_status.is_none());
    assert_eq!(patch.visit_status, Some(VisitStatus::Scheduled));
}

#[test]
fn test_terminal_patches_set_their_status() {
    let now = chrono::Utc::now();

    assert_eq!(
        MatchPatch::close_deal(None, now).match_status,
        Some(MatchStatus::DealClosed)
    );
    assert_eq!(
        MatchPatch::unmatch(now).match_status,
        Some(MatchStatus::Unmatched)
    );
}

#[test]
fn test_swipe_roles_parse_strictly() {
    let reconciler = Reconciler::default();

    let mut req = listing_swipe("like", "tenant");
    assert_eq!(
        reconciler
            .validate(Uuid::new_v4(), &req)
            .unwrap()
            .swiper_role,
        SwiperRole::Tenant
    );

    req.swiper_type = "landlord".to_string();
    assert!(matches!(
        reconciler.validate(Uuid::new_v4(), &req).unwrap_err(),
        SwipeError::InvalidRole(_)
    ));
}
