use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Disposition a user can record toward a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "swipe_action_kind", rename_all = "snake_case")]
pub enum SwipeActionKind {
    Like,
    Dislike,
    SuperLike,
    Skip,
}

impl SwipeActionKind {
    /// Likes and super-likes count toward reciprocity; dislikes and skips
    /// never form a match.
    pub fn is_positive(&self) -> bool {
        matches!(self, SwipeActionKind::Like | SwipeActionKind::SuperLike)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeActionKind::Like => "like",
            SwipeActionKind::Dislike => "dislike",
            SwipeActionKind::SuperLike => "super_like",
            SwipeActionKind::Skip => "skip",
        }
    }
}

/// Which side of the marketplace the swiper is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "swiper_role", rename_all = "lowercase")]
pub enum SwiperRole {
    Tenant,
    Host,
}

impl SwiperRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwiperRole::Tenant => "tenant",
            SwiperRole::Host => "host",
        }
    }
}

/// The content a swipe targets. Exactly one of listing / requirement,
/// enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeTarget {
    Listing(Uuid),
    Requirement(Uuid),
}

impl SwipeTarget {
    /// Build from the optional id pair; `None` unless exactly one is set.
    pub fn from_ids(listing: Option<Uuid>, requirement: Option<Uuid>) -> Option<Self> {
        match (listing, requirement) {
            (Some(id), None) => Some(SwipeTarget::Listing(id)),
            (None, Some(id)) => Some(SwipeTarget::Requirement(id)),
            _ => None,
        }
    }

    pub fn listing_id(&self) -> Option<Uuid> {
        match self {
            SwipeTarget::Listing(id) => Some(*id),
            SwipeTarget::Requirement(_) => None,
        }
    }

    pub fn requirement_id(&self) -> Option<Uuid> {
        match self {
            SwipeTarget::Listing(_) => None,
            SwipeTarget::Requirement(id) => Some(*id),
        }
    }
}

/// One row of the swipe ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeAction {
    pub swipe_id: Uuid,
    pub swiper_id: Uuid,
    pub swiper_role: SwiperRole,
    pub swiped_listing_id: Option<Uuid>,
    pub swiped_requirement_id: Option<Uuid>,
    pub swiped_user_id: Uuid,
    pub action: SwipeActionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Match lifecycle status. `Unmatched` and `DealClosed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
pub enum MatchStatus {
    Active,
    Unmatched,
    DealClosed,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MatchStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "active",
            MatchStatus::Unmatched => "unmatched",
            MatchStatus::DealClosed => "deal_closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "visit_status", rename_all = "lowercase")]
pub enum VisitStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

/// Durable match record, created only by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub match_id: Uuid,
    pub tenant_id: Uuid,
    pub host_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub requirement_id: Option<Uuid>,
    pub compatibility_score: Option<f64>,
    pub match_status: MatchStatus,
    pub contact_shared: bool,
    pub contact_shared_at: Option<DateTime<Utc>>,
    pub chat_enabled: bool,
    pub visit_scheduled: bool,
    pub visit_date: Option<DateTime<Utc>>,
    pub visit_status: Option<VisitStatus>,
    pub deal_closed: bool,
    pub deal_closed_at: Option<DateTime<Utc>>,
    pub deal_amount: Option<f64>,
    pub matched_at: DateTime<Utc>,
    pub unmatched_at: Option<DateTime<Utc>>,
}

impl Match {
    /// The other party from `user_id`'s perspective, with the role `user_id`
    /// occupies in this match.
    pub fn counterpart(&self, user_id: Uuid) -> (Uuid, SwiperRole) {
        if self.tenant_id == user_id {
            (self.host_id, SwiperRole::Tenant)
        } else {
            (self.tenant_id, SwiperRole::Host)
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.tenant_id == user_id || self.host_id == user_id
    }
}

/// Tenant/host assignment derived from the triggering swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPair {
    pub tenant_id: Uuid,
    pub host_id: Uuid,
}

/// Public user summary served by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    pub user_type: String,
}

/// Contact details, revealed only once a match has `contact_shared`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Listing summary served by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub listing_id: Uuid,
    pub title: String,
    pub rent_monthly: f64,
    #[serde(default)]
    pub locality: Option<String>,
}

/// Requirement summary served by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSummary {
    pub requirement_id: Uuid,
    pub title: String,
    pub budget_min: f64,
    pub budget_max: f64,
}

/// A bookmarked listing or requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    pub saved_id: Uuid,
    pub user_id: Uuid,
    pub saved_listing_id: Option<Uuid>,
    pub saved_requirement_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_classes() {
        assert!(SwipeActionKind::Like.is_positive());
        assert!(SwipeActionKind::SuperLike.is_positive());
        assert!(!SwipeActionKind::Dislike.is_positive());
        assert!(!SwipeActionKind::Skip.is_positive());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!MatchStatus::Active.is_terminal());
        assert!(MatchStatus::Unmatched.is_terminal());
        assert!(MatchStatus::DealClosed.is_terminal());
    }

    #[test]
    fn test_target_accessors() {
        let id = Uuid::new_v4();
        let listing = SwipeTarget::Listing(id);
        assert_eq!(listing.listing_id(), Some(id));
        assert_eq!(listing.requirement_id(), None);

        let requirement = SwipeTarget::Requirement(id);
        assert_eq!(requirement.listing_id(), None);
        assert_eq!(requirement.requirement_id(), Some(id));
    }
}
