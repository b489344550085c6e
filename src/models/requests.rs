use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to record a swipe.
///
/// `action` and `swiper_type` arrive as raw strings and are parsed by the
/// reconciler so unknown values map to the caller-error taxonomy, not a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    pub swiper_type: String,
    #[validate(length(min = 1))]
    pub action: String,
    #[serde(default)]
    pub swiped_listing_id: Option<Uuid>,
    #[serde(default)]
    pub swiped_requirement_id: Option<Uuid>,
    pub swiped_user_id: Uuid,
}

/// Request to schedule a property visit on an active match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScheduleVisitRequest {
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Request to close the deal on an active match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CloseDealRequest {
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub deal_amount: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Request to bookmark a listing or requirement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SaveItemRequest {
    #[serde(default)]
    pub listing_id: Option<Uuid>,
    #[serde(default)]
    pub requirement_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Query parameters for the match list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u32,
}

/// Query parameters for paginated saved-item listing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}
