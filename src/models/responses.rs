use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{
    ListingSummary, MatchStatus, RequirementSummary, SavedItem, SwipeActionKind, SwiperRole,
    UserSummary, VisitStatus,
};

/// Response for the swipe endpoint.
///
/// `is_match` is true both when this swipe completed a new match and when an
/// equivalent match already existed (idempotent re-swipe / concurrent retry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub swipe_id: Uuid,
    pub action: SwipeActionKind,
    pub is_new: bool,
    pub is_match: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchCreated>,
}

/// Minimal match payload embedded in a swipe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCreated {
    pub match_id: Uuid,
    pub matched_at: DateTime<Utc>,
    pub contact_shared: bool,
    pub chat_enabled: bool,
}

/// One entry of the match list, enriched from the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub my_role: SwiperRole,
    pub matched_user: Option<UserSummary>,
    pub listing: Option<ListingSummary>,
    pub requirement: Option<RequirementSummary>,
    pub compatibility_score: Option<f64>,
    pub match_status: MatchStatus,
    pub contact_shared: bool,
    pub chat_enabled: bool,
    pub visit_scheduled: bool,
    pub visit_date: Option<DateTime<Utc>>,
    pub visit_status: Option<VisitStatus>,
    pub deal_closed: bool,
    pub matched_at: DateTime<Utc>,
}

/// One party of a match with optionally-revealed contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyDetails {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub profile_photo_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Full match detail for one of its participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetailResponse {
    pub match_id: Uuid,
    pub tenant: PartyDetails,
    pub host: PartyDetails,
    pub listing_id: Option<Uuid>,
    pub requirement_id: Option<Uuid>,
    pub compatibility_score: Option<f64>,
    pub match_status: MatchStatus,
    pub contact_shared: bool,
    pub chat_enabled: bool,
    pub visit_scheduled: bool,
    pub visit_date: Option<DateTime<Utc>>,
    pub visit_status: Option<VisitStatus>,
    pub deal_closed: bool,
    pub deal_amount: Option<f64>,
    pub matched_at: DateTime<Utc>,
}

/// Page metadata shared by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            ((total_items + limit as u64 - 1) / limit as u64) as u32
        };
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveItemResponse {
    pub saved_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedListResponse {
    pub saved_items: Vec<SavedItem>,
    pub pagination: Pagination,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounding() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);

        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
