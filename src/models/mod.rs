// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ContactDetails, ListingSummary, Match, MatchPair, MatchStatus, RequirementSummary, SavedItem,
    SwipeAction, SwipeActionKind, SwipeTarget, SwiperRole, UserSummary, VisitStatus,
};
pub use requests::{
    CloseDealRequest, MatchListQuery, PageQuery, SaveItemRequest, ScheduleVisitRequest,
    SwipeRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, MatchCreated, MatchDetailResponse, MatchListResponse,
    MatchSummary, Pagination, PartyDetails, SaveItemResponse, SavedListResponse, SwipeResponse,
};
