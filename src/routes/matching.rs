use actix_web::{web, HttpResponse, Responder};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::lifecycle::MatchPatch;
use crate::core::reconciler::{Reconciler, SwipeError};
use crate::models::{
    CloseDealRequest, ErrorResponse, HealthResponse, Match, MatchCreated, MatchDetailResponse,
    MatchListQuery, MatchListResponse, MatchStatus, MatchSummary, PageQuery, Pagination,
    PartyDetails, SaveItemRequest, SaveItemResponse, SavedListResponse, ScheduleVisitRequest,
    SwipeRequest, SwipeResponse, SwipeTarget,
};
use crate::routes::Actor;
use crate::services::{CacheKey, CacheManager, DirectoryClient, PostgresClient, PostgresError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub directory: Arc<DirectoryClient>,
    pub reconciler: Reconciler,
    pub matching: MatchingSettings,
}

/// Configure all matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matching/swipe", web::post().to(swipe))
        .route("/matching/matches", web::get().to(list_matches))
        .route("/matching/matches/{match_id}", web::get().to(get_match_details))
        .route(
            "/matching/matches/{match_id}/schedule-visit",
            web::post().to(schedule_visit),
        )
        .route(
            "/matching/matches/{match_id}/close-deal",
            web::post().to(close_deal),
        )
        .route("/matching/matches/{match_id}/unmatch", web::post().to(unmatch))
        .route("/matching/save", web::post().to(save_item))
        .route("/matching/saved", web::get().to(list_saved))
        .route("/matching/saved/{saved_id}", web::delete().to(unsave_item));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Record a swipe and reconcile it into a match when reciprocated
///
/// POST /api/v1/matching/swipe
///
/// Request body:
/// ```json
/// {
///   "swiper_type": "tenant|host",
///   "action": "like|dislike|super_like|skip",
///   "swiped_listing_id": "uuid",
///   "swiped_user_id": "uuid"
/// }
/// ```
async fn swipe(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<SwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let cmd = match state.reconciler.validate(actor.0, &req) {
        Ok(cmd) => cmd,
        Err(e) => return swipe_rejected(e),
    };

    match state.postgres.record_swipe(&cmd, &state.reconciler).await {
        Ok(outcome) => {
            if outcome.is_match {
                // Both parties' match lists changed (or may be stale after a
                // retried request); drop both cache entries.
                invalidate_match_caches(&state, cmd.swiper_id, cmd.swiped_user_id).await;
                tracing::info!(
                    "Swipe {} -> {} produced a match",
                    cmd.swiper_id,
                    cmd.swiped_user_id
                );
            }

            HttpResponse::Ok().json(SwipeResponse {
                swipe_id: outcome.swipe_id,
                action: outcome.action,
                is_new: outcome.is_new,
                is_match: outcome.is_match,
                matched: outcome.matched.map(|m| MatchCreated {
                    match_id: m.match_id,
                    matched_at: m.matched_at,
                    contact_shared: m.contact_shared,
                    chat_enabled: m.chat_enabled,
                }),
            })
        }
        Err(e) => store_error_response("record swipe", e),
    }
}

/// List the caller's matches
///
/// GET /api/v1/matching/matches?status=&page=&limit=
async fn list_matches(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<MatchListQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    let status = match query.status.as_deref() {
        None => None,
        Some("active") => Some(MatchStatus::Active),
        Some("unmatched") => Some(MatchStatus::Unmatched),
        Some("deal_closed") => Some(MatchStatus::DealClosed),
        Some(other) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "invalid_status".to_string(),
                message: format!(
                    "Invalid status '{}'. Must be: active, unmatched, or deal_closed",
                    other
                ),
                status_code: 400,
            });
        }
    };

    let limit = query.limit.min(state.matching.max_limit);
    let offset = (query.page as u64 - 1) * limit as u64;

    // Only the unfiltered first page is cached; it is what the app opens on.
    let cacheable =
        status.is_none() && query.page == 1 && limit == state.matching.default_limit;
    let cache_key = CacheKey::matches(&actor.0);

    if cacheable {
        if let Ok(cached) = state.cache.get::<MatchListResponse>(&cache_key).await {
            tracing::debug!("Match list served from cache for {}", actor.0);
            return HttpResponse::Ok().json(cached);
        }
    }

    let (matches, total) = match state.postgres.list_matches(actor.0, status, limit, offset).await
    {
        Ok(page) => page,
        Err(e) => return store_error_response("list matches", e),
    };

    let summaries = build_match_summaries(&state, actor.0, matches).await;

    let response = MatchListResponse {
        matches: summaries,
        pagination: Pagination::new(query.page, limit, total),
    };

    if cacheable {
        if let Err(e) = state.cache.set(&cache_key, &response).await {
            tracing::warn!("Failed to cache match list for {}: {}", actor.0, e);
        }
    }

    HttpResponse::Ok().json(response)
}

/// Get detailed match information
///
/// GET /api/v1/matching/matches/{match_id}
///
/// Contact details are included only once the match has `contact_shared`.
async fn get_match_details(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> impl Responder {
    let match_id = path.into_inner();

    let m = match state.postgres.get_match(match_id, actor.0).await {
        Ok(m) => m,
        Err(e) => return store_error_response("get match", e),
    };

    let tenant = party_details(&state, m.tenant_id, m.contact_shared).await;
    let host = party_details(&state, m.host_id, m.contact_shared).await;

    HttpResponse::Ok().json(MatchDetailResponse {
        match_id: m.match_id,
        tenant,
        host,
        listing_id: m.listing_id,
        requirement_id: m.requirement_id,
        compatibility_score: m.compatibility_score,
        match_status: m.match_status,
        contact_shared: m.contact_shared,
        chat_enabled: m.chat_enabled,
        visit_scheduled: m.visit_scheduled,
        visit_date: m.visit_date,
        visit_status: m.visit_status,
        deal_closed: m.deal_closed,
        deal_amount: m.deal_amount,
        matched_at: m.matched_at,
    })
}

/// Schedule a property visit on an active match
///
/// POST /api/v1/matching/matches/{match_id}/schedule-visit
async fn schedule_visit(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: web::Json<ScheduleVisitRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let match_id = path.into_inner();
    let patch = MatchPatch::schedule_visit(req.visit_date);

    match state.postgres.update_match(match_id, actor.0, &patch).await {
        Ok(updated) => {
            invalidate_match_caches(&state, updated.tenant_id, updated.host_id).await;
            HttpResponse::Ok().json(serde_json::json!({
                "match_id": updated.match_id,
                "visit_date": updated.visit_date,
                "visit_status": updated.visit_status,
            }))
        }
        Err(e) => store_error_response("schedule visit", e),
    }
}

/// Close the deal on an active match
///
/// POST /api/v1/matching/matches/{match_id}/close-deal
async fn close_deal(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: web::Json<CloseDealRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let match_id = path.into_inner();
    let patch = MatchPatch::close_deal(req.deal_amount, chrono::Utc::now());

    match state.postgres.update_match(match_id, actor.0, &patch).await {
        Ok(updated) => {
            invalidate_match_caches(&state, updated.tenant_id, updated.host_id).await;
            HttpResponse::Ok().json(serde_json::json!({
                "match_id": updated.match_id,
                "deal_amount": updated.deal_amount,
                "deal_closed_at": updated.deal_closed_at,
            }))
        }
        Err(e) => store_error_response("close deal", e),
    }
}

/// Unmatch with the other party
///
/// POST /api/v1/matching/matches/{match_id}/unmatch
async fn unmatch(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> impl Responder {
    let match_id = path.into_inner();
    let patch = MatchPatch::unmatch(chrono::Utc::now());

    match state.postgres.update_match(match_id, actor.0, &patch).await {
        Ok(updated) => {
            invalidate_match_caches(&state, updated.tenant_id, updated.host_id).await;
            HttpResponse::Ok().json(serde_json::json!({
                "match_id": updated.match_id,
                "match_status": updated.match_status,
                "unmatched_at": updated.unmatched_at,
            }))
        }
        Err(e) => store_error_response("unmatch", e),
    }
}

/// Bookmark a listing or requirement
///
/// POST /api/v1/matching/save
async fn save_item(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<SaveItemRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let target = match SwipeTarget::from_ids(req.listing_id, req.requirement_id) {
        Some(target) => target,
        None => return swipe_rejected(SwipeError::InvalidTarget),
    };

    match state
        .postgres
        .save_item(actor.0, target, req.notes.as_deref())
        .await
    {
        Ok(saved) => HttpResponse::Ok().json(SaveItemResponse {
            saved_id: saved.saved_id,
        }),
        Err(e) => store_error_response("save item", e),
    }
}

/// List the caller's saved items
///
/// GET /api/v1/matching/saved?page=&limit=
async fn list_saved(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<PageQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    let limit = query.limit.min(state.matching.max_limit);
    let offset = (query.page as u64 - 1) * limit as u64;

    match state.postgres.list_saved(actor.0, limit, offset).await {
        Ok((items, total)) => HttpResponse::Ok().json(SavedListResponse {
            saved_items: items,
            pagination: Pagination::new(query.page, limit, total),
        }),
        Err(e) => store_error_response("list saved items", e),
    }
}

/// Remove a saved item
///
/// DELETE /api/v1/matching/saved/{saved_id}
async fn unsave_item(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> impl Responder {
    match state.postgres.delete_saved(path.into_inner(), actor.0).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
        })),
        Err(e) => store_error_response("unsave item", e),
    }
}

/// Enrich a page of matches with directory data.
///
/// Counterpart users are fetched in one batch; listing/requirement summaries
/// per match. All of it is best-effort: a directory outage degrades the
/// response to bare ids instead of failing the request.
async fn build_match_summaries(
    state: &AppState,
    user_id: Uuid,
    matches: Vec<Match>,
) -> Vec<MatchSummary> {
    let counterpart_ids: Vec<Uuid> = matches.iter().map(|m| m.counterpart(user_id).0).collect();

    let mut users = match state.directory.get_users(&counterpart_ids).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!("Directory unavailable, match list degraded to ids: {}", e);
            HashMap::new()
        }
    };

    let mut summaries = Vec::with_capacity(matches.len());
    for m in matches {
        let (counterpart_id, my_role) = m.counterpart(user_id);

        let listing = match m.listing_id {
            Some(id) => state.directory.get_listing(id).await.ok(),
            None => None,
        };
        let requirement = match m.requirement_id {
            Some(id) => state.directory.get_requirement(id).await.ok(),
            None => None,
        };

        summaries.push(MatchSummary {
            match_id: m.match_id,
            my_role,
            matched_user: users.remove(&counterpart_id),
            listing,
            requirement,
            compatibility_score: m.compatibility_score,
            match_status: m.match_status,
            contact_shared: m.contact_shared,
            chat_enabled: m.chat_enabled,
            visit_scheduled: m.visit_scheduled,
            visit_date: m.visit_date,
            visit_status: m.visit_status,
            deal_closed: m.deal_closed,
            matched_at: m.matched_at,
        });
    }

    summaries
}

/// One party of a match, with contact revealed only when shared.
async fn party_details(state: &AppState, user_id: Uuid, reveal_contact: bool) -> PartyDetails {
    let summary = state.directory.get_user(user_id).await.ok();
    let contact = if reveal_contact {
        match state.directory.get_contact(user_id).await {
            Ok(contact) => Some(contact),
            Err(e) => {
                tracing::warn!("Contact lookup failed for {}: {}", user_id, e);
                None
            }
        }
    } else {
        None
    };

    PartyDetails {
        user_id,
        full_name: summary.as_ref().map(|s| s.full_name.clone()),
        profile_photo_url: summary.and_then(|s| s.profile_photo_url),
        email: contact.as_ref().and_then(|c| c.email.clone()),
        phone: contact.and_then(|c| c.phone),
    }
}

async fn invalidate_match_caches(state: &AppState, user_a: Uuid, user_b: Uuid) {
    for user in [user_a, user_b] {
        if let Err(e) = state.cache.delete(&CacheKey::matches(&user)).await {
            tracing::warn!("Failed to invalidate match cache for {}: {}", user, e);
        }
    }
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "validation_failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn swipe_rejected(e: SwipeError) -> HttpResponse {
    let error = match &e {
        SwipeError::InvalidAction(_) => "invalid_action",
        SwipeError::InvalidRole(_) => "invalid_swiper_type",
        SwipeError::InvalidTarget => "invalid_target",
        SwipeError::SelfSwipe => "self_swipe",
    };

    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: e.to_string(),
        status_code: 400,
    })
}

/// Map store errors onto the response taxonomy: 404 for foreign/missing
/// rows, 409 for conflicts and terminal-state rejections, 503 for transient
/// store failures (the request was rolled back and can be retried).
fn store_error_response(context: &str, e: PostgresError) -> HttpResponse {
    match e {
        PostgresError::NotFound(what) => HttpResponse::NotFound().json(ErrorResponse {
            error: "not_found".to_string(),
            message: what,
            status_code: 404,
        }),
        PostgresError::Conflict(message) => HttpResponse::Conflict().json(ErrorResponse {
            error: "conflict".to_string(),
            message,
            status_code: 409,
        }),
        PostgresError::Lifecycle(err) => HttpResponse::Conflict().json(ErrorResponse {
            error: "match_not_active".to_string(),
            message: err.to_string(),
            status_code: 409,
        }),
        PostgresError::SqlxError(_) | PostgresError::MigrateError(_) => {
            tracing::error!("Store failure during {}: {}", context, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "store_unavailable".to_string(),
                message: "Temporary storage failure, retry the request".to_string(),
                status_code: 503,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let resp = store_error_response("test", PostgresError::NotFound("Match x".into()));
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

        let resp = store_error_response("test", PostgresError::Conflict("Already saved".into()));
        assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);
    }

    #[test]
    fn test_swipe_rejection_mapping() {
        let resp = swipe_rejected(SwipeError::InvalidTarget);
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
