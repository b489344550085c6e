use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::core::lifecycle::{ensure_active, LifecycleError, MatchPatch};
use crate::core::reconciler::{ordered_pair, MatchSeed, Reconciler, SwipeCommand};
use crate::models::{Match, MatchStatus, SavedItem, SwipeAction, SwipeActionKind, SwipeTarget};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result of the swipe-record + reconcile transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeOutcome {
    pub swipe_id: Uuid,
    pub action: SwipeActionKind,
    pub is_new: bool,
    pub is_match: bool,
    pub matched: Option<Match>,
}

const MATCH_COLUMNS: &str = "match_id, tenant_id, host_id, listing_id, requirement_id, \
     compatibility_score, match_status, contact_shared, contact_shared_at, chat_enabled, \
     visit_scheduled, visit_date, visit_status, deal_closed, deal_closed_at, deal_amount, \
     matched_at, unmatched_at";

/// PostgreSQL client owning the swipe ledger, the match store and the
/// saved-item registry.
///
/// Every write to those tables goes through this client; the swipe+reconcile
/// sequence in particular runs as a single transaction so no caller can ever
/// observe a recorded swipe whose reciprocity check did not happen.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Record a swipe and reconcile it against the other party's ledger.
    ///
    /// The whole sequence is one transaction serialized per unordered user
    /// pair via an advisory lock, so two simultaneous mutual likes cannot
    /// miss each other's rows: whichever request enters second observes the
    /// first's committed swipe. The partial unique indexes on `matches`
    /// remain the backstop; losing that race degrades into a lookup of the
    /// surviving row, never an error.
    pub async fn record_swipe(
        &self,
        cmd: &SwipeCommand,
        reconciler: &Reconciler,
    ) -> Result<SwipeOutcome, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let (lo, hi) = ordered_pair(cmd.swiper_id, cmd.swiped_user_id);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1 || ':' || $2, 0))")
            .bind(lo.to_string())
            .bind(hi.to_string())
            .execute(&mut *tx)
            .await?;

        let existing = match cmd.target {
            SwipeTarget::Listing(listing_id) => {
                sqlx::query(
                    "SELECT swipe_id FROM swipe_actions \
                     WHERE swiper_id = $1 AND swiped_listing_id = $2",
                )
                .bind(cmd.swiper_id)
                .bind(listing_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            SwipeTarget::Requirement(requirement_id) => {
                sqlx::query(
                    "SELECT swipe_id FROM swipe_actions \
                     WHERE swiper_id = $1 AND swiped_requirement_id = $2",
                )
                .bind(cmd.swiper_id)
                .bind(requirement_id)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let (swipe_id, is_new) = match existing {
            Some(row) => {
                let swipe_id: Uuid = row.try_get("swipe_id")?;

                // Re-swipe mutates the action in place, never a second row.
                sqlx::query(
                    "UPDATE swipe_actions SET action = $2, updated_at = NOW() \
                     WHERE swipe_id = $1",
                )
                .bind(swipe_id)
                .bind(cmd.action)
                .execute(&mut *tx)
                .await?;

                (swipe_id, false)
            }
            None => {
                let row = sqlx::query(
                    "INSERT INTO swipe_actions \
                     (swiper_id, swiper_role, swiped_listing_id, swiped_requirement_id, \
                      swiped_user_id, action) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     RETURNING swipe_id",
                )
                .bind(cmd.swiper_id)
                .bind(cmd.swiper_role)
                .bind(cmd.target.listing_id())
                .bind(cmd.target.requirement_id())
                .bind(cmd.swiped_user_id)
                .bind(cmd.action)
                .fetch_one(&mut *tx)
                .await?;

                (row.try_get("swipe_id")?, true)
            }
        };

        let matched = if reconciler.should_reconcile(cmd.action) {
            self.reconcile(&mut tx, cmd, reconciler).await?
        } else {
            None
        };

        tx.commit().await?;

        tracing::debug!(
            "Recorded swipe {} -> {} ({}, new: {}, match: {})",
            cmd.swiper_id,
            cmd.swiped_user_id,
            cmd.action.as_str(),
            is_new,
            matched.is_some()
        );

        Ok(SwipeOutcome {
            swipe_id,
            action: cmd.action,
            is_new,
            is_match: matched.is_some(),
            matched,
        })
    }

    /// Reciprocity check + match creation, inside the caller's transaction.
    async fn reconcile(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cmd: &SwipeCommand,
        reconciler: &Reconciler,
    ) -> Result<Option<Match>, PostgresError> {
        // Symmetric pair lookup: the reciprocal swipe may target any of the
        // swiper's content, only the user pair has to line up.
        let reciprocal: bool = sqlx::query_scalar(
            "SELECT EXISTS( \
               SELECT 1 FROM swipe_actions \
               WHERE swiper_id = $1 AND swiped_user_id = $2 \
                 AND action IN ('like', 'super_like'))",
        )
        .bind(cmd.swiped_user_id)
        .bind(cmd.swiper_id)
        .fetch_one(&mut **tx)
        .await?;

        if !reciprocal {
            return Ok(None);
        }

        let seed = reconciler.seed(cmd);

        // An equivalent match from an earlier reconcile wins; re-swipes and
        // retried requests get the surviving row back.
        if let Some(existing) = Self::find_match_for_seed(tx, &seed).await? {
            return Ok(Some(existing));
        }

        let insert = match cmd.target {
            SwipeTarget::Listing(_) => format!(
                "INSERT INTO matches \
                 (tenant_id, host_id, listing_id, requirement_id, contact_shared, \
                  contact_shared_at, chat_enabled) \
                 VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END, $6) \
                 ON CONFLICT (tenant_id, host_id, listing_id) WHERE listing_id IS NOT NULL \
                 DO NOTHING \
                 RETURNING {MATCH_COLUMNS}"
            ),
            SwipeTarget::Requirement(_) => format!(
                "INSERT INTO matches \
                 (tenant_id, host_id, listing_id, requirement_id, contact_shared, \
                  contact_shared_at, chat_enabled) \
                 VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END, $6) \
                 ON CONFLICT (tenant_id, host_id, requirement_id) WHERE listing_id IS NULL \
                 DO NOTHING \
                 RETURNING {MATCH_COLUMNS}"
            ),
        };

        let inserted = sqlx::query(&insert)
            .bind(seed.tenant_id)
            .bind(seed.host_id)
            .bind(seed.listing_id)
            .bind(seed.requirement_id)
            .bind(seed.contact_shared)
            .bind(seed.chat_enabled)
            .fetch_optional(&mut **tx)
            .await;

        match inserted {
            Ok(Some(row)) => {
                tracing::info!(
                    "Match created: tenant {} / host {}",
                    seed.tenant_id,
                    seed.host_id
                );
                Ok(Some(match_from_row(&row)?))
            }
            // DO NOTHING swallowed a duplicate, or the index raced us anyway:
            // either way the match already exists, fetch and return it.
            Ok(None) => Ok(Self::find_match_for_seed(tx, &seed).await?),
            Err(e) if is_unique_violation(&e) => Ok(Self::find_match_for_seed(tx, &seed).await?),
            Err(e) => Err(e.into()),
        }
    }

    /// Existing-match lookup scoped to the triggering swipe's content.
    async fn find_match_for_seed(
        tx: &mut Transaction<'_, Postgres>,
        seed: &MatchSeed,
    ) -> Result<Option<Match>, PostgresError> {
        let query = if seed.listing_id.is_some() {
            format!(
                "SELECT {MATCH_COLUMNS} FROM matches \
                 WHERE tenant_id = $1 AND host_id = $2 AND listing_id = $3"
            )
        } else {
            format!(
                "SELECT {MATCH_COLUMNS} FROM matches \
                 WHERE tenant_id = $1 AND host_id = $2 AND requirement_id = $3 \
                   AND listing_id IS NULL"
            )
        };

        let row = sqlx::query(&query)
            .bind(seed.tenant_id)
            .bind(seed.host_id)
            .bind(seed.listing_id.or(seed.requirement_id))
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|r| match_from_row(&r)).transpose().map_err(Into::into)
    }

    /// Fetch the ledger row for a swiper/target pair.
    pub async fn find_swipe(
        &self,
        swiper_id: Uuid,
        target: SwipeTarget,
    ) -> Result<Option<SwipeAction>, PostgresError> {
        let query = match target {
            SwipeTarget::Listing(_) => {
                "SELECT swipe_id, swiper_id, swiper_role, swiped_listing_id, \
                        swiped_requirement_id, swiped_user_id, action, created_at, updated_at \
                 FROM swipe_actions \
                 WHERE swiper_id = $1 AND swiped_listing_id = $2"
            }
            SwipeTarget::Requirement(_) => {
                "SELECT swipe_id, swiper_id, swiper_role, swiped_listing_id, \
                        swiped_requirement_id, swiped_user_id, action, created_at, updated_at \
                 FROM swipe_actions \
                 WHERE swiper_id = $1 AND swiped_requirement_id = $2"
            }
        };

        let row = sqlx::query(query)
            .bind(swiper_id)
            .bind(target.listing_id().or(target.requirement_id()))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| swipe_action_from_row(&r)).transpose().map_err(Into::into)
    }

    /// List matches the user participates in, newest first.
    pub async fn list_matches(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Match>, u64), PostgresError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM matches \
             WHERE (tenant_id = $1 OR host_id = $1) \
               AND ($2::match_status IS NULL OR match_status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM matches \
             WHERE (tenant_id = $1 OR host_id = $1) \
               AND ($2::match_status IS NULL OR match_status = $2) \
             ORDER BY matched_at DESC \
             LIMIT $3 OFFSET $4"
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(status)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        let matches = rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((matches, total as u64))
    }

    /// Fetch a match the user participates in.
    pub async fn get_match(&self, match_id: Uuid, user_id: Uuid) -> Result<Match, PostgresError> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM matches \
             WHERE match_id = $1 AND (tenant_id = $2 OR host_id = $2)"
        );

        let row = sqlx::query(&query)
            .bind(match_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(match_from_row(&row)?),
            None => Err(PostgresError::NotFound(format!("Match {}", match_id))),
        }
    }

    /// Apply a lifecycle patch to an active match owned by the user.
    ///
    /// The `match_status = 'active'` predicate makes the guard atomic with
    /// the write; a no-op update is then disambiguated into not-found vs
    /// already-terminal.
    pub async fn update_match(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        patch: &MatchPatch,
    ) -> Result<Match, PostgresError> {
        let query = format!(
            "UPDATE matches SET \
               match_status    = COALESCE($3, match_status), \
               visit_scheduled = COALESCE($4, visit_scheduled), \
               visit_date      = COALESCE($5, visit_date), \
               visit_status    = COALESCE($6, visit_status), \
               deal_closed     = COALESCE($7, deal_closed), \
               deal_closed_at  = COALESCE($8, deal_closed_at), \
               deal_amount     = COALESCE($9, deal_amount), \
               unmatched_at    = COALESCE($10, unmatched_at) \
             WHERE match_id = $1 AND (tenant_id = $2 OR host_id = $2) \
               AND match_status = 'active' \
             RETURNING {MATCH_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(match_id)
            .bind(user_id)
            .bind(patch.match_status)
            .bind(patch.visit_scheduled)
            .bind(patch.visit_date)
            .bind(patch.visit_status)
            .bind(patch.deal_closed)
            .bind(patch.deal_closed_at)
            .bind(patch.deal_amount)
            .bind(patch.unmatched_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(match_from_row(&row)?);
        }

        // Nothing updated: either the match isn't ours, or it left `active`.
        let current = self.get_match(match_id, user_id).await?;
        ensure_active(current.match_status)?;
        // get_match succeeded and the status is active, yet the guarded
        // update saw nothing: the row changed between the two statements.
        Err(PostgresError::Conflict(format!(
            "Match {} was modified concurrently",
            match_id
        )))
    }

    /// Bookmark a listing or requirement.
    pub async fn save_item(
        &self,
        user_id: Uuid,
        target: SwipeTarget,
        notes: Option<&str>,
    ) -> Result<SavedItem, PostgresError> {
        let row = sqlx::query(
            "INSERT INTO saved_items (user_id, saved_listing_id, saved_requirement_id, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING saved_id, user_id, saved_listing_id, saved_requirement_id, notes, created_at",
        )
        .bind(user_id)
        .bind(target.listing_id())
        .bind(target.requirement_id())
        .bind(notes)
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => Ok(saved_item_from_row(&row)?),
            Err(e) if is_unique_violation(&e) => {
                Err(PostgresError::Conflict("Already saved".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's saved items, newest first.
    pub async fn list_saved(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<SavedItem>, u64), PostgresError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT saved_id, user_id, saved_listing_id, saved_requirement_id, notes, created_at \
             FROM saved_items \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(saved_item_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total as u64))
    }

    /// Remove a saved item owned by the user.
    pub async fn delete_saved(&self, saved_id: Uuid, user_id: Uuid) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM saved_items WHERE saved_id = $1 AND user_id = $2")
            .bind(saved_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Saved item {}", saved_id)));
        }

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Postgres signals a violated unique index with SQLSTATE 23505; the
/// reconciler and the saved-item registry both rely on telling it apart from
/// transient failures.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        match_id: row.try_get("match_id")?,
        tenant_id: row.try_get("tenant_id")?,
        host_id: row.try_get("host_id")?,
        listing_id: row.try_get("listing_id")?,
        requirement_id: row.try_get("requirement_id")?,
        compatibility_score: row.try_get("compatibility_score")?,
        match_status: row.try_get("match_status")?,
        contact_shared: row.try_get("contact_shared")?,
        contact_shared_at: row.try_get("contact_shared_at")?,
        chat_enabled: row.try_get("chat_enabled")?,
        visit_scheduled: row.try_get("visit_scheduled")?,
        visit_date: row.try_get("visit_date")?,
        visit_status: row.try_get("visit_status")?,
        deal_closed: row.try_get("deal_closed")?,
        deal_closed_at: row.try_get("deal_closed_at")?,
        deal_amount: row.try_get("deal_amount")?,
        matched_at: row.try_get("matched_at")?,
        unmatched_at: row.try_get("unmatched_at")?,
    })
}

fn swipe_action_from_row(row: &PgRow) -> Result<SwipeAction, sqlx::Error> {
    Ok(SwipeAction {
        swipe_id: row.try_get("swipe_id")?,
        swiper_id: row.try_get("swiper_id")?,
        swiper_role: row.try_get("swiper_role")?,
        swiped_listing_id: row.try_get("swiped_listing_id")?,
        swiped_requirement_id: row.try_get("swiped_requirement_id")?,
        swiped_user_id: row.try_get("swiped_user_id")?,
        action: row.try_get("action")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn saved_item_from_row(row: &PgRow) -> Result<SavedItem, sqlx::Error> {
    Ok(SavedItem {
        saved_id: row.try_get("saved_id")?,
        user_id: row.try_get("user_id")?,
        saved_listing_id: row.try_get("saved_listing_id")?,
        saved_requirement_id: row.try_get("saved_requirement_id")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_columns_cover_the_struct() {
        // One column per Match field, in declaration order.
        assert_eq!(MATCH_COLUMNS.split(',').count(), 18);
    }
}
