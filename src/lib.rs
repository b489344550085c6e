//! StaySwipe - Swipe-to-match service for the StaySwipe rental marketplace
//!
//! This library implements the mutual-match reconciliation engine: tenants
//! swipe on property listings, hosts swipe on tenant requirements, and two
//! mutually-positive swipes produce exactly one durable Match, idempotently
//! and race-free.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ordered_pair, MatchPatch, Reconciler, SwipeCommand, SwipeError};
pub use crate::models::{Match, MatchStatus, SwipeAction, SwipeActionKind, SwipeTarget, SwiperRole};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let reconciler = Reconciler::default();
        assert!(reconciler.should_reconcile(SwipeActionKind::Like));
    }
}
