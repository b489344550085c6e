// Core policy exports
pub mod lifecycle;
pub mod reconciler;

pub use lifecycle::{ensure_active, LifecycleError, MatchPatch};
pub use reconciler::{ordered_pair, MatchSeed, Reconciler, SwipeCommand, SwipeError};
