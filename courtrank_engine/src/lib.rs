//! CourtRank Engine
//!
//! The CourtRank engine is the core of a social sports-ranking service. It owns the match lifecycle state machine
//! (waiting → live → ended), score settlement with a confirmation window, provisional and reversible rating
//! application, and the append-only rank history that backs both.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public flow APIs. The exception is the data types used in the database, which are defined in
//!    the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the engine: match flow,
//!    rating queries, and challenge/invite negotiation. Specific backends need to implement the traits in the
//!    [`mod@traits`] module in order to act as a backend for the CourtRank server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur, for example when a match result lands and is waiting on the opponent. A simple actor framework is used so
//! that you can hook into these events and perform custom actions (the server uses this for push notifications).
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{ChallengeApi, MatchFlowApi, PlayerApi, RatingApi};
pub use sqlite::SqliteDatabase;
pub use traits::{
    ChallengeApiError,
    ChallengeManagement,
    MatchFlowError,
    MatchLifecycle,
    PlayerApiError,
    PlayerManagement,
    RatingApiError,
    RatingManagement,
};
