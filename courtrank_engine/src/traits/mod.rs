//! # Database management and control.
//!
//! This module defines the interface contracts of the engine's database *backends*.
//!
//! ## Matches
//! A match is a head-to-head game between two players. It moves through a strict lifecycle
//! (waiting → live → ended) and carries a flattened settlement record once a score lands.
//!
//! The [`MatchLifecycle`] trait owns every state transition. Each transition runs in a single transaction that
//! re-reads the row, validates its preconditions against current state, and commits before any side effects run,
//! so the loser of a concurrent race observes post-transition state and fails cleanly.
//!
//! ## Traits
//! * [`MatchLifecycle`] — match creation and the five lifecycle transitions, plus the auto-accept sweep query.
//! * [`RatingManagement`] — idempotent rating application, reversal, and the read-side rating queries.
//! * [`ChallengeManagement`] — challenge and invite negotiation and their TTL expiry sweeps.
//! * [`PlayerManagement`] — minimal player records (the core needs ids, display names and rating counters).
mod challenge_management;
mod data_objects;
mod match_lifecycle;
mod player_management;
mod rating_management;

pub use challenge_management::{ChallengeApiError, ChallengeManagement};
pub use data_objects::{
    ChallengeBox,
    ChallengeOutcome,
    ChallengeSweepReport,
    HistoryRange,
    MatchSweepReport,
    PendingConfirmation,
    PressStartOutcome,
    RatingDelta,
    RatingOutcome,
    RatingSkipReason,
    Reputation,
    RevertOutcome,
    RevertSkipReason,
};
pub use match_lifecycle::{MatchFlowError, MatchLifecycle};
pub use player_management::{PlayerApiError, PlayerManagement};
pub use rating_management::{RatingApiError, RatingManagement};
