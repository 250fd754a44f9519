//! # CourtRank engine public API
//!
//! The `api` module exposes the programmatic API for the CourtRank engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want, or run
//! different parts (e.g. match flow and read-only rating queries) on different machines.
//!
//! * [`match_flow_api`] is the primary API: the match lifecycle state machine, provisional rating application and
//!   reversal, and the settlement sweep.
//! * [`rating_api`] provides read-only access to ratings, rank history and reputation.
//! * [`challenge_api`] handles challenge and invite negotiation, and their TTL sweep.
//! * [`player_api`] manages the minimal player records the engine needs.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend
//! that implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use courtrank_engine::{RatingApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements RatingManagement
//! let api = RatingApi::new(db);
//! let rating = api.rating_for("user-1").await?;
//! ```
pub mod challenge_api;
pub mod match_flow_api;
pub mod player_api;
pub mod rating_api;

pub use challenge_api::ChallengeApi;
pub use match_flow_api::MatchFlowApi;
pub use player_api::PlayerApi;
pub use rating_api::RatingApi;
