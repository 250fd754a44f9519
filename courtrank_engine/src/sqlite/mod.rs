//! SQLite database module for the CourtRank engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
