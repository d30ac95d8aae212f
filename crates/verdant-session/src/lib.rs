//! Verdant Allocation Session
//!
//! Holds the state of one allocation screen: the organization hierarchy,
//! the flat customer/product/custom-property lists and the level toggles.
//! User intents arrive as [`AllocationEvent`]s and are applied one at a
//! time by a single writer.
//!
//! # Input Policy
//!
//! The allocation engine accepts any value. Sanitization happens here, at
//! the boundary, according to [`InputPolicy`].
//!
//! # Configuration
//!
//! [`SessionConfig::from_env`] reads `VERDANT_CLAMP_INPUTS`,
//! `VERDANT_LEVELS` and `VERDANT_LOG`.

mod config;
mod error;
mod events;
mod session;

pub use config::{InputPolicy, SessionConfig, DEFAULT_LOG_FILTER};
pub use error::{Result, SessionError};
pub use events::{AllocationEvent, FlatList};
pub use session::{
    load_events, AllocationSession, FlatSummary, ReplaySummary, SessionSeed, SessionSnapshot,
};
