//! Client-side synchronization core.
//!
//! Pure state transitions over [`crate::state::AppState`] plus the two
//! long-running gateway chains (bootstrap and status poll). Nothing here
//! draws to the terminal.

pub mod debounce;
pub mod fuzzy;
pub mod mutation;
pub mod navigation;
pub mod pagination;
pub mod refresh;
pub mod stats;

pub use debounce::Debouncer;
pub use fuzzy::FuzzySelector;
pub use mutation::StatusChange;
pub use navigation::{ScrollArea, ScrollDirection, ROW_UNITS};
pub use pagination::RefreshPlan;
pub use stats::FilteredStats;
