//! feedwire: a keyboard-driven terminal client for a self-hosted feed server.
//!
//! The library holds the client-side synchronization core (view state, stats,
//! navigation, pagination, optimistic mutations and the background refresh
//! chains) behind the [`api::Gateway`] seam, plus the terminal front-end in
//! [`ui`] that drives it.

pub mod api;
pub mod app;
pub mod config;
pub mod keybindings;
pub mod model;
pub mod preferences;
pub mod state;
pub mod storage;
pub mod sync;
pub mod theme;
pub mod ui;
pub mod util;
