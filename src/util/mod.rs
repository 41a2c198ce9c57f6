//! Small helpers shared across the crate.
//!
//! - **Text**: terminal-width aware truncation, control-character stripping
//!   and HTML flattening for the reading pane
//! - **URLs**: scheme checks before links leave the application
//! - **Tasks**: panic capture for spawned work

mod task;
mod text;
mod url_validator;

pub use task::catch_task_panic;
pub use text::{
    decode_entities, display_width, html_to_paragraphs, strip_control_chars, truncate_to_width,
};
pub use url_validator::{validate_server_url, validate_url_for_open, UrlValidationError};

/// Longest search term sent to the server.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
