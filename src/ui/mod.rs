//! Terminal user interface.
//!
//! - `loop_runner`: the single-owner event loop and terminal management
//! - `input`: keyboard dispatch through the keybinding registry
//! - `events`: applying background task completions
//! - `render`: layout and overlays
//! - `feeds`, `articles`, `reader`, `status`, `help`: widgets

mod articles;
mod events;
mod feeds;
mod help;
mod input;
mod loop_runner;
mod reader;
mod render;
mod status;

pub use events::handle_app_event;
pub use input::handle_input;
pub use loop_runner::{run, Action};
