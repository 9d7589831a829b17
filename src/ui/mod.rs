//! Terminal user interface.
//!
//! - `loop_runner` - main event loop and terminal management
//! - `input` - key dispatch through the keybinding registry
//! - `events` - background event processing
//! - `render` - layout and overlays
//! - `entries`, `feeds`, `search`, `detail`, `status` - per-area widgets

mod detail;
mod entries;
mod events;
mod feeds;
mod input;
mod loop_runner;
mod render;
mod search;
mod status;

pub use loop_runner::{run, Action};
