//! newsdesk: a terminal reader for a locally cached news store.
//!
//! The entry list display state machine lives in [`entries`]; [`storage`]
//! and [`sync`] back it, [`app`] and [`ui`] put it on a terminal.

pub mod app;
pub mod config;
pub mod entries;
pub mod keybindings;
pub mod storage;
pub mod sync;
pub mod theme;
pub mod ui;
pub mod util;
