//! The entry list: display state machine, its policies, and the model
//! that drives it.
//!
//! Data flows one way. [`EntriesModel`] publishes [`DisplayState`]s on a
//! watch channel; a [`StateSubscription`] forwards them to the UI while the
//! list is in the foreground; [`EntriesScreen`] renders them and turns user
//! input back into [`EntriesCommands`] calls.

mod commands;
mod filter;
mod model;
mod screen;
mod state;
mod subscription;
mod swipe;
mod toolbar;
mod tracking;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{CommandError, CommandFailure, ConfMutator, EntriesCommands, Navigation};
pub use filter::EntriesFilter;
pub use model::{EntriesModel, ModelContext, INITIAL_SYNC_MESSAGE};
pub use screen::EntriesScreen;
pub use state::{DisplayState, Panel, PanelKind, ShowingCachedEntries};
pub use subscription::StateSubscription;
pub use swipe::{EntryCommand, ReversibleAction, SwipeAction, SwipeDirection, UndoSlot};
pub use toolbar::{toolbar, Toolbar};
pub use tracking::SeenEntries;
