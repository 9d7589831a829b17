//! Background event processing.

use crate::app::{App, AppEvent};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::State { generation, state } => {
            tracing::trace!(generation, state = state.name(), "List state received");
            app.on_state(generation, state);
        }
        AppEvent::FeedsLoaded { generation, result } => app.on_feeds_loaded(generation, result),
        AppEvent::EntryLoaded {
            generation,
            entry_id,
            result,
        } => app.on_entry_loaded(generation, entry_id, result),
        AppEvent::SearchCompleted { generation, result } => {
            app.on_search_completed(generation, result)
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.show_error(format!("Failed to {}: {}", task, error));
        }
    }
}
