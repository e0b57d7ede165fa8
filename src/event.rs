//! Menu event handling.

use crate::app::App;
use crate::menu::{
    ID_AUTO_START_TOGGLE, ID_CONTINUE, ID_END_SESSION, ID_NOTIF_TOGGLE, ID_QUIT, ID_RESET,
    ID_SOUND_TOGGLE, ID_TOGGLE, PREFIX_GOAL, PREFIX_LONG, PREFIX_SHORT, PREFIX_THRESHOLD,
    PREFIX_WORK,
};
use crate::models::TimerStatus;
use tracing::debug;

/// Result of handling a menu event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event handled, nothing to refresh.
    Continue,
    /// User requested quit.
    Quit,
    /// Timer state changed, menu and title need update.
    StateChanged,
    /// Settings changed, menu needs update.
    SettingsChanged,
}

/// Handles the menu item with `id` and updates the app state accordingly.
pub fn handle_menu_event(app: &mut App, id: &str) -> EventResult {
    debug!(id, "Menu event");

    match id {
        ID_TOGGLE => {
            // The toggle item reads "Start Next Phase" once a phase has finished.
            if app.engine.status() == TimerStatus::Pulsing {
                app.engine.continue_to_next_phase();
            } else {
                app.engine.toggle_start_pause();
            }
            EventResult::StateChanged
        }
        ID_CONTINUE => {
            app.engine.continue_to_next_phase();
            EventResult::StateChanged
        }
        ID_END_SESSION => {
            app.engine.end_current_session();
            EventResult::StateChanged
        }
        ID_RESET => {
            app.engine.reset_current_mode();
            EventResult::StateChanged
        }
        ID_AUTO_START_TOGGLE => {
            app.update_setting(|s| s.auto_start_next_session = !s.auto_start_next_session);
            EventResult::SettingsChanged
        }
        ID_SOUND_TOGGLE => {
            app.update_setting(|s| s.sound_enabled = !s.sound_enabled);
            EventResult::SettingsChanged
        }
        ID_NOTIF_TOGGLE => {
            app.update_setting(|s| s.notifications_enabled = !s.notifications_enabled);
            EventResult::SettingsChanged
        }
        ID_QUIT => EventResult::Quit,
        _ => handle_choice(app, id).unwrap_or(EventResult::Continue),
    }
}

/// Handles picks from the numeric choice submenus.
fn handle_choice(app: &mut App, id: &str) -> Option<EventResult> {
    let (prefix, value) = split_choice(id)?;

    match prefix {
        PREFIX_WORK => app.update_setting(|s| s.work_mins = value),
        PREFIX_SHORT => app.update_setting(|s| s.short_break_mins = value),
        PREFIX_LONG => app.update_setting(|s| s.long_break_mins = value),
        PREFIX_THRESHOLD => app.update_setting(|s| s.workflow_count = value),
        PREFIX_GOAL => app.set_daily_goal(value as f64),
        _ => return None,
    }
    Some(EventResult::SettingsChanged)
}

/// Splits `work_25` into `("work_", 25)`.
fn split_choice(id: &str) -> Option<(&str, u32)> {
    let split = id.rfind('_')? + 1;
    let value = id[split..].parse().ok()?;
    Some((&id[..split], value))
}
