//! Focusbar - a menubar Pomodoro timer with daily focus goals.
//!
//! Alternates work and break phases, counts focused minutes per day and
//! announces progress toward a daily goal, all from the menubar.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use muda::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};
use tracing::{info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod app;
mod audio;
mod engine;
mod event;
mod goals;
mod logging;
mod menu;
mod models;
mod notifications;
mod persistence;
mod timer;

use app::App;
use audio::{AudioPlayer, Chime};
use engine::EngineEvent;
use event::EventResult;
use menu::MenuItems;
use timer::{ThreadTicker, TimerMessage};

/// How often the event loop wakes to drain timer and menu events.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application handler for the winit event loop.
struct Focusbar {
    app: App,
    tray: Option<TrayIcon>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
    engine_rx: Receiver<EngineEvent>,
    audio: Option<AudioPlayer>,
}

impl Focusbar {
    fn new(
        app: App,
        tray: TrayIcon,
        timer_rx: Receiver<TimerMessage>,
        engine_rx: Receiver<EngineEvent>,
    ) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = match AudioPlayer::new() {
            Ok(player) => Some(player),
            Err(e) => {
                warn!(error = %e, "Audio unavailable, chimes disabled");
                None
            }
        };

        Self {
            app,
            tray: Some(tray),
            menu_items: None,
            timer_rx,
            engine_rx,
            audio,
        }
    }

    fn set_menu_items(&mut self, items: MenuItems) {
        self.menu_items = Some(items);
    }

    fn refresh(&self) {
        if let Some(ref items) = self.menu_items {
            menu::update_menu_items(items, &self.app);
        }
        if let Some(ref tray) = self.tray {
            let engine = &self.app.engine;
            let title =
                timer::format_tray_title(engine.mode(), engine.status(), engine.remaining_secs());
            tray.set_title(Some(title));
        }
    }

    /// Drains engine events; returns true if any arrived.
    fn process_engine_events(&mut self) -> bool {
        let mut changed = false;
        let mut sound_enabled = None;
        while let Ok(event) = self.engine_rx.try_recv() {
            changed = true;
            let (Some(audio), Some(chime)) = (&self.audio, Chime::for_event(&event)) else {
                continue;
            };
            if *sound_enabled.get_or_insert_with(|| self.app.settings().sound_enabled) {
                audio.play_chime(chime);
            }
        }
        changed
    }

    /// Applies queued ticks and menu clicks; returns true if the UI needs a
    /// refresh.
    fn process_input(&mut self, event_loop: &ActiveEventLoop) -> bool {
        let clicks: Vec<MenuEvent> = MenuEvent::receiver().try_iter().collect();
        let results = apply_input(
            &mut self.app,
            &self.timer_rx,
            clicks.iter().map(|event| event.id().as_ref()),
        );

        let mut changed = false;
        for result in results {
            match result {
                EventResult::Quit => {
                    info!("Quit requested");
                    event_loop.exit();
                }
                EventResult::StateChanged | EventResult::SettingsChanged => changed = true,
                EventResult::Continue => {}
            }
        }
        changed
    }
}

/// Feeds pending ticks and resumes into the engine, then handles `clicks`.
///
/// Ticks queued before a click belong to the state the click acts on.
fn apply_input<'a>(
    app: &mut App,
    timer_rx: &Receiver<TimerMessage>,
    clicks: impl IntoIterator<Item = &'a str>,
) -> Vec<EventResult> {
    while let Ok(msg) = timer_rx.try_recv() {
        match msg {
            TimerMessage::Tick => app.engine.tick(),
            TimerMessage::Resume => app.engine.resume_auto_start(),
        }
    }

    clicks
        .into_iter()
        .map(|id| event::handle_menu_event(app, id))
        .collect()
}

impl ApplicationHandler for Focusbar {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));

        let input_changed = self.process_input(event_loop);
        let engine_changed = self.process_engine_events();

        if input_changed || engine_changed {
            self.refresh();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    // Ticks travel from the ticker threads to the event loop
    let (timer_tx, timer_rx) = mpsc::channel();
    let ticker = ThreadTicker::new(timer_tx);

    let mut app = App::new(Box::new(ticker))?;

    // Engine events are forwarded to the event loop for UI and sound
    let (engine_tx, engine_rx) = mpsc::channel();
    app.engine.subscribe(Box::new(move |event: &EngineEvent| {
        let _ = engine_tx.send(*event);
    }));

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = menu::build_menu(&app)?;

    // Create tray icon (no icon image, just use title text on macOS)
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title(timer::format_tray_title(
            app.engine.mode(),
            app.engine.status(),
            app.engine.remaining_secs(),
        ))
        .with_tooltip("Focusbar - Pomodoro Timer")
        .build()?;

    info!(
        goal_minutes = app.engine.goals().daily_goal_minutes(),
        today_minutes = app.engine.goals().today_minutes(),
        "Focusbar started"
    );

    let mut focusbar = Focusbar::new(app, tray, timer_rx, engine_rx);
    focusbar.set_menu_items(menu_items);

    event_loop.run_app(&mut focusbar)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::ID_TOGGLE;
    use crate::models::TimerStatus;
    use crate::persistence::Database;
    use crate::timer::TickScheduler;
    use std::rc::Rc;

    struct NoopScheduler;

    impl TickScheduler for NoopScheduler {
        fn start(&mut self) {}
        fn stop(&mut self) {}
        fn schedule_resume(&mut self, _delay: Duration) {}
    }

    fn create_test_app() -> App {
        let db = Rc::new(Database::new_in_memory().unwrap());
        let mut app = App::with_db(db, Box::new(NoopScheduler));
        app.update_setting(|s| s.notifications_enabled = false);
        app
    }

    #[test]
    fn test_queued_tick_applies_before_pause() {
        let mut app = create_test_app();
        let (tx, rx) = mpsc::channel();
        app.engine.toggle_start_pause();
        let total = app.engine.total_secs();

        tx.send(TimerMessage::Tick).unwrap();
        let results = apply_input(&mut app, &rx, [ID_TOGGLE]);

        assert_eq!(results, vec![EventResult::StateChanged]);
        assert_eq!(app.engine.status(), TimerStatus::Paused);
        assert_eq!(app.engine.remaining_secs(), total - 1);
    }

    #[test]
    fn test_ticks_without_clicks() {
        let mut app = create_test_app();
        let (tx, rx) = mpsc::channel();
        app.engine.toggle_start_pause();
        let total = app.engine.total_secs();

        tx.send(TimerMessage::Tick).unwrap();
        tx.send(TimerMessage::Tick).unwrap();
        assert!(apply_input(&mut app, &rx, std::iter::empty()).is_empty());
        assert_eq!(app.engine.remaining_secs(), total - 2);
    }
}
