//! Tick scheduling for the session engine and tray title formatting.
//!
//! Background threads only produce [`TimerMessage`]s; the event loop drains
//! them and drives the engine, so all state changes happen on one thread.

use crate::models::{TimerMode, TimerStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pause between a phase completing and the next one starting on its own.
pub const AUTO_START_DELAY: Duration = Duration::from_millis(300);

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent from the timer threads to the main thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMessage {
    /// One second elapsed.
    Tick,
    /// The auto-start delay elapsed.
    Resume,
}

/// Source of the engine's 1 Hz ticks.
pub trait TickScheduler {
    /// Begins delivering ticks. Does nothing if already ticking.
    fn start(&mut self);

    /// Stops ticks and cancels any pending resume. Safe to call repeatedly.
    fn stop(&mut self);

    /// Cancels ticking and delivers a single resume after `delay`.
    fn schedule_resume(&mut self, delay: Duration);
}

/// [`TickScheduler`] backed by sleeping threads and an mpsc channel.
///
/// Each start, stop or resume bumps an epoch; threads from an older epoch
/// exit without sending.
pub struct ThreadTicker {
    tx: Sender<TimerMessage>,
    epoch: Arc<AtomicU64>,
    state: TickerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickerState {
    Stopped,
    Ticking,
    ResumePending,
}

impl ThreadTicker {
    pub fn new(tx: Sender<TimerMessage>) -> Self {
        Self {
            tx,
            epoch: Arc::new(AtomicU64::new(0)),
            state: TickerState::Stopped,
        }
    }

    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl TickScheduler for ThreadTicker {
    fn start(&mut self) {
        if self.state == TickerState::Ticking {
            return;
        }
        self.state = TickerState::Ticking;

        let my_epoch = self.next_epoch();
        let epoch = Arc::clone(&self.epoch);
        let tx = self.tx.clone();
        thread::spawn(move || loop {
            thread::sleep(TICK_INTERVAL);
            if epoch.load(Ordering::SeqCst) != my_epoch {
                break;
            }
            if tx.send(TimerMessage::Tick).is_err() {
                break;
            }
        });
    }

    fn stop(&mut self) {
        if self.state == TickerState::Stopped {
            return;
        }
        self.state = TickerState::Stopped;
        self.next_epoch();
    }

    fn schedule_resume(&mut self, delay: Duration) {
        self.state = TickerState::ResumePending;

        let my_epoch = self.next_epoch();
        let epoch = Arc::clone(&self.epoch);
        let tx = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if epoch.load(Ordering::SeqCst) == my_epoch {
                let _ = tx.send(TimerMessage::Resume);
            }
        });
    }
}

/// Formats the tray title based on current timer state.
pub fn format_tray_title(mode: TimerMode, status: TimerStatus, remaining_secs: u32) -> String {
    match status {
        TimerStatus::Idle => mode.glyph().to_string(),
        TimerStatus::Running => format!("{} {}", mode.glyph(), format_time(remaining_secs)),
        TimerStatus::Paused => format!("⏸ {}", format_time(remaining_secs)),
        TimerStatus::Pulsing => format!("🔔 {}", mode.glyph()),
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
