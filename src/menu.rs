//! Menu building and updating for the tray dropdown.

use crate::app::App;
use crate::models::{DayEntry, Settings, TimerMode, TimerStatus};
use crate::timer::format_time;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::BTreeMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_CYCLE: &str = "cycle";
pub const ID_GOAL: &str = "goal";
pub const ID_TOGGLE: &str = "toggle";
pub const ID_CONTINUE: &str = "continue";
pub const ID_END_SESSION: &str = "end_session";
pub const ID_RESET: &str = "reset";
pub const ID_AUTO_START_TOGGLE: &str = "auto_start_toggle";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_QUIT: &str = "quit";

// Prefixes of the choice submenus, followed by the numeric value.
pub const PREFIX_WORK: &str = "work_";
pub const PREFIX_SHORT: &str = "short_";
pub const PREFIX_LONG: &str = "long_";
pub const PREFIX_THRESHOLD: &str = "thresh_";
pub const PREFIX_GOAL: &str = "goal_";

const WORK_CHOICES: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_CHOICES: [u32; 4] = [3, 5, 10, 15];
const LONG_CHOICES: [u32; 4] = [10, 15, 20, 30];
const THRESHOLD_CHOICES: [u32; 5] = [2, 3, 4, 5, 6];
const GOAL_HOUR_CHOICES: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 8];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// A submenu of mutually exclusive numeric options.
pub struct ChoiceMenu {
    submenu: Submenu,
    checks: BTreeMap<u32, CheckMenuItem>,
}

impl ChoiceMenu {
    fn build(
        title: String,
        prefix: &str,
        choices: &[u32],
        current: u32,
        label: impl Fn(u32) -> String,
    ) -> Result<Self, MenuError> {
        let submenu = Submenu::new(title, true);
        let mut checks = BTreeMap::new();
        for &value in choices {
            let item = CheckMenuItem::with_id(
                MenuId::new(format!("{}{}", prefix, value)),
                label(value),
                true,
                value == current,
                None::<Accelerator>,
            );
            submenu.append(&item)?;
            checks.insert(value, item);
        }
        Ok(Self { submenu, checks })
    }

    fn update(&self, title: String, current: u32) {
        self.submenu.set_text(title);
        for (&value, check) in &self.checks {
            check.set_checked(value == current);
        }
    }
}

/// A submenu listing the seven days of one week.
pub struct WeekMenu {
    submenu: Submenu,
    days: Vec<MenuItem>,
}

impl WeekMenu {
    fn build(title: &str, week: &[DayEntry]) -> Result<Self, MenuError> {
        let submenu = Submenu::new(format_week_title(title, week), true);
        let mut days = Vec::with_capacity(week.len());
        for entry in week {
            let item = MenuItem::new(format_day(entry), false, None::<Accelerator>);
            submenu.append(&item)?;
            days.push(item);
        }
        Ok(Self { submenu, days })
    }

    fn update(&self, title: &str, week: &[DayEntry]) {
        self.submenu.set_text(format_week_title(title, week));
        for (item, entry) in self.days.iter().zip(week) {
            item.set_text(format_day(entry));
        }
    }
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub cycle: MenuItem,
    pub goal: MenuItem,
    pub this_week: WeekMenu,
    pub last_week: WeekMenu,
    pub toggle: MenuItem,
    pub continue_next: MenuItem,
    pub end_session: MenuItem,
    pub reset: MenuItem,
    pub work: ChoiceMenu,
    pub short_break: ChoiceMenu,
    pub long_break: ChoiceMenu,
    pub threshold: ChoiceMenu,
    pub daily_goal: ChoiceMenu,
    pub auto_start_toggle: CheckMenuItem,
    pub sound_toggle: CheckMenuItem,
    pub notif_toggle: CheckMenuItem,
}

/// Builds the complete menu structure.
pub fn build_menu(app: &App) -> Result<(Menu, MenuItems), MenuError> {
    let engine = &app.engine;
    let settings = app.settings();
    let goals = engine.goals();
    let menu = Menu::new();

    // Status display (disabled, info only)
    let status = info_item(
        ID_STATUS,
        format_status(engine.mode(), engine.status(), engine.remaining_secs()),
    );
    let progress = info_item(ID_PROGRESS, format_progress(engine.progress()));
    let cycle = info_item(
        ID_CYCLE,
        format_cycle(engine.completed_workflows(), settings.long_break_threshold()),
    );
    menu.append(&status)?;
    menu.append(&progress)?;
    menu.append(&cycle)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let goal = info_item(
        ID_GOAL,
        format_goal(
            goals.today_minutes(),
            goals.daily_goal_minutes(),
            goals.today_progress(),
        ),
    );
    menu.append(&goal)?;
    let this_week = WeekMenu::build("This Week", &goals.week_data(0))?;
    let last_week = WeekMenu::build("Last Week", &goals.week_data(-1))?;
    menu.append(&this_week.submenu)?;
    menu.append(&last_week.submenu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let toggle = MenuItem::with_id(
        MenuId::new(ID_TOGGLE),
        toggle_label(engine.status()),
        true,
        None::<Accelerator>,
    );
    let continue_next = MenuItem::with_id(
        MenuId::new(ID_CONTINUE),
        "⏭  Continue to Next Phase",
        engine.status() == TimerStatus::Pulsing,
        None::<Accelerator>,
    );
    let end_session = MenuItem::with_id(
        MenuId::new(ID_END_SESSION),
        end_session_label(engine.mode()),
        true,
        None::<Accelerator>,
    );
    let reset = MenuItem::with_id(
        MenuId::new(ID_RESET),
        "↺  Reset Timer",
        engine.status() != TimerStatus::Idle,
        None::<Accelerator>,
    );

    menu.append(&toggle)?;
    menu.append(&continue_next)?;
    menu.append(&end_session)?;
    menu.append(&reset)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Settings submenu
    let settings_menu = Submenu::new("⚙  Settings", true);

    let work = ChoiceMenu::build(
        work_title(&settings),
        PREFIX_WORK,
        &WORK_CHOICES,
        settings.work_mins,
        |m| format!("{} min", m),
    )?;
    let short_break = ChoiceMenu::build(
        short_title(&settings),
        PREFIX_SHORT,
        &SHORT_CHOICES,
        settings.short_break_mins,
        |m| format!("{} min", m),
    )?;
    let long_break = ChoiceMenu::build(
        long_title(&settings),
        PREFIX_LONG,
        &LONG_CHOICES,
        settings.long_break_mins,
        |m| format!("{} min", m),
    )?;
    let threshold = ChoiceMenu::build(
        threshold_title(&settings),
        PREFIX_THRESHOLD,
        &THRESHOLD_CHOICES,
        settings.workflow_count,
        |c| format!("{} sessions", c),
    )?;
    let daily_goal = ChoiceMenu::build(
        goal_title(goals.daily_goal_minutes()),
        PREFIX_GOAL,
        &GOAL_HOUR_CHOICES,
        goal_hours_choice(goals.daily_goal_minutes()),
        goal_hours_label,
    )?;

    for choice in [&work, &short_break, &long_break, &threshold] {
        settings_menu.append(&choice.submenu)?;
    }
    settings_menu.append(&PredefinedMenuItem::separator())?;
    settings_menu.append(&daily_goal.submenu)?;
    settings_menu.append(&PredefinedMenuItem::separator())?;

    // Toggle checkboxes
    let auto_start_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_AUTO_START_TOGGLE),
        "Auto-start Next Phase",
        true,
        settings.auto_start_next_session,
        None::<Accelerator>,
    );
    let sound_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_SOUND_TOGGLE),
        "Sound Enabled",
        true,
        settings.sound_enabled,
        None::<Accelerator>,
    );
    let notif_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_NOTIF_TOGGLE),
        "Notifications Enabled",
        true,
        settings.notifications_enabled,
        None::<Accelerator>,
    );
    settings_menu.append(&auto_start_toggle)?;
    settings_menu.append(&sound_toggle)?;
    settings_menu.append(&notif_toggle)?;

    menu.append(&settings_menu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = MenuItem::with_id(
        MenuId::new(ID_QUIT),
        "Quit Focusbar",
        true,
        None::<Accelerator>,
    );
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        cycle,
        goal,
        this_week,
        last_week,
        toggle,
        continue_next,
        end_session,
        reset,
        work,
        short_break,
        long_break,
        threshold,
        daily_goal,
        auto_start_toggle,
        sound_toggle,
        notif_toggle,
    };

    Ok((menu, items))
}

fn info_item(id: &str, text: String) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, app: &App) {
    let engine = &app.engine;
    let settings = app.settings();
    let goals = engine.goals();

    items.status.set_text(format_status(
        engine.mode(),
        engine.status(),
        engine.remaining_secs(),
    ));
    items.progress.set_text(format_progress(engine.progress()));
    items.cycle.set_text(format_cycle(
        engine.completed_workflows(),
        settings.long_break_threshold(),
    ));
    items.goal.set_text(format_goal(
        goals.today_minutes(),
        goals.daily_goal_minutes(),
        goals.today_progress(),
    ));
    items.this_week.update("This Week", &goals.week_data(0));
    items.last_week.update("Last Week", &goals.week_data(-1));

    items.toggle.set_text(toggle_label(engine.status()));
    items
        .continue_next
        .set_enabled(engine.status() == TimerStatus::Pulsing);
    items.end_session.set_text(end_session_label(engine.mode()));
    items
        .reset
        .set_enabled(engine.status() != TimerStatus::Idle);

    items
        .work
        .update(work_title(&settings), settings.work_mins);
    items
        .short_break
        .update(short_title(&settings), settings.short_break_mins);
    items
        .long_break
        .update(long_title(&settings), settings.long_break_mins);
    items
        .threshold
        .update(threshold_title(&settings), settings.workflow_count);
    items.daily_goal.update(
        goal_title(goals.daily_goal_minutes()),
        goal_hours_choice(goals.daily_goal_minutes()),
    );

    items
        .auto_start_toggle
        .set_checked(settings.auto_start_next_session);
    items.sound_toggle.set_checked(settings.sound_enabled);
    items
        .notif_toggle
        .set_checked(settings.notifications_enabled);
}

/// Formats the status line for the menu.
pub fn format_status(mode: TimerMode, status: TimerStatus, remaining_secs: u32) -> String {
    let time = format_time(remaining_secs);
    match status {
        TimerStatus::Idle => format!("{}  {} - {} ready", mode.glyph(), mode.label(), time),
        TimerStatus::Running => format!("⏱  {} - {} remaining", mode.label(), time),
        TimerStatus::Paused => format!("⏸  {} - {} (paused)", mode.label(), time),
        TimerStatus::Pulsing => format!("🔔  {} complete - continue when ready", mode.label()),
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(pct: f32) -> String {
    let pct = pct.clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

/// Formats the completed work sessions of the current cycle as dots.
pub fn format_cycle(completed: u32, threshold: u32) -> String {
    let done = completed.min(threshold) as usize;
    let todo = threshold as usize - done;
    format!("Cycle: {}{}", "●".repeat(done), "○".repeat(todo))
}

/// Formats today's goal line for the menu.
pub fn format_goal(today_minutes: u32, goal_minutes: u32, progress: f64) -> String {
    if goal_minutes == 0 {
        return format!("Today: {} (no goal)", format_minutes(today_minutes));
    }
    let pct = (progress * 100.0).floor() as u32;
    format!(
        "Today: {} / {}  ({}%)",
        format_minutes(today_minutes),
        format_minutes(goal_minutes),
        pct
    )
}

fn format_week_title(title: &str, week: &[DayEntry]) -> String {
    let total: u32 = week.iter().map(|d| d.minutes).sum();
    format!("{}: {}", title, format_minutes(total))
}

/// Formats one row of a week submenu.
pub fn format_day(entry: &DayEntry) -> String {
    format!(
        "{:<9}  {}  {}",
        entry.day_name,
        entry.date.format("%d.%m."),
        format_minutes(entry.minutes)
    )
}

/// Formats a number of minutes as `1h 05m` or `45 min`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

fn toggle_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Idle => "▶  Start",
        TimerStatus::Running => "⏸  Pause",
        TimerStatus::Paused => "▶  Resume",
        TimerStatus::Pulsing => "▶  Start Next Phase",
    }
}

fn end_session_label(mode: TimerMode) -> &'static str {
    if mode.is_break() {
        "⏹  End Break"
    } else {
        "⏹  End Work Session"
    }
}

fn work_title(settings: &Settings) -> String {
    format!("Work: {} min", settings.work_mins)
}

fn short_title(settings: &Settings) -> String {
    format!("Short Break: {} min", settings.short_break_mins)
}

fn long_title(settings: &Settings) -> String {
    format!("Long Break: {} min", settings.long_break_mins)
}

fn threshold_title(settings: &Settings) -> String {
    format!("Long Break After: {} sessions", settings.workflow_count)
}

fn goal_title(goal_minutes: u32) -> String {
    if goal_minutes == 0 {
        "Daily Goal: Off".to_string()
    } else {
        format!("Daily Goal: {}", format_minutes(goal_minutes))
    }
}

fn goal_hours_label(hours: u32) -> String {
    match hours {
        0 => "Off".to_string(),
        1 => "1 hour".to_string(),
        h => format!("{} hours", h),
    }
}

/// The whole-hour choice matching `goal_minutes`, or a value that matches no
/// choice when the goal is not a whole number of hours.
fn goal_hours_choice(goal_minutes: u32) -> u32 {
    if goal_minutes % 60 == 0 {
        goal_minutes / 60
    } else {
        u32::MAX
    }
}
