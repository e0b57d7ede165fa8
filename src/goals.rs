//! Daily focus goal, per-day work ledger and milestone detection.
//!
//! The tracker keeps three records in a [`KeyValueStore`]: the goal in
//! minutes, the minutes worked per calendar day, and the milestones already
//! announced per day. Every mutation writes all three back immediately.
//! Unreadable records are dropped and replaced by empty defaults; failed
//! writes are logged and the in-memory state stays authoritative.

use crate::models::DayEntry;
use crate::persistence::KeyValueStore;
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Percent-of-goal thresholds that trigger a one-time notification per day.
pub const MILESTONES: [u32; 5] = [25, 50, 75, 100, 125];

const GOAL_KEY: &str = "goal.daily_minutes";
const HISTORY_KEY: &str = "goal.work_history";
const MILESTONES_KEY: &str = "goal.notified_milestones";

pub struct GoalTracker {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Fn() -> NaiveDate>,
    daily_goal_minutes: u32,
    work_history: BTreeMap<String, u32>,
    notified_milestones: BTreeMap<String, BTreeSet<u32>>,
}

impl GoalTracker {
    /// Creates a tracker backed by `store`, restoring any persisted state.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let daily_goal_minutes = read_record(store.as_ref(), GOAL_KEY);
        let work_history = read_record(store.as_ref(), HISTORY_KEY);
        let notified_milestones = read_record(store.as_ref(), MILESTONES_KEY);

        Self {
            store,
            clock: Box::new(local_today),
            daily_goal_minutes,
            work_history,
            notified_milestones,
        }
    }

    /// Replaces the source of "today" used by the date-implicit methods.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the daily goal from a number of hours, rounded to whole minutes.
    /// Zero means no goal.
    pub fn set_daily_goal(&mut self, hours: f64) {
        // Float-to-int `as` saturates, so negatives land on 0.
        self.daily_goal_minutes = (hours * 60.0).round() as u32;
        debug!(minutes = self.daily_goal_minutes, "Daily goal updated");
        self.persist();
    }

    pub fn daily_goal_minutes(&self) -> u32 {
        self.daily_goal_minutes
    }

    /// Adds `minutes` of work to today's ledger entry.
    ///
    /// Returns the highest milestone newly crossed by this call, if any.
    pub fn record_work_session(&mut self, minutes: u32) -> Option<u32> {
        self.record_work_session_on(self.today(), minutes)
    }

    /// Adds `minutes` of work to the ledger entry for `date`.
    pub fn record_work_session_on(&mut self, date: NaiveDate, minutes: u32) -> Option<u32> {
        let key = date_key(date);
        let entry = self.work_history.entry(key.clone()).or_insert(0);
        let previous = *entry;
        *entry = previous.saturating_add(minutes);
        let current = *entry;

        let notified = self.notified_milestones.entry(key).or_default();
        let crossed: Vec<u32> = crossed_milestones(previous, current, self.daily_goal_minutes)
            .filter(|m| !notified.contains(m))
            .collect();
        notified.extend(crossed.iter().copied());
        if notified.is_empty() {
            // Keep the record free of empty day entries.
            self.notified_milestones.remove(&date_key(date));
        }

        self.persist();

        let highest = crossed.last().copied();
        if let Some(percent) = highest {
            info!(%date, percent, minutes = current, "Daily goal milestone reached");
        }
        highest
    }

    /// Minutes recorded for `date`, zero when absent.
    pub fn minutes_on(&self, date: NaiveDate) -> u32 {
        self.work_history
            .get(&date_key(date))
            .copied()
            .unwrap_or(0)
    }

    pub fn today_minutes(&self) -> u32 {
        self.minutes_on(self.today())
    }

    /// Fraction of the goal reached on `date`; zero when no goal is set.
    /// Can exceed 1.0 once the goal is surpassed.
    pub fn progress_on(&self, date: NaiveDate) -> f64 {
        if self.daily_goal_minutes == 0 {
            return 0.0;
        }
        self.minutes_on(date) as f64 / self.daily_goal_minutes as f64
    }

    pub fn today_progress(&self) -> f64 {
        self.progress_on(self.today())
    }

    /// Milestones already announced for `date`.
    #[cfg(test)]
    pub fn notified_milestones_on(&self, date: NaiveDate) -> Vec<u32> {
        self.notified_milestones
            .get(&date_key(date))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Monday through Sunday of the week `week_offset` weeks away from the
    /// current one (negative is the past).
    pub fn week_data(&self, week_offset: i32) -> Vec<DayEntry> {
        self.week_data_from(self.today(), week_offset)
    }

    /// Like [`week_data`](Self::week_data) with an explicit reference day.
    ///
    /// Offsets reaching past the calendar range clamp to its first or last
    /// week; the result always has seven entries.
    pub fn week_data_from(&self, reference: NaiveDate, week_offset: i32) -> Vec<DayEntry> {
        let this_monday = reference
            .checked_sub_signed(Duration::days(
                reference.weekday().num_days_from_monday() as i64,
            ))
            .unwrap_or(NaiveDate::MIN);
        let shifted = this_monday.checked_add_signed(Duration::weeks(week_offset as i64));
        let monday = match shifted {
            Some(monday) => monday,
            None if week_offset < 0 => NaiveDate::MIN,
            None => NaiveDate::MAX - Duration::days(6),
        };

        (0..7)
            .map(|i| {
                let date = monday
                    .checked_add_signed(Duration::days(i))
                    .unwrap_or(NaiveDate::MAX);
                DayEntry {
                    date,
                    minutes: self.minutes_on(date),
                    day_name: date.format("%A").to_string(),
                }
            })
            .collect()
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn persist(&self) {
        write_record(self.store.as_ref(), GOAL_KEY, &self.daily_goal_minutes);
        write_record(self.store.as_ref(), HISTORY_KEY, &self.work_history);
        write_record(self.store.as_ref(), MILESTONES_KEY, &self.notified_milestones);
    }
}

/// Thresholds `t` with `previous% < t <= current%`, ascending.
fn crossed_milestones(previous: u32, current: u32, goal: u32) -> impl Iterator<Item = u32> {
    let (previous_pct, current_pct) = if goal == 0 {
        (0, 0)
    } else {
        (percent_of(previous, goal), percent_of(current, goal))
    };
    MILESTONES
        .into_iter()
        .filter(move |&t| goal > 0 && previous_pct < t as u64 && t as u64 <= current_pct)
}

fn percent_of(minutes: u32, goal: u32) -> u64 {
    minutes as u64 * 100 / goal as u64
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn read_record<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match store.get(key) {
        Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(key, error = %e, "Discarding malformed goal record");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "Failed to read goal record");
            T::default()
        }
    }
}

fn write_record<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_vec(value)
        .map_err(|e| e.to_string())
        .and_then(|bytes| store.set(key, &bytes).map_err(|e| e.to_string()));
    if let Err(e) = result {
        warn!(key, error = %e, "Failed to persist goal record");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{Database, DatabaseError, StoreError};
    use std::rc::Rc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tracker_with_goal(minutes: u32) -> (GoalTracker, Rc<Database>) {
        let db = Rc::new(Database::new_in_memory().unwrap());
        let mut tracker = GoalTracker::load(Box::new(Rc::clone(&db)));
        tracker.set_daily_goal(minutes as f64 / 60.0);
        (tracker, db)
    }

    /// Fails every read and write.
    struct BrokenStore;

    fn store_failure() -> StoreError {
        DatabaseError::Sqlite(rusqlite::Error::InvalidQuery).into()
    }

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(store_failure())
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(store_failure())
        }
    }

    #[test]
    fn test_empty_store_defaults() {
        let db = Database::new_in_memory().unwrap();
        let tracker = GoalTracker::load(Box::new(db));
        assert_eq!(tracker.daily_goal_minutes(), 0);
        assert_eq!(tracker.today_minutes(), 0);
        assert_eq!(tracker.today_progress(), 0.0);
    }

    #[test]
    fn test_set_daily_goal_rounds_to_minutes() {
        let (mut tracker, _db) = tracker_with_goal(0);
        tracker.set_daily_goal(1.5);
        assert_eq!(tracker.daily_goal_minutes(), 90);
        tracker.set_daily_goal(0.333);
        assert_eq!(tracker.daily_goal_minutes(), 20);
        tracker.set_daily_goal(0.0);
        assert_eq!(tracker.daily_goal_minutes(), 0);
    }

    #[test]
    fn test_quarter_milestone_fires_once() {
        let (mut tracker, _db) = tracker_with_goal(100);
        let date = day(2024, 3, 4);

        for total in 1..=24 {
            assert_eq!(tracker.record_work_session_on(date, 1), None, "at {}", total);
        }
        assert_eq!(tracker.record_work_session_on(date, 1), Some(25));
        for _ in 26..=49 {
            assert_eq!(tracker.record_work_session_on(date, 1), None);
        }
        assert_eq!(tracker.notified_milestones_on(date), vec![25]);
    }

    #[test]
    fn test_large_jump_reports_highest_only() {
        let (mut tracker, _db) = tracker_with_goal(100);
        let date = day(2024, 3, 4);

        assert_eq!(tracker.record_work_session_on(date, 80), Some(75));
        assert_eq!(tracker.notified_milestones_on(date), vec![25, 50, 75]);

        // 75 is never reported again, 100 is next.
        assert_eq!(tracker.record_work_session_on(date, 19), None);
        assert_eq!(tracker.record_work_session_on(date, 1), Some(100));
    }

    #[test]
    fn test_all_milestones_including_overshoot() {
        let (mut tracker, _db) = tracker_with_goal(4);
        let date = day(2024, 3, 4);

        let fired: Vec<Option<u32>> = (0..6)
            .map(|_| tracker.record_work_session_on(date, 1))
            .collect();
        assert_eq!(
            fired,
            vec![Some(25), Some(50), Some(75), Some(100), Some(125), None]
        );
        assert_eq!(tracker.notified_milestones_on(date), MILESTONES.to_vec());
    }

    #[test]
    fn test_no_milestones_without_goal() {
        let (mut tracker, _db) = tracker_with_goal(0);
        let date = day(2024, 3, 4);
        assert_eq!(tracker.record_work_session_on(date, 500), None);
        assert_eq!(tracker.minutes_on(date), 500);
        assert!(tracker.notified_milestones_on(date).is_empty());
        assert_eq!(tracker.progress_on(date), 0.0);
    }

    #[test]
    fn test_milestones_are_per_day() {
        let (mut tracker, _db) = tracker_with_goal(4);
        assert_eq!(tracker.record_work_session_on(day(2024, 3, 4), 1), Some(25));
        assert_eq!(tracker.record_work_session_on(day(2024, 3, 5), 1), Some(25));
    }

    #[test]
    fn test_unsetting_goal_keeps_history() {
        let (mut tracker, _db) = tracker_with_goal(100);
        let date = day(2024, 3, 4);
        tracker.record_work_session_on(date, 30);
        tracker.set_daily_goal(0.0);
        assert_eq!(tracker.notified_milestones_on(date), vec![25]);

        // Restoring the goal does not re-announce what was already announced.
        tracker.set_daily_goal(100.0 / 60.0);
        assert_eq!(tracker.record_work_session_on(date, 1), None);
    }

    #[test]
    fn test_lowering_goal_fires_only_unseen_thresholds() {
        let (mut tracker, _db) = tracker_with_goal(100);
        let date = day(2024, 3, 4);
        tracker.record_work_session_on(date, 30);

        // 30/40 is already 75%, so 50 and 75 are passed without firing.
        tracker.set_daily_goal(40.0 / 60.0);
        assert_eq!(tracker.record_work_session_on(date, 1), None);
        assert_eq!(tracker.record_work_session_on(date, 9), Some(100));
    }

    #[test]
    fn test_progress_ratio() {
        let (mut tracker, _db) = tracker_with_goal(120);
        let date = day(2024, 3, 4);
        tracker.record_work_session_on(date, 30);
        assert!((tracker.progress_on(date) - 0.25).abs() < f64::EPSILON);
        tracker.record_work_session_on(date, 150);
        assert!((tracker.progress_on(date) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_today_helpers_follow_clock() {
        let (tracker, _db) = tracker_with_goal(100);
        let mut tracker = tracker.with_clock(|| day(2024, 3, 6));
        tracker.record_work_session(10);
        assert_eq!(tracker.minutes_on(day(2024, 3, 6)), 10);
        assert_eq!(tracker.today_minutes(), 10);
        assert!((tracker.today_progress() - 0.1).abs() < 1e-9);
        assert_eq!(tracker.minutes_on(day(2024, 3, 5)), 0);
    }

    #[test]
    fn test_week_data_spans_monday_to_sunday() {
        let (mut tracker, _db) = tracker_with_goal(0);
        // Wednesday
        let reference = day(2024, 3, 6);
        tracker.record_work_session_on(day(2024, 3, 4), 50);
        tracker.record_work_session_on(day(2024, 3, 10), 20);
        tracker.record_work_session_on(day(2024, 3, 11), 99);

        let week = tracker.week_data_from(reference, 0);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(2024, 3, 4));
        assert_eq!(week[0].day_name, "Monday");
        assert_eq!(week[0].minutes, 50);
        assert_eq!(week[6].date, day(2024, 3, 10));
        assert_eq!(week[6].day_name, "Sunday");
        assert_eq!(week[6].minutes, 20);
        assert!(week.iter().any(|d| d.date == reference));
        assert_eq!(week[2].minutes, 0);
    }

    #[test]
    fn test_week_data_offsets() {
        let (tracker, _db) = tracker_with_goal(0);
        let reference = day(2024, 1, 3);

        let last_week = tracker.week_data_from(reference, -1);
        assert_eq!(last_week[0].date, day(2023, 12, 25));
        assert_eq!(last_week[6].date, day(2023, 12, 31));

        let next_week = tracker.week_data_from(reference, 1);
        assert_eq!(next_week[0].date, day(2024, 1, 8));
    }

    #[test]
    fn test_week_data_extreme_offsets_clamp() {
        let (tracker, _db) = tracker_with_goal(0);
        let reference = day(2024, 3, 6);

        let earliest = tracker.week_data_from(reference, i32::MIN);
        assert_eq!(earliest.len(), 7);
        assert_eq!(earliest[0].date, NaiveDate::MIN);
        assert!(earliest.windows(2).all(|w| w[0].date < w[1].date));

        let latest = tracker.week_data_from(reference, i32::MAX);
        assert_eq!(latest.len(), 7);
        assert_eq!(latest[6].date, NaiveDate::MAX);
        assert!(latest.iter().all(|d| d.minutes == 0));
    }

    #[test]
    fn test_week_data_on_sunday_and_monday() {
        let (tracker, _db) = tracker_with_goal(0);
        let sunday = tracker.week_data_from(day(2024, 3, 10), 0);
        assert_eq!(sunday[0].date, day(2024, 3, 4));
        let monday = tracker.week_data_from(day(2024, 3, 11), 0);
        assert_eq!(monday[0].date, day(2024, 3, 11));
    }

    #[test]
    fn test_current_week_contains_today() {
        let (tracker, _db) = tracker_with_goal(0);
        let tracker = tracker.with_clock(|| day(2024, 3, 7));
        let week = tracker.week_data(0);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(2024, 3, 4));
        assert!(week.iter().any(|d| d.date == day(2024, 3, 7)));
        assert!(week.iter().all(|d| d.minutes == 0));

        let last_week = tracker.week_data(-1);
        assert_eq!(last_week[0].date, day(2024, 2, 26));
    }

    #[test]
    fn test_state_round_trips_through_store() {
        let (mut tracker, db) = tracker_with_goal(100);
        tracker.record_work_session_on(day(2024, 3, 4), 60);
        tracker.record_work_session_on(day(2024, 3, 5), 10);

        let reloaded = GoalTracker::load(Box::new(Rc::clone(&db)));
        assert_eq!(reloaded.daily_goal_minutes(), 100);
        assert_eq!(reloaded.work_history, tracker.work_history);
        assert_eq!(reloaded.notified_milestones, tracker.notified_milestones);
        assert_eq!(reloaded.notified_milestones_on(day(2024, 3, 4)), vec![25, 50]);
    }

    #[test]
    fn test_malformed_records_are_discarded() {
        let db = Rc::new(Database::new_in_memory().unwrap());
        db.set(GOAL_KEY, b"120").unwrap();
        db.set(HISTORY_KEY, b"{not json").unwrap();
        db.set(MILESTONES_KEY, br#"{"2024-03-04": "oops"}"#).unwrap();

        let tracker = GoalTracker::load(Box::new(Rc::clone(&db)));
        assert_eq!(tracker.daily_goal_minutes(), 120);
        assert!(tracker.work_history.is_empty());
        assert!(tracker.notified_milestones.is_empty());
    }

    #[test]
    fn test_broken_store_keeps_memory_state() {
        let mut tracker = GoalTracker::load(Box::new(BrokenStore));
        tracker.set_daily_goal(1.0);
        let date = day(2024, 3, 4);
        assert_eq!(tracker.record_work_session_on(date, 15), Some(25));
        assert_eq!(tracker.minutes_on(date), 15);
        assert_eq!(tracker.record_work_session_on(date, 1), None);
    }
}
