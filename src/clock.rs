//! Frame clock and calendar.
//!
//! `draw_web()` fires at display rate with a variable delta. `TickClock` turns
//! that into whole ticks at `TICKS_PER_SEC` so timers (notifications, boosts)
//! advance deterministically. The calendar half reads the browser's local date,
//! which is what the daily streak is measured in.

use chrono::NaiveDate;

pub const TICKS_PER_SEC: u32 = 10;

/// Longest frame gap honoured, so a backgrounded tab does not fast-forward.
const MAX_FRAME_MS: f64 = 500.0;

pub struct TickClock {
    ms_per_tick: f64,
    /// Milliseconds not yet turned into ticks.
    carry_ms: f64,
    last_ms: Option<f64>,
}

impl TickClock {
    pub fn new(ticks_per_sec: u32) -> Self {
        Self {
            ms_per_tick: 1000.0 / ticks_per_sec.max(1) as f64,
            carry_ms: 0.0,
            last_ms: None,
        }
    }

    /// Feed a `performance.now()` timestamp; returns the ticks to run this frame.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let delta = self
            .last_ms
            .map(|prev| (now_ms - prev).clamp(0.0, MAX_FRAME_MS))
            .unwrap_or(0.0);
        self.last_ms = Some(now_ms);

        self.carry_ms += delta;
        let ticks = (self.carry_ms / self.ms_per_tick) as u32;
        self.carry_ms -= ticks as f64 * self.ms_per_tick;
        ticks
    }
}

/// Build a date from JS-style parts (`month0` is 0-based).
pub fn calendar_date(year: u32, month0: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year as i32, month0 + 1, day)
}

/// Local calendar date from the browser clock.
pub fn local_today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    calendar_date(now.get_full_year(), now.get_month(), now.get_date()).unwrap_or_default()
}

/// Wall clock in epoch milliseconds.
pub fn epoch_ms() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

/// Monotonic milliseconds for frame timing.
pub fn frame_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}
