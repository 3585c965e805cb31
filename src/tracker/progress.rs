//! Score, XP, level, and daily streak bookkeeping. Pure transitions, no I/O.

use chrono::NaiveDate;

/// XP needed for level n is `BASE_XP_PER_LEVEL * n`.
pub const BASE_XP_PER_LEVEL: u64 = 100;

/// Levels stop here; XP keeps accumulating past the last threshold.
pub const MAX_LEVEL: u32 = 1_000_000;

/// Points granted on top of the triggering delta when it causes a level-up.
pub const LEVEL_UP_BONUS: i64 = 50;

/// XP required to reach level `n` from level `n - 1`.
pub fn xp_threshold(level: u32) -> u64 {
    BASE_XP_PER_LEVEL.saturating_mul(level as u64)
}

/// Result of `ProgressEngine::add_xp`.
#[derive(Clone, Debug, PartialEq)]
pub struct XpOutcome {
    pub new_level: u32,
    pub leveled_up: bool,
    /// One entry per level gained, in order: the level reached.
    pub level_ups: Vec<u32>,
}

/// Result of `ProgressEngine::apply_score_delta`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreOutcome {
    pub new_score: i64,
    pub leveled_up: bool,
    pub level_ups: Vec<u32>,
}

/// Owns the running score and the XP / level / streak progress.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEngine {
    pub score: i64,
    pub current_xp: u64,
    pub current_level: u32,
    pub current_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl Default for ProgressEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressEngine {
    pub fn new() -> Self {
        Self {
            score: 0,
            current_xp: 0,
            current_level: 1,
            current_streak: 0,
            last_activity_date: None,
        }
    }

    /// Add `delta` to the score. Positive deltas earn half their value as XP,
    /// and a resulting level-up adds a single `LEVEL_UP_BONUS` to the score.
    pub fn apply_score_delta(&mut self, delta: i64, today: NaiveDate) -> ScoreOutcome {
        self.score = self.score.saturating_add(delta);

        let mut level_ups = Vec::new();
        if delta > 0 {
            let xp_gain = (delta / 2) as u64;
            let outcome = self.add_xp(xp_gain, today);
            if outcome.leveled_up {
                // Bonus is a second, implicit delta and does not earn XP.
                self.score = self.score.saturating_add(LEVEL_UP_BONUS);
            }
            level_ups = outcome.level_ups;
        }

        ScoreOutcome {
            new_score: self.score,
            leveled_up: !level_ups.is_empty(),
            level_ups,
        }
    }

    /// Add XP, folding any excess into level-ups, then touch the streak.
    pub fn add_xp(&mut self, amount: u64, today: NaiveDate) -> XpOutcome {
        if amount == 0 {
            return XpOutcome {
                new_level: self.current_level,
                leveled_up: false,
                level_ups: Vec::new(),
            };
        }

        self.current_xp = self.current_xp.saturating_add(amount);
        let level_ups = self.settle_xp();
        self.touch_streak_for_today(today);

        XpOutcome {
            new_level: self.current_level,
            leveled_up: !level_ups.is_empty(),
            level_ups,
        }
    }

    /// Fold XP at or over the next threshold into level-ups. Returns the levels reached.
    pub(crate) fn settle_xp(&mut self) -> Vec<u32> {
        self.current_level = self.current_level.clamp(1, MAX_LEVEL);
        let mut level_ups = Vec::new();
        while self.current_level < MAX_LEVEL
            && self.current_xp >= xp_threshold(self.current_level + 1)
        {
            self.current_level += 1;
            self.current_xp -= xp_threshold(self.current_level);
            level_ups.push(self.current_level);
        }
        level_ups
    }

    /// Reconcile the streak against `today`.
    pub fn touch_streak_for_today(&mut self, today: NaiveDate) {
        match self.last_activity_date {
            None => self.current_streak = 1,
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => self.current_streak += 1,
            Some(_) => self.current_streak = 1,
        }
        self.last_activity_date = Some(today);
    }

    pub fn reset_progress(&mut self) {
        self.current_xp = 0;
        self.current_level = 1;
        self.current_streak = 0;
        self.last_activity_date = None;
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }

    /// Threshold the current XP is measured against.
    pub fn xp_for_next_level(&self) -> u64 {
        xp_threshold(self.current_level.saturating_add(1))
    }

    pub fn xp_remaining(&self) -> u64 {
        self.xp_for_next_level().saturating_sub(self.current_xp)
    }

    /// Progress toward the next level, 0..=100.
    pub fn progress_percent(&self) -> u16 {
        let pct = self.current_xp.saturating_mul(100) / self.xp_for_next_level();
        pct.min(100) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn threshold_formula() {
        assert_eq!(xp_threshold(1), 100);
        assert_eq!(xp_threshold(2), 200);
        assert_eq!(xp_threshold(3), 300);
    }

    #[test]
    fn add_xp_250_from_level_one() {
        let mut p = ProgressEngine::new();
        let out = p.add_xp(250, day(1));
        assert_eq!(p.current_level, 2);
        assert_eq!(p.current_xp, 50);
        assert!(out.leveled_up);
        assert_eq!(out.level_ups, vec![2]);
    }

    #[test]
    fn add_xp_multi_level_jump() {
        let mut p = ProgressEngine::new();
        // 200 → lv2, 300 → lv3, 400 → lv4, remainder 100
        let out = p.add_xp(1000, day(1));
        assert_eq!(out.level_ups, vec![2, 3, 4]);
        assert_eq!(p.current_level, 4);
        assert_eq!(p.current_xp, 100);
        assert!(p.current_xp < xp_threshold(p.current_level + 1));
    }

    #[test]
    fn add_xp_zero_is_noop() {
        let mut p = ProgressEngine::new();
        let out = p.add_xp(0, day(1));
        assert!(!out.leveled_up);
        assert_eq!(p.current_streak, 0);
        assert_eq!(p.last_activity_date, None);
    }

    #[test]
    fn add_xp_touches_streak_without_level_up() {
        let mut p = ProgressEngine::new();
        p.add_xp(5, day(1));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.last_activity_date, Some(day(1)));
    }

    #[test]
    fn positive_delta_earns_half_as_xp() {
        let mut p = ProgressEngine::new();
        let out = p.apply_score_delta(7, day(1));
        assert_eq!(out.new_score, 7);
        assert_eq!(p.current_xp, 3);
        assert!(!out.leveled_up);
    }

    #[test]
    fn one_point_delta_earns_no_xp_and_no_streak() {
        let mut p = ProgressEngine::new();
        p.apply_score_delta(1, day(1));
        assert_eq!(p.current_xp, 0);
        assert_eq!(p.current_streak, 0);
    }

    #[test]
    fn negative_delta_has_no_progress_effects() {
        let mut p = ProgressEngine::new();
        let out = p.apply_score_delta(-40, day(1));
        assert_eq!(out.new_score, -40);
        assert_eq!(p.current_xp, 0);
        assert_eq!(p.current_streak, 0);
        assert_eq!(p.last_activity_date, None);
    }

    #[test]
    fn level_up_grants_single_bonus() {
        let mut p = ProgressEngine::new();
        // 1000 points → 500 XP → lv2 (200) then lv3 (300), one bonus only
        let out = p.apply_score_delta(1000, day(1));
        assert_eq!(out.level_ups, vec![2, 3]);
        assert_eq!(out.new_score, 1000 + LEVEL_UP_BONUS);
        assert_eq!(p.current_xp, 0);
    }

    #[test]
    fn streak_same_day_is_idempotent() {
        let mut p = ProgressEngine::new();
        p.touch_streak_for_today(day(1));
        p.touch_streak_for_today(day(1));
        assert_eq!(p.current_streak, 1);
    }

    #[test]
    fn streak_consecutive_days_increment() {
        let mut p = ProgressEngine::new();
        p.touch_streak_for_today(day(1));
        p.touch_streak_for_today(day(2));
        p.touch_streak_for_today(day(3));
        assert_eq!(p.current_streak, 3);
    }

    #[test]
    fn streak_gap_resets() {
        let mut p = ProgressEngine::new();
        p.touch_streak_for_today(day(1));
        p.touch_streak_for_today(day(2));
        p.touch_streak_for_today(day(4));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.last_activity_date, Some(day(4)));
    }

    #[test]
    fn streak_future_date_resets() {
        let mut p = ProgressEngine::new();
        p.current_streak = 5;
        p.last_activity_date = Some(day(10));
        p.touch_streak_for_today(day(9));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.last_activity_date, Some(day(9)));
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let mut p = ProgressEngine::new();
        let feb_end = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        p.touch_streak_for_today(feb_end);
        p.touch_streak_for_today(day(1));
        assert_eq!(p.current_streak, 2);
    }

    #[test]
    fn reset_progress_keeps_score() {
        let mut p = ProgressEngine::new();
        p.apply_score_delta(600, day(1));
        p.reset_progress();
        assert_eq!(p.current_level, 1);
        assert_eq!(p.current_xp, 0);
        assert_eq!(p.current_streak, 0);
        assert_eq!(p.last_activity_date, None);
        assert_eq!(p.score, 650);
    }

    #[test]
    fn reset_score_keeps_progress() {
        let mut p = ProgressEngine::new();
        p.apply_score_delta(100, day(1));
        p.reset_score();
        assert_eq!(p.score, 0);
        assert_eq!(p.current_xp, 50);
    }

    #[test]
    fn extreme_deltas_saturate_instead_of_overflowing() {
        let mut p = ProgressEngine::new();
        p.score = i64::MAX - 10;
        let out = p.apply_score_delta(1_000_000_000, day(1));
        assert!(out.leveled_up);
        assert_eq!(p.score, i64::MAX);

        p.score = i64::MIN + 1;
        p.apply_score_delta(-1_000_000_000, day(1));
        assert_eq!(p.score, i64::MIN);
    }

    #[test]
    fn settle_stops_at_max_level() {
        let mut p = ProgressEngine::new();
        p.current_level = u32::MAX;
        p.current_xp = u64::MAX;
        assert!(p.settle_xp().is_empty());
        assert_eq!(p.current_level, MAX_LEVEL);
        assert_eq!(p.progress_percent(), 100);
        assert!(p.xp_for_next_level() > 0);
    }

    #[test]
    fn progress_percent_and_remaining() {
        let mut p = ProgressEngine::new();
        p.current_xp = 50;
        assert_eq!(p.xp_for_next_level(), 200);
        assert_eq!(p.xp_remaining(), 150);
        assert_eq!(p.progress_percent(), 25);
    }
}
