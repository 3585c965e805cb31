//! Resolves purchased `Effect`s into presentation changes.

use chrono::Days;
use ratzilla::ratatui::style::Color;

use super::state::{ActiveBoost, TrackerState, TICKS_PER_MINUTE};
use super::store::{Effect, StoreItem};

/// Colors the renderer draws with. Swapped by theme unlocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: String,
    /// Titles, selection, gauges.
    pub accent: Color,
    pub border: Color,
    pub text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: "classic".into(),
            accent: Color::Cyan,
            border: Color::DarkGray,
            text: Color::White,
        }
    }
}

impl Palette {
    /// Built-in themes by name. Unknown names return `None`.
    pub fn named(name: &str) -> Option<Self> {
        let (accent, border, text) = match name {
            "classic" => return Some(Self::default()),
            "dark" => (Color::LightBlue, Color::Blue, Color::Gray),
            "sunrise" => (
                Color::Rgb(0xfc, 0xb6, 0x9f),
                Color::Rgb(0xff, 0xec, 0xd2),
                Color::White,
            ),
            _ => return None,
        };
        Some(Self {
            name: name.to_string(),
            accent,
            border,
            text,
        })
    }

    /// Theme derived from a `#rrggbb` item color.
    pub fn from_hex(name: &str, hex: &str) -> Option<Self> {
        let accent = parse_hex(hex)?;
        Some(Self {
            name: name.to_string(),
            accent,
            border: accent,
            text: Color::White,
        })
    }
}

/// Parse `#rrggbb` (or `rrggbb`) into an RGB color.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Apply the effect of a freshly bought `item`.
pub fn dispatch(state: &mut TrackerState, item: &StoreItem) {
    match &item.effect {
        Effect::Theme(name) => {
            apply_theme(state, item, name.as_deref());
            state.add_log(&format!("Theme applied: {}", state.palette.name), true);
        }
        Effect::Boost { percent, minutes } => {
            state.boosts.push(ActiveBoost {
                name: item.name.clone(),
                percent: *percent,
                ticks_left: minutes.saturating_mul(TICKS_PER_MINUTE),
            });
            state.add_log(
                &format!("{}% XP boost active for {} min", percent, minutes),
                true,
            );
        }
        Effect::StreakFreeze { days } => {
            let from = state.streak_freeze_until.unwrap_or(state.today).max(state.today);
            let until = from + Days::new(u64::from(*days));
            state.streak_freeze_until = Some(until);
            state.add_log(&format!("Streak protected until {until}"), true);
        }
        Effect::Feature(name) => {
            let flag = feature_flag(item, name);
            state.add_log(&format!("Feature enabled: {flag}"), true);
            state.features.insert(flag);
        }
        Effect::Announce => {
            let text = format!("Activated: {}!", item.name);
            state.add_log(&text, true);
            state.notify(&text);
        }
    }
}

/// Re-apply persistent unlocks (themes, features) after a load.
/// Timed effects are not restored.
pub fn restore_owned(state: &mut TrackerState) {
    let owned: Vec<StoreItem> = state
        .model
        .catalog
        .items()
        .iter()
        .filter(|i| state.model.catalog.is_owned(&i.id))
        .cloned()
        .collect();

    state.palette = Palette::default();
    state.features.clear();
    for item in &owned {
        match &item.effect {
            Effect::Theme(name) => apply_theme(state, item, name.as_deref()),
            Effect::Feature(name) => {
                state.features.insert(feature_flag(item, name));
            }
            _ => {}
        }
    }
}

fn apply_theme(state: &mut TrackerState, item: &StoreItem, name: Option<&str>) {
    let palette = name
        .and_then(Palette::named)
        .or_else(|| Palette::from_hex(name.unwrap_or(&item.name), &item.color));
    if let Some(palette) = palette {
        state.palette = palette;
    }
}

fn feature_flag(item: &StoreItem, name: &str) -> String {
    if name.is_empty() {
        item.name.clone()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn state() -> TrackerState {
        TrackerState::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn item(effect: Effect) -> StoreItem {
        StoreItem {
            id: "custom_1".into(),
            name: "Thing".into(),
            description: String::new(),
            price: 10,
            color: "#ff6b6b".into(),
            category: "feature".into(),
            effect,
        }
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("#ff6b6b"), Some(Color::Rgb(0xff, 0x6b, 0x6b)));
        assert_eq!(parse_hex("2c3e50"), Some(Color::Rgb(0x2c, 0x3e, 0x50)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gggggg"), None);
    }

    #[test]
    fn named_theme_switches_palette() {
        let mut s = state();
        dispatch(&mut s, &item(Effect::Theme(Some("dark".into()))));
        assert_eq!(s.palette.name, "dark");
        assert_eq!(s.palette, Palette::named("dark").unwrap());
    }

    #[test]
    fn bare_theme_uses_item_color() {
        let mut s = state();
        dispatch(&mut s, &item(Effect::Theme(None)));
        assert_eq!(s.palette.accent, Color::Rgb(0xff, 0x6b, 0x6b));
        assert_eq!(s.palette.name, "Thing");
    }

    #[test]
    fn boost_starts_timer_without_touching_progress() {
        let mut s = state();
        dispatch(
            &mut s,
            &item(Effect::Boost {
                percent: 20,
                minutes: 60,
            }),
        );
        assert_eq!(s.boosts.len(), 1);
        assert_eq!(s.boosts[0].ticks_left, 60 * TICKS_PER_MINUTE);
        assert_eq!(s.model.progress.current_xp, 0);
    }

    #[test]
    fn streak_freeze_extends_from_today() {
        let mut s = state();
        dispatch(&mut s, &item(Effect::StreakFreeze { days: 1 }));
        assert_eq!(s.streak_freeze_until, NaiveDate::from_ymd_opt(2024, 1, 2));
        dispatch(&mut s, &item(Effect::StreakFreeze { days: 2 }));
        assert_eq!(s.streak_freeze_until, NaiveDate::from_ymd_opt(2024, 1, 4));
        assert_eq!(s.model.progress.current_streak, 0);
    }

    #[test]
    fn feature_flag_falls_back_to_item_name() {
        let mut s = state();
        dispatch(&mut s, &item(Effect::Feature("notifications".into())));
        dispatch(&mut s, &item(Effect::Feature(String::new())));
        assert!(s.features.contains("notifications"));
        assert!(s.features.contains("Thing"));
    }

    #[test]
    fn announce_logs_and_notifies() {
        let mut s = state();
        dispatch(&mut s, &item(Effect::Announce));
        assert_eq!(s.log.last().unwrap().text, "Activated: Thing!");
        assert_eq!(s.notifications.len(), 1);
    }

    #[test]
    fn restore_owned_reapplies_theme_only_for_owned() {
        let mut s = state();
        s.model.catalog.seed_defaults_if_empty();
        restore_owned(&mut s);
        assert_eq!(s.palette, Palette::default());

        s.model.catalog.set_purchased(["theme2".to_string(), "boost1".to_string()]);
        restore_owned(&mut s);
        assert_eq!(s.palette.name, "sunrise");
        assert!(s.boosts.is_empty());
    }
}
