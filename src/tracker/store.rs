//! Store catalog, purchase set, and item effects as data.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::progress::ProgressEngine;
use crate::error::{Result, TrackerError};

/// Side effect a purchased item asks the presentation layer to perform.
///
/// Persisted as an opaque string marker (`"theme:dark"`, `"boost:20:60"`, ...).
/// Bare markers from hand-written JSON (`"theme"`, `"boost"`) fall back to
/// defaults; anything unrecognized becomes `Announce`.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Effect {
    /// Switch the palette. `None` means "derive from the item's color".
    Theme(Option<String>),
    Boost { percent: u32, minutes: u32 },
    StreakFreeze { days: u32 },
    Feature(String),
    #[default]
    Announce,
}

impl From<String> for Effect {
    fn from(marker: String) -> Self {
        let mut parts = marker.split(':');
        let kind = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let num = |i: usize, default: u32| {
            args.get(i)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(default)
        };
        match kind {
            "theme" => Effect::Theme(args.first().map(|s| s.to_string())),
            "boost" => Effect::Boost {
                percent: num(0, 20),
                minutes: num(1, 60),
            },
            "streak" => Effect::StreakFreeze { days: num(0, 1) },
            "feature" => Effect::Feature(args.first().map(|s| s.to_string()).unwrap_or_default()),
            _ => Effect::Announce,
        }
    }
}

impl From<Effect> for String {
    fn from(effect: Effect) -> Self {
        effect.to_string()
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Theme(None) => write!(f, "theme"),
            Effect::Theme(Some(name)) => write!(f, "theme:{name}"),
            Effect::Boost { percent, minutes } => write!(f, "boost:{percent}:{minutes}"),
            Effect::StreakFreeze { days } => write!(f, "streak:{days}"),
            Effect::Feature(name) if name.is_empty() => write!(f, "feature"),
            Effect::Feature(name) => write!(f, "feature:{name}"),
            Effect::Announce => write!(f, "announce"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    #[serde(default = "default_color")]
    pub color: String,
    /// Open-ended: theme / boost / streak / feature / anything.
    #[serde(rename = "type", default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub effect: Effect,
}

fn default_color() -> String {
    "#3498db".to_string()
}

fn default_category() -> String {
    "feature".to_string()
}

/// Prefix for user-created item ids. Only these are editable from the UI.
pub const CUSTOM_PREFIX: &str = "custom_";

impl StoreItem {
    pub fn is_custom(&self) -> bool {
        self.id.starts_with(CUSTOM_PREFIX)
    }
}

/// Built-in items seeded into an empty catalog.
pub fn default_items() -> Vec<StoreItem> {
    let item = |id: &str, name: &str, description: &str, price, color: &str, category: &str, effect| {
        StoreItem {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
            color: color.into(),
            category: category.into(),
            effect,
        }
    };
    vec![
        item(
            "theme1",
            "🌙 Dark Theme",
            "Unlock a beautiful dark theme for your tracker",
            100,
            "#2c3e50",
            "theme",
            Effect::Theme(Some("dark".into())),
        ),
        item(
            "theme2",
            "🌅 Sunrise Theme",
            "Bright and cheerful sunrise theme",
            150,
            "#fcb69f",
            "theme",
            Effect::Theme(Some("sunrise".into())),
        ),
        item(
            "boost1",
            "⚡ XP Boost",
            "Gain 20% more XP for 1 hour",
            200,
            "#f1c40f",
            "boost",
            Effect::Boost {
                percent: 20,
                minutes: 60,
            },
        ),
        item(
            "streak1",
            "🔥 Streak Freeze",
            "Protect your streak for 1 day",
            150,
            "#e74c3c",
            "streak",
            Effect::StreakFreeze { days: 1 },
        ),
    ]
}

/// Partial update for `ItemCatalog::edit`. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub color: Option<String>,
    pub category: Option<String>,
}

/// Successful purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct Purchase {
    pub item: StoreItem,
    pub new_score: i64,
}

/// Purchasable items plus the set of owned ids.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: Vec<StoreItem>,
    purchased: BTreeSet<String>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_defaults_if_empty(&mut self) -> bool {
        if !self.items.is_empty() {
            return false;
        }
        self.items = default_items();
        true
    }

    pub fn add(&mut self, item: StoreItem) -> Result<()> {
        if self.get(&item.id).is_some() {
            return Err(TrackerError::InvalidInput(format!(
                "duplicate item id: {}",
                item.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn edit(&mut self, id: &str, patch: ItemPatch) -> Result<()> {
        if patch.price == Some(0) {
            return Err(TrackerError::InvalidInput("price must be positive".into()));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| TrackerError::UnknownItem(id.to_string()))?;
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(color) = patch.color {
            item.color = color;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        Ok(())
    }

    /// Remove an item and forget that it was ever bought.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.purchased.remove(id);
        self.items.len() != before
    }

    /// Buy `id`, debiting the price through the score engine.
    pub fn purchase(
        &mut self,
        id: &str,
        engine: &mut ProgressEngine,
        today: NaiveDate,
    ) -> Result<Purchase> {
        if self.purchased.contains(id) {
            return Err(TrackerError::AlreadyOwned(id.to_string()));
        }
        let item = self
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::UnknownItem(id.to_string()))?;
        if !Self::affordable(&item, engine.score) {
            return Err(TrackerError::InsufficientFunds {
                price: item.price,
                score: engine.score,
            });
        }

        let outcome = engine.apply_score_delta(-price_as_delta(item.price), today);
        self.purchased.insert(item.id.clone());
        Ok(Purchase {
            item,
            new_score: outcome.new_score,
        })
    }

    /// Unique `custom_<n>` id, starting from `stamp` (e.g. epoch millis).
    pub fn next_custom_id(&self, stamp: u64) -> String {
        let mut n = stamp;
        loop {
            let id = format!("{CUSTOM_PREFIX}{n}");
            if self.get(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    pub fn is_owned(&self, id: &str) -> bool {
        self.purchased.contains(id)
    }

    pub fn is_affordable(&self, id: &str, score: i64) -> bool {
        self.get(id).is_some_and(|i| Self::affordable(i, score))
    }

    fn affordable(item: &StoreItem, score: i64) -> bool {
        score >= price_as_delta(item.price)
    }

    pub fn get(&self, id: &str) -> Option<&StoreItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[StoreItem] {
        &self.items
    }

    pub fn purchased_ids(&self) -> &BTreeSet<String> {
        &self.purchased
    }

    /// Replace the whole catalog. Ownership is left as is.
    pub fn set_items(&mut self, items: Vec<StoreItem>) {
        self.items = items;
    }

    pub fn set_purchased<I: IntoIterator<Item = String>>(&mut self, ids: I) {
        self.purchased = ids.into_iter().collect();
    }
}

fn price_as_delta(price: u64) -> i64 {
    i64::try_from(price).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn seeded() -> ItemCatalog {
        let mut c = ItemCatalog::new();
        c.seed_defaults_if_empty();
        c
    }

    fn custom(id: &str, price: u64) -> StoreItem {
        StoreItem {
            id: id.into(),
            name: "Thing".into(),
            description: String::new(),
            price,
            color: "#fff".into(),
            category: "feature".into(),
            effect: Effect::Announce,
        }
    }

    #[test]
    fn seed_only_when_empty() {
        let mut c = ItemCatalog::new();
        assert!(c.seed_defaults_if_empty());
        assert_eq!(c.items().len(), 4);
        assert!(!c.seed_defaults_if_empty());
        assert_eq!(c.items().len(), 4);
    }

    #[test]
    fn purchase_debits_and_records() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 250;
        let p = c.purchase("theme1", &mut engine, today()).unwrap();
        assert_eq!(p.new_score, 150);
        assert_eq!(engine.score, 150);
        assert!(c.is_owned("theme1"));
        assert_eq!(p.item.effect, Effect::Theme(Some("dark".into())));
        // Debits never earn XP.
        assert_eq!(engine.current_xp, 0);
    }

    #[test]
    fn purchase_twice_fails_already_owned_without_charge() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 500;
        c.purchase("theme1", &mut engine, today()).unwrap();
        let err = c.purchase("theme1", &mut engine, today()).unwrap_err();
        assert_eq!(err, TrackerError::AlreadyOwned("theme1".into()));
        assert_eq!(engine.score, 400);
    }

    #[test]
    fn purchase_insufficient_funds() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 99;
        let err = c.purchase("theme1", &mut engine, today()).unwrap_err();
        assert_eq!(
            err,
            TrackerError::InsufficientFunds {
                price: 100,
                score: 99
            }
        );
        assert_eq!(engine.score, 99);
        assert!(!c.is_owned("theme1"));
    }

    #[test]
    fn purchase_exact_price_allowed() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 100;
        assert!(c.purchase("theme1", &mut engine, today()).is_ok());
        assert_eq!(engine.score, 0);
    }

    #[test]
    fn purchase_unknown_item() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 1000;
        assert_eq!(
            c.purchase("nope", &mut engine, today()).unwrap_err(),
            TrackerError::UnknownItem("nope".into())
        );
        assert_eq!(engine.score, 1000);
    }

    #[test]
    fn remove_evicts_purchase() {
        let mut c = seeded();
        let mut engine = ProgressEngine::new();
        engine.score = 1000;
        c.purchase("boost1", &mut engine, today()).unwrap();
        assert!(c.remove("boost1"));
        assert!(!c.is_owned("boost1"));
        assert!(c.get("boost1").is_none());
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut c = seeded();
        assert!(c.add(custom("custom_1", 10)).is_ok());
        assert!(matches!(
            c.add(custom("custom_1", 10)),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn edit_patches_only_given_fields() {
        let mut c = ItemCatalog::new();
        c.add(custom("custom_1", 10)).unwrap();
        c.edit(
            "custom_1",
            ItemPatch {
                price: Some(25),
                name: Some("Better".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let item = c.get("custom_1").unwrap();
        assert_eq!(item.price, 25);
        assert_eq!(item.name, "Better");
        assert_eq!(item.color, "#fff");
    }

    #[test]
    fn edit_rejects_zero_price_and_unknown_id() {
        let mut c = ItemCatalog::new();
        c.add(custom("custom_1", 10)).unwrap();
        let zero = ItemPatch {
            price: Some(0),
            ..Default::default()
        };
        assert!(matches!(c.edit("custom_1", zero), Err(TrackerError::InvalidInput(_))));
        assert!(matches!(
            c.edit("custom_2", ItemPatch::default()),
            Err(TrackerError::UnknownItem(_))
        ));
    }

    #[test]
    fn next_custom_id_skips_taken() {
        let mut c = ItemCatalog::new();
        c.add(custom("custom_100", 10)).unwrap();
        assert_eq!(c.next_custom_id(100), "custom_101");
        assert_eq!(c.next_custom_id(5), "custom_5");
    }

    #[test]
    fn custom_items_are_flagged() {
        assert!(custom("custom_9", 1).is_custom());
        assert!(!seeded().get("theme1").unwrap().is_custom());
    }

    #[test]
    fn effect_markers_parse() {
        assert_eq!(Effect::from("theme".to_string()), Effect::Theme(None));
        assert_eq!(
            Effect::from("theme:dark".to_string()),
            Effect::Theme(Some("dark".into()))
        );
        assert_eq!(
            Effect::from("boost".to_string()),
            Effect::Boost {
                percent: 20,
                minutes: 60
            }
        );
        assert_eq!(
            Effect::from("boost:50:15".to_string()),
            Effect::Boost {
                percent: 50,
                minutes: 15
            }
        );
        assert_eq!(
            Effect::from("streak".to_string()),
            Effect::StreakFreeze { days: 1 }
        );
        assert_eq!(Effect::from("feature".to_string()), Effect::Feature(String::new()));
        assert_eq!(Effect::from("confetti".to_string()), Effect::Announce);
    }

    #[test]
    fn store_item_json_uses_type_and_marker() {
        let item = &default_items()[2];
        let json = serde_json::to_value(item).unwrap();
        assert_eq!(json["type"], "boost");
        assert_eq!(json["effect"], "boost:20:60");
        let back: StoreItem = serde_json::from_value(json).unwrap();
        assert_eq!(&back, item);
    }

    #[test]
    fn store_item_missing_optional_fields() {
        let item: StoreItem =
            serde_json::from_str(r#"{"id":"custom_1","name":"Bare","price":5}"#).unwrap();
        assert_eq!(item.effect, Effect::Announce);
        assert_eq!(item.category, "feature");
        assert_eq!(item.description, "");
    }
}
