//! Fill-in-the-blanks JSON for the import dialogs.
//!
//! Users paste these into an assistant, ask it to fill in their own habits or
//! rewards, and paste the result back into the matching import.

use serde_json::json;

/// `{ "buttons": [...] }` example, accepted by `save::parse_buttons_import`.
pub fn buttons_template() -> String {
    let template = json!({
        "buttons": [
            { "type": "good", "name": "Morning Run 🏃‍♂️", "value": 5 },
            { "type": "good", "name": "Healthy Breakfast 🍎", "value": 3 },
            { "type": "good", "name": "Read Book 📚", "value": 4 },
            { "type": "bad", "name": "Skip Exercise 💤", "value": 4 },
            { "type": "bad", "name": "Fast Food 🍟", "value": 3 },
            { "type": "bad", "name": "Stay Up Late 🌙", "value": 5 }
        ]
    });
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

/// `{ "storeItems": [...] }` example with ids derived from `stamp`.
pub fn store_template(stamp: u64) -> String {
    let template = json!({
        "storeItems": [
            {
                "id": format!("custom_{stamp}"),
                "name": "🎨 Rainbow Theme",
                "description": "A colorful rainbow theme for your tracker",
                "price": 200,
                "color": "#FF6B6B",
                "type": "theme",
                "effect": "theme"
            },
            {
                "id": format!("custom_{}", stamp + 1),
                "name": "⚡ Energy Boost",
                "description": "Get an energy boost for your tasks",
                "price": 150,
                "color": "#FFD93D",
                "type": "boost",
                "effect": "boost"
            },
            {
                "id": format!("custom_{}", stamp + 2),
                "name": "🔔 Notifications",
                "description": "Enable desktop notifications",
                "price": 100,
                "color": "#6BCB77",
                "type": "feature",
                "effect": "feature:notifications"
            }
        ]
    });
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::buttons::ButtonRegistry;
    use crate::tracker::save::{merge_buttons, parse_buttons_import, parse_store_import};
    use crate::tracker::store::Effect;

    #[test]
    fn buttons_template_imports_cleanly() {
        let records = parse_buttons_import(&buttons_template()).unwrap();
        let mut reg = ButtonRegistry::new();
        let report = merge_buttons(&mut reg, &records);
        assert_eq!(report.imported, 6);
        assert_eq!(report.skipped, 0);
        assert!(reg.list()[3].magnitude < 0);
    }

    #[test]
    fn store_template_imports_cleanly() {
        let items = parse_store_import(&store_template(1_700_000_000_000)).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "custom_1700000000000");
        assert_eq!(items[2].id, "custom_1700000000002");
        assert_eq!(items[2].effect, Effect::Feature("notifications".into()));
        assert!(items.iter().all(|i| i.is_custom()));
    }
}
