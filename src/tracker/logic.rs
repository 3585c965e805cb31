//! Score Tracker presentation logic: each user intent is one function here.
//!
//! Everything operates on the explicit `TrackerState`; nothing here touches the
//! DOM, so the whole flow is testable natively.

use crate::error::{Result, TrackerError};

use super::buttons::Polarity;
use super::effects;
use super::progress::LEVEL_UP_BONUS;
use super::save::{self, BackupReport, MergeReport};
use super::state::{Confirm, Form, FormKind, HostRequest, Tab, TrackerState};
use super::store::{Effect, ItemPatch, StoreItem};
use super::templates;
use super::validate;

/// Points applied by the quick `+` / `-` keys.
pub const QUICK_DELTA: i64 = 10;

/// Pixels an arrow key moves the selected action.
pub const NUDGE_STEP: f64 = 10.0;

/// Seeded on first run when there are no actions.
const DEMO_ACTIONS: &[(Polarity, &str, i64)] = &[
    (Polarity::Positive, "Exercise 🏋️", 5),
    (Polarity::Positive, "Meditation 🧘", 3),
    (Polarity::Negative, "Skip Workout 💤", 3),
    (Polarity::Negative, "Junk Food 🍔", 4),
];

/// Entries of the Data tab, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataCommand {
    ExportBackup,
    ImportBackup,
    ImportButtons,
    ImportStore,
    ButtonsTemplate,
    StoreTemplate,
    ExportStore,
    ClearButtons,
    ResetScore,
    ResetProgress,
    ClearAllData,
}

impl DataCommand {
    pub const ALL: [DataCommand; 11] = [
        DataCommand::ExportBackup,
        DataCommand::ImportBackup,
        DataCommand::ImportButtons,
        DataCommand::ImportStore,
        DataCommand::ButtonsTemplate,
        DataCommand::StoreTemplate,
        DataCommand::ExportStore,
        DataCommand::ClearButtons,
        DataCommand::ResetScore,
        DataCommand::ResetProgress,
        DataCommand::ClearAllData,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DataCommand::ExportBackup => "Export full backup",
            DataCommand::ImportBackup => "Import full backup",
            DataCommand::ImportButtons => "Import buttons JSON",
            DataCommand::ImportStore => "Import store JSON",
            DataCommand::ButtonsTemplate => "Show buttons template",
            DataCommand::StoreTemplate => "Show store template",
            DataCommand::ExportStore => "Export store items",
            DataCommand::ClearButtons => "Clear all buttons",
            DataCommand::ResetScore => "Reset score",
            DataCommand::ResetProgress => "Reset progress",
            DataCommand::ClearAllData => "Reset ALL data",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            DataCommand::ClearButtons
                | DataCommand::ResetScore
                | DataCommand::ResetProgress
                | DataCommand::ClearAllData
        )
    }

    /// Menu key: `a`, `b`, ... in display order.
    pub fn key(index: usize) -> char {
        (b'a' + index as u8) as char
    }
}

// ── Startup / timers ───────────────────────────────────────────

/// First-run seeding, startup streak check, and re-applying owned unlocks.
pub fn startup(state: &mut TrackerState) {
    if state.model.catalog.seed_defaults_if_empty() {
        state.mark_dirty();
    }
    if state.model.buttons.is_empty() {
        for &(polarity, label, magnitude) in DEMO_ACTIONS {
            state.model.buttons.create(polarity, label, magnitude, None, None);
        }
        state.add_log("Added demo actions. Press n / m to make your own.", false);
        state.mark_dirty();
    }

    let before = state.model.progress.clone();
    state.model.progress.touch_streak_for_today(state.today);
    if state.model.progress != before {
        state.mark_dirty();
    }

    effects::restore_owned(state);
    state.add_log(
        &format!(
            "Welcome back! Level {}, {} day streak.",
            state.model.progress.current_level, state.model.progress.current_streak
        ),
        false,
    );
}

/// Advance timers by `delta_ticks` (10 ticks/sec).
pub fn tick(state: &mut TrackerState, delta_ticks: u32) {
    if delta_ticks == 0 {
        return;
    }
    state.anim_frame = state.anim_frame.wrapping_add(delta_ticks);

    for n in &mut state.notifications {
        n.ticks_left = n.ticks_left.saturating_sub(delta_ticks);
    }
    state.notifications.retain(|n| n.ticks_left > 0);

    let mut ended = Vec::new();
    for b in &mut state.boosts {
        b.ticks_left = b.ticks_left.saturating_sub(delta_ticks);
        if b.ticks_left == 0 {
            ended.push(b.name.clone());
        }
    }
    state.boosts.retain(|b| b.ticks_left > 0);
    for name in ended {
        state.add_log(&format!("{name} has worn off."), false);
    }

    if state.streak_freeze_until.is_some_and(|until| state.today >= until) {
        state.streak_freeze_until = None;
        state.add_log("Streak freeze expired.", false);
    }
}

// ── Score ──────────────────────────────────────────────────────

/// Apply `delta` through the progress engine and announce any level-ups.
pub fn apply_delta(state: &mut TrackerState, delta: i64, source: &str) {
    let outcome = state.model.progress.apply_score_delta(delta, state.today);
    let sign = if delta > 0 { "+" } else { "" };
    state.add_log(
        &format!("{source}: {sign}{delta} (score {})", outcome.new_score),
        false,
    );
    for level in &outcome.level_ups {
        let text = format!("Level Up! You reached Level {level}!");
        state.add_log(&text, true);
        state.notify(&text);
    }
    if outcome.leveled_up {
        state.add_log(&format!("Level-up bonus +{LEVEL_UP_BONUS}"), false);
    }
    state.mark_dirty();
}

/// Activate the action at `index` in the list.
pub fn activate_action(state: &mut TrackerState, index: usize) -> bool {
    let Some(action) = state.model.buttons.list().get(index) else {
        return false;
    };
    let (label, magnitude) = (action.label.clone(), action.magnitude);
    state.selected_action = index;
    apply_delta(state, magnitude, &label);
    true
}

pub fn quick_adjust(state: &mut TrackerState, delta: i64) {
    apply_delta(state, delta, "Quick adjust");
}

/// Move the selected action's stored position.
pub fn nudge_selected(state: &mut TrackerState, dx: f64, dy: f64) -> bool {
    let Some(id) = state.selected_action_id() else {
        return false;
    };
    let moved = state.model.buttons.move_by(&id, dx, dy);
    if moved {
        state.mark_dirty();
    }
    moved
}

// ── Store ──────────────────────────────────────────────────────

/// Ask to buy the item at `index`. Owned or unaffordable items are reported
/// straight away; otherwise a confirmation is opened.
pub fn request_purchase(state: &mut TrackerState, index: usize) -> bool {
    let Some(item) = state.model.catalog.items().get(index).cloned() else {
        return false;
    };
    state.selected_item = index;
    let score = state.model.progress.score;
    if state.model.catalog.is_owned(&item.id) {
        report_error(state, &TrackerError::AlreadyOwned(item.id));
    } else if !state.model.catalog.is_affordable(&item.id, score) {
        report_error(
            state,
            &TrackerError::InsufficientFunds {
                price: item.price,
                score,
            },
        );
    } else {
        state.confirm = Some(Confirm::Purchase(item.id));
    }
    true
}

/// Buy `id` and hand its effect to the dispatcher.
pub fn purchase(state: &mut TrackerState, id: &str) -> Result<()> {
    let today = state.today;
    let bought = state
        .model
        .catalog
        .purchase(id, &mut state.model.progress, today)?;
    state.add_log(
        &format!(
            "Purchased {}! Remaining score: {}",
            bought.item.name, bought.new_score
        ),
        true,
    );
    effects::dispatch(state, &bought.item);
    state.mark_dirty();
    Ok(())
}

// ── Forms ──────────────────────────────────────────────────────

pub fn open_new_action_form(state: &mut TrackerState, polarity: Polarity) {
    state.form = Some(Form::new(
        FormKind::NewAction(polarity),
        &[("Name", String::new()), ("Points", "5".into())],
    ));
}

pub fn open_edit_action_form(state: &mut TrackerState) -> bool {
    let Some(action) = state.model.buttons.list().get(state.selected_action) else {
        return false;
    };
    let form = Form::new(
        FormKind::EditAction(action.id.clone()),
        &[
            ("Name", action.label.clone()),
            ("Points", action.magnitude.abs().to_string()),
        ],
    );
    state.form = Some(form);
    true
}

pub fn open_new_item_form(state: &mut TrackerState) {
    state.form = Some(Form::new(
        FormKind::NewItem,
        &[
            ("Name", "✨ New Item".into()),
            ("Description", "A cool new item for your store".into()),
            ("Price", "100".into()),
            ("Color", "#3498db".into()),
            ("Type", "feature".into()),
        ],
    ));
}

/// Only user-created items can be edited.
pub fn open_edit_item_form(state: &mut TrackerState) -> bool {
    let Some(item) = state.model.catalog.items().get(state.selected_item) else {
        return false;
    };
    if !item.is_custom() {
        state.add_log("Built-in items cannot be edited.", false);
        return true;
    }
    let form = Form::new(
        FormKind::EditItem(item.id.clone()),
        &[
            ("Name", item.name.clone()),
            ("Description", item.description.clone()),
            ("Price", item.price.to_string()),
            ("Color", item.color.clone()),
            ("Type", item.category.clone()),
        ],
    );
    state.form = Some(form);
    true
}

pub fn form_type(state: &mut TrackerState, c: char) {
    if let Some(form) = state.form.as_mut() {
        if let Some(field) = form.fields.get_mut(form.cursor) {
            field.value.push(c);
        }
    }
}

pub fn form_backspace(state: &mut TrackerState) {
    if let Some(form) = state.form.as_mut() {
        if let Some(field) = form.fields.get_mut(form.cursor) {
            field.value.pop();
        }
    }
}

/// Move between fields; wraps around.
pub fn form_move(state: &mut TrackerState, forward: bool) {
    if let Some(form) = state.form.as_mut() {
        let n = form.fields.len().max(1);
        form.cursor = if forward {
            (form.cursor + 1) % n
        } else {
            (form.cursor + n - 1) % n
        };
    }
}

pub fn cancel_form(state: &mut TrackerState) {
    state.form = None;
}

/// Validate and apply the open form. On error the form stays open.
pub fn submit_form(state: &mut TrackerState) -> Result<()> {
    let Some(form) = state.form.clone() else {
        return Ok(());
    };
    match &form.kind {
        FormKind::NewAction(polarity) => {
            let label = validate::label(form.value(0))?;
            let magnitude = validate::new_magnitude(form.value(1))?;
            let created = state
                .model
                .buttons
                .create(*polarity, &label, magnitude, None, None);
            let text = format!("Added {} ({})", created.label, created.signed_value());
            state.add_log(&text, false);
            state.selected_action = state.model.buttons.len() - 1;
        }
        FormKind::EditAction(id) => {
            let label = validate::label(form.value(0))?;
            let magnitude = validate::edit_magnitude(form.value(1))?;
            state.model.buttons.edit(id, &label, magnitude)?;
            state.add_log(&format!("Updated {label}"), false);
        }
        FormKind::NewItem => {
            let item = StoreItem {
                id: state.model.catalog.next_custom_id(state.epoch_ms),
                name: validate::label(form.value(0))?,
                description: form.value(1).trim().to_string(),
                price: validate::price(form.value(2))?,
                color: validate::or_keep(form.value(3), "#3498db"),
                category: validate::or_keep(form.value(4), "feature"),
                effect: Effect::Announce,
            };
            let name = item.name.clone();
            state.model.catalog.add(item)?;
            state.add_log(&format!("Added store item {name}"), false);
            state.selected_item = state.model.catalog.items().len() - 1;
        }
        FormKind::EditItem(id) => {
            let current = state
                .model
                .catalog
                .get(id)
                .cloned()
                .ok_or_else(|| TrackerError::UnknownItem(id.clone()))?;
            let patch = ItemPatch {
                name: Some(validate::label(form.value(0))?),
                description: Some(form.value(1).trim().to_string()),
                price: Some(validate::price(form.value(2))?),
                color: Some(validate::or_keep(form.value(3), &current.color)),
                category: Some(validate::or_keep(form.value(4), &current.category)),
            };
            state.model.catalog.edit(id, patch)?;
            state.add_log("Store item updated.", false);
        }
    }
    state.form = None;
    state.mark_dirty();
    Ok(())
}

// ── Confirmations ──────────────────────────────────────────────

pub fn confirm_delete_action(state: &mut TrackerState) -> bool {
    match state.selected_action_id() {
        Some(id) => {
            state.confirm = Some(Confirm::DeleteAction(id));
            true
        }
        None => false,
    }
}

pub fn confirm_delete_item(state: &mut TrackerState) -> bool {
    let Some(item) = state.model.catalog.items().get(state.selected_item) else {
        return false;
    };
    if item.is_custom() {
        state.confirm = Some(Confirm::DeleteItem(item.id.clone()));
    } else {
        state.add_log("Built-in items cannot be deleted.", false);
    }
    true
}

/// Question shown for a pending confirmation.
pub fn confirm_prompt(state: &TrackerState, confirm: &Confirm) -> String {
    let model = &state.model;
    match confirm {
        Confirm::DeleteAction(id) => {
            let label = model.buttons.get(id).map(|a| a.label.as_str()).unwrap_or(id);
            format!("Delete \"{label}\"?")
        }
        Confirm::DeleteItem(id) => {
            let name = model.catalog.get(id).map(|i| i.name.as_str()).unwrap_or(id);
            format!("Delete store item \"{name}\"?")
        }
        Confirm::Purchase(id) => match model.catalog.get(id) {
            Some(item) => format!(
                "Buy {} for {} points? You will have {} left.",
                item.name,
                item.price,
                model.progress.score - item.price as i64
            ),
            None => format!("Buy {id}?"),
        },
        Confirm::ClearButtons => "Clear all buttons? This cannot be undone.".into(),
        Confirm::ResetScore => "Reset score to 0?".into(),
        Confirm::ResetProgress => "Reset level, XP and streak? This cannot be undone!".into(),
        Confirm::ClearAllData => {
            "RESET ALL DATA? Score, progress and buttons are cleared; store items are kept."
                .into()
        }
    }
}

/// Answer the pending confirmation.
pub fn resolve_confirm(state: &mut TrackerState, accepted: bool) {
    let Some(confirm) = state.confirm.take() else {
        return;
    };
    if !accepted {
        return;
    }
    match confirm {
        Confirm::DeleteAction(id) => {
            if state.model.buttons.remove(&id) {
                state.add_log("Action deleted.", false);
            }
        }
        Confirm::DeleteItem(id) => {
            if state.model.catalog.remove(&id) {
                state.add_log("Store item deleted.", false);
                effects::restore_owned(state);
            }
        }
        Confirm::Purchase(id) => {
            if let Err(e) = purchase(state, &id) {
                report_error(state, &e);
            }
        }
        Confirm::ClearButtons => {
            state.model.buttons.clear();
            state.add_log("All buttons cleared!", true);
        }
        Confirm::ResetScore => {
            state.model.progress.reset_score();
            state.add_log("Score reset to 0.", true);
        }
        Confirm::ResetProgress => {
            state.model.progress.reset_progress();
            state.add_log("Progress reset successfully!", true);
        }
        Confirm::ClearAllData => clear_all_data(state),
    }
    state.clamp_selection();
    state.mark_dirty();
}

/// Score, progress and actions back to initial; the store and purchases stay.
pub fn clear_all_data(state: &mut TrackerState) {
    state.model.progress.reset_score();
    state.model.progress.reset_progress();
    state.model.buttons.clear();
    state.boosts.clear();
    state.streak_freeze_until = None;
    state.add_log("All data has been reset! Store items were kept.", true);
}

// ── Data tab ───────────────────────────────────────────────────

/// ISO-8601 UTC stamp of the current wall clock, as written into exports.
pub fn export_date(state: &TrackerState) -> String {
    chrono::DateTime::from_timestamp_millis(state.epoch_ms as i64)
        .map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

pub fn run_data_command(state: &mut TrackerState, cmd: DataCommand) -> Result<()> {
    match cmd {
        DataCommand::ExportBackup => {
            let text = save::export_backup_json(&state.model, &export_date(state))?;
            state.add_log("Full backup ready to copy.", false);
            state.request = Some(HostRequest::ShowText {
                title: "Full backup",
                text,
            });
        }
        DataCommand::ExportStore => {
            let text = save::export_store_json(&state.model.catalog, &export_date(state))?;
            state.request = Some(HostRequest::ShowText {
                title: "Store items",
                text,
            });
        }
        DataCommand::ImportBackup => state.request = Some(HostRequest::ImportBackup),
        DataCommand::ImportButtons => state.request = Some(HostRequest::ImportButtons),
        DataCommand::ImportStore => state.request = Some(HostRequest::ImportStore),
        DataCommand::ButtonsTemplate => {
            state.request = Some(HostRequest::ShowText {
                title: "Buttons template",
                text: templates::buttons_template(),
            });
        }
        DataCommand::StoreTemplate => {
            state.request = Some(HostRequest::ShowText {
                title: "Store template",
                text: templates::store_template(state.epoch_ms),
            });
        }
        DataCommand::ClearButtons => state.confirm = Some(Confirm::ClearButtons),
        DataCommand::ResetScore => state.confirm = Some(Confirm::ResetScore),
        DataCommand::ResetProgress => state.confirm = Some(Confirm::ResetProgress),
        DataCommand::ClearAllData => state.confirm = Some(Confirm::ClearAllData),
    }
    Ok(())
}

/// Replace everything from a full backup.
pub fn import_backup(state: &mut TrackerState, json: &str) -> Result<BackupReport> {
    let doc = save::parse_document(json)?;
    let report = save::load_full_backup(&mut state.model, doc);
    effects::restore_owned(state);
    state.clamp_selection();
    state.mark_dirty();

    state.add_log(
        &format!(
            "Backup loaded! Score {}, Level {}, Streak {} days, {} buttons, {} store items.",
            report.score, report.level, report.streak, report.buttons, report.store_items
        ),
        true,
    );
    if report.newer_format {
        state.add_log("Backup was written by a newer version; unknown data was ignored.", true);
    }
    Ok(report)
}

/// Add buttons from `{ "buttons": [...] }`. Existing actions are kept.
pub fn import_buttons(state: &mut TrackerState, json: &str) -> Result<MergeReport> {
    let records = save::parse_buttons_import(json)?;
    let report = save::merge_buttons(&mut state.model.buttons, &records);
    state.mark_dirty();
    let mut text = format!("Imported {} buttons.", report.imported);
    if report.skipped > 0 {
        text.push_str(&format!(" Skipped {} incomplete entries.", report.skipped));
    }
    state.add_log(&text, true);
    Ok(report)
}

/// Replace the store catalog from `{ "storeItems": [...] }`.
pub fn import_store(state: &mut TrackerState, json: &str) -> Result<usize> {
    let items = save::parse_store_import(json)?;
    let count = save::replace_store_items(&mut state.model.catalog, items);
    effects::restore_owned(state);
    state.clamp_selection();
    state.mark_dirty();
    state.add_log(&format!("Imported {count} store items."), true);
    Ok(count)
}

/// Surface a recoverable error in the log and as a toast.
pub fn report_error(state: &mut TrackerState, err: &TrackerError) {
    let text = match err {
        TrackerError::InsufficientFunds { price, score } => format!(
            "Not enough points! You need {} more.",
            i64::try_from(*price).unwrap_or(i64::MAX).saturating_sub(*score)
        ),
        TrackerError::AlreadyOwned(_) => "You already own this item!".to_string(),
        other => {
            let msg = other.to_string();
            let mut chars = msg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => msg,
            }
        }
    };
    state.add_log(&format!("⚠ {text}"), true);
    state.notify(&text);
}

/// Switch tabs, closing anything modal.
pub fn switch_tab(state: &mut TrackerState, tab: Tab) {
    state.tab = tab;
    state.form = None;
    state.confirm = None;
}
