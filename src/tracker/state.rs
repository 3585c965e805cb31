//! Score Tracker state: the core model plus presentation-only state.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::buttons::{ButtonRegistry, Polarity};
use super::effects::Palette;
use super::progress::ProgressEngine;
use super::store::ItemCatalog;

/// Maximum log entries kept.
pub const MAX_LOG: usize = 50;

/// Notification lifetime: 3 seconds at 10 ticks/sec.
pub const NOTIFICATION_TICKS: u32 = 30;

/// Ticks per real-time minute (boost countdown).
pub const TICKS_PER_MINUTE: u32 = 600;

/// The three independent owners of durable state.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub progress: ProgressEngine,
    pub buttons: ButtonRegistry,
    pub catalog: ItemCatalog,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Which panel is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Actions,
    Store,
    Data,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormKind {
    NewAction(Polarity),
    EditAction(String),
    NewItem,
    EditItem(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

/// A line-edited form. Submission goes through `validate` before any mutator.
#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    /// Index of the field being typed into.
    pub cursor: usize,
}

impl Form {
    pub fn new(kind: FormKind, fields: &[(&'static str, String)]) -> Self {
        Self {
            kind,
            fields: fields
                .iter()
                .map(|(label, value)| FormField {
                    label,
                    value: value.clone(),
                })
                .collect(),
            cursor: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewAction(Polarity::Positive) => "New good action",
            FormKind::NewAction(Polarity::Negative) => "New bad action",
            FormKind::EditAction(_) => "Edit action",
            FormKind::NewItem => "New store item",
            FormKind::EditItem(_) => "Edit store item",
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn is_last_field(&self) -> bool {
        self.cursor + 1 >= self.fields.len()
    }
}

/// Destructive or spending operations wait for a y/n answer.
#[derive(Clone, Debug, PartialEq)]
pub enum Confirm {
    DeleteAction(String),
    DeleteItem(String),
    Purchase(String),
    ClearButtons,
    ResetScore,
    ResetProgress,
    ClearAllData,
}

/// Work only the host page can do (paste / copy via `window.prompt`).
#[derive(Clone, Debug, PartialEq)]
pub enum HostRequest {
    ImportBackup,
    ImportButtons,
    ImportStore,
    /// Show this text so the user can copy it out.
    ShowText { title: &'static str, text: String },
}

/// Log entry shown in the message panel.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

/// Transient toast (level-ups, purchases).
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub text: String,
    pub ticks_left: u32,
}

/// A purchased boost counting down.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveBoost {
    pub name: String,
    pub percent: u32,
    pub ticks_left: u32,
}

pub struct TrackerState {
    pub model: Model,

    /// Local calendar date, refreshed by the host every frame.
    pub today: NaiveDate,
    /// Wall clock in epoch milliseconds, for ids and export stamps.
    pub epoch_ms: u64,

    pub tab: Tab,
    pub selected_action: usize,
    pub selected_item: usize,
    pub form: Option<Form>,
    pub confirm: Option<Confirm>,
    pub request: Option<HostRequest>,

    pub log: Vec<LogEntry>,
    pub notifications: Vec<Notification>,

    /// Applied by theme unlocks.
    pub palette: Palette,
    pub boosts: Vec<ActiveBoost>,
    /// Last protected day (exclusive) of a purchased streak freeze.
    pub streak_freeze_until: Option<NaiveDate>,
    pub features: BTreeSet<String>,

    /// Set by every durable mutation; the host saves and clears it.
    pub dirty: bool,
    /// Frame counter for small animations.
    pub anim_frame: u32,
}

impl TrackerState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            model: Model::new(),
            today,
            epoch_ms: 0,
            tab: Tab::Actions,
            selected_action: 0,
            selected_item: 0,
            form: None,
            confirm: None,
            request: None,
            log: Vec::new(),
            notifications: Vec::new(),
            palette: Palette::default(),
            boosts: Vec::new(),
            streak_freeze_until: None,
            features: BTreeSet::new(),
            dirty: false,
            anim_frame: 0,
        }
    }

    pub fn add_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > MAX_LOG {
            self.log.remove(0);
        }
    }

    pub fn notify(&mut self, text: &str) {
        self.notifications.push(Notification {
            text: text.to_string(),
            ticks_left: NOTIFICATION_TICKS,
        });
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Take the dirty flag (host saves when this returns true).
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Id of the highlighted action, if any.
    pub fn selected_action_id(&self) -> Option<String> {
        self.model
            .buttons
            .list()
            .get(self.selected_action)
            .map(|a| a.id.clone())
    }

    /// Keep selections inside their lists after removals / imports.
    pub fn clamp_selection(&mut self) {
        let actions = self.model.buttons.len();
        self.selected_action = self.selected_action.min(actions.saturating_sub(1));
        let items = self.model.catalog.items().len();
        self.selected_item = self.selected_item.min(items.saturating_sub(1));
    }
}
