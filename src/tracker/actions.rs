//! Semantic action IDs for Score Tracker click targets.
//!
//! Registered during render and dispatched via `InputEvent::Click`.
//! Fixed buttons live below 100. Each list gets its own block of
//! `ROW_SPAN` ids starting at its base, so rows of one list never
//! alias rows of another.

/// Ids reserved per list. Rows past this are drawn but not clickable.
pub const ROW_SPAN: u16 = 10_000;

/// Click id for row `index` of the list starting at `base`.
pub fn row_id(base: u16, index: usize) -> Option<u16> {
    u16::try_from(index)
        .ok()
        .filter(|i| *i < ROW_SPAN)
        .and_then(|i| base.checked_add(i))
}

/// Row index for `id` if it belongs to the list starting at `base`.
pub fn row_index(base: u16, id: u16) -> Option<usize> {
    id.checked_sub(base)
        .filter(|i| *i < ROW_SPAN)
        .map(usize::from)
}

// ── Tab navigation ──────────────────────────────────────────────
pub const TAB_ACTIONS: u16 = 10;
pub const TAB_STORE: u16 = 11;
pub const TAB_DATA: u16 = 12;

// ── Actions tab ─────────────────────────────────────────────────
/// Activate action (base + list index).
pub const ACTIVATE_BASE: u16 = 10_000;
pub const NEW_GOOD_ACTION: u16 = 20;
pub const NEW_BAD_ACTION: u16 = 21;
pub const EDIT_ACTION: u16 = 22;
pub const DELETE_ACTION: u16 = 23;
pub const QUICK_PLUS: u16 = 24;
pub const QUICK_MINUS: u16 = 25;

// ── Store tab ───────────────────────────────────────────────────
/// Buy item (base + list index).
pub const BUY_BASE: u16 = 20_000;
pub const NEW_ITEM: u16 = 30;
pub const EDIT_ITEM: u16 = 31;
pub const DELETE_ITEM: u16 = 32;

// ── Data tab (base + menu index) ────────────────────────────────
pub const DATA_MENU_BASE: u16 = 30_000;

// ── Overlays ────────────────────────────────────────────────────
pub const CONFIRM_YES: u16 = 40;
pub const CONFIRM_NO: u16 = 41;
pub const FORM_NEXT: u16 = 42;
pub const FORM_SUBMIT: u16 = 43;
pub const FORM_CANCEL: u16 = 44;
pub const DISMISS_NOTIFICATIONS: u16 = 45;
