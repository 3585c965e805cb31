//! Input plumbing: normalized events, click targets, and pixel→cell conversion.
//!
//! The DOM backend hands us raw key codes and pixel coordinates. Keys become
//! [`InputEvent`]s directly. Clicks go through two steps: the pixel position
//! is turned into a terminal cell, then the cell is matched against the
//! targets the last frame registered in [`ClickState`].

use ratzilla::event::KeyCode;
use ratzilla::ratatui::layout::Rect;

/// Keyboard, mouse, and touch input normalized for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A printable key.
    Key(char),
    Enter,
    Backspace,
    Escape,
    /// Move to the next form field.
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// A click/tap on a registered target, identified by an action ID
    /// from `tracker::actions`.
    Click(u16),
}

impl InputEvent {
    /// Map a DOM key code. Keys the tracker never handles map to `None`.
    pub fn from_key_code(code: &KeyCode) -> Option<InputEvent> {
        Some(match code {
            KeyCode::Char(c) => InputEvent::Key(*c),
            KeyCode::Enter => InputEvent::Enter,
            KeyCode::Backspace => InputEvent::Backspace,
            KeyCode::Esc => InputEvent::Escape,
            KeyCode::Tab => InputEvent::Tab,
            KeyCode::Up => InputEvent::Up,
            KeyCode::Down => InputEvent::Down,
            KeyCode::Left => InputEvent::Left,
            KeyCode::Right => InputEvent::Right,
            _ => return None,
        })
    }
}

/// A region on screen that triggers an action when tapped.
#[derive(Debug, Clone)]
pub struct ClickTarget {
    /// Hit region in terminal cells.
    pub rect: Rect,
    /// Semantic id from `tracker::actions`.
    pub action_id: u16,
}

/// Shared between the draw loop (which registers targets) and the mouse handler.
///
/// Targets only live for one frame. The mouse handler runs between frames, so
/// it always sees exactly what is on screen.
#[derive(Default)]
pub struct ClickState {
    pub targets: Vec<ClickTarget>,
    /// Grid size of the last frame; zero until the first draw.
    pub terminal_cols: u16,
    pub terminal_rows: u16,
}

impl ClickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: resize and drop last frame's targets.
    pub fn begin_frame(&mut self, cols: u16, rows: u16) {
        self.terminal_cols = cols;
        self.terminal_rows = rows;
        self.targets.clear();
    }

    /// Register `rect` for `action_id`. Zero-sized rects are dropped.
    pub fn add_click_target(&mut self, rect: Rect, action_id: u16) {
        if rect.width > 0 && rect.height > 0 {
            self.targets.push(ClickTarget { rect, action_id });
        }
    }

    /// Full-width target on `row`, ignored when `row` is outside `area`.
    pub fn add_row_target(&mut self, area: Rect, row: u16, action_id: u16) {
        if row >= area.y && row < area.y.saturating_add(area.height) {
            self.add_click_target(Rect::new(area.x, row, area.width, 1), action_id);
        }
    }

    /// Action under the cell `(col, row)`.
    ///
    /// Later targets win on overlap (overlays are registered last), so a
    /// confirm panel drawn over the action list swallows taps meant for it.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<u16> {
        // Newest first.
        self.targets.iter().rev().find_map(|t| {
            let r = &t.rect;
            let inside =
                col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height;
            inside.then_some(t.action_id)
        })
    }
}

/// Screens narrower than 70 columns stack panels vertically.
pub fn is_narrow_layout(width: u16) -> bool {
    width < 70
}

/// Convert a click position relative to the grid's top-left corner into a cell.
///
/// `grid_w` / `grid_h` are the grid container's pixel size. Returns `None` for
/// clicks outside the grid or before the first frame has been drawn.
pub fn pixel_to_cell(
    x: f64,
    y: f64,
    grid_w: f64,
    grid_h: f64,
    cols: u16,
    rows: u16,
) -> Option<(u16, u16)> {
    Some((axis_to_cell(x, grid_w, cols)?, axis_to_cell(y, grid_h, rows)?))
}

/// One axis of `pixel_to_cell`. Cells are assumed evenly sized, which holds
/// for the monospace grid the DOM backend lays out.
fn axis_to_cell(pos: f64, extent: f64, cells: u16) -> Option<u16> {
    if extent <= 0.0 || cells == 0 || pos < 0.0 {
        return None;
    }
    let cell = (pos / (extent / cells as f64)) as u16;
    (cell < cells).then_some(cell)
}
