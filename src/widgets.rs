//! Clickable UI components: rendering and click registration in one place.
//!
//! The DOM backend only reports pixel positions, so every clickable thing on
//! screen has to leave a cell rectangle in [`ClickState`] during the same
//! frame that draws it. Building the text and the targets together keeps the
//! two from drifting apart when a label changes width.
//!
//! - [`HintRow`]: one row of `[k] label` segments, each its own target.
//! - [`ClickableList`]: vertical lines, some bound to action IDs.

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::style::{Color, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::Paragraph;
use ratzilla::ratatui::Frame;

use crate::input::ClickState;

// ── HintRow ────────────────────────────────────────────────────

/// A single row of key hints / tabs. Each segment's click target spans
/// exactly the columns its text occupies.
///
/// ```ignore
/// HintRow::new()
///     .hint("n", "New", key_style, NEW_GOOD_ACTION)
///     .hint("x", "Delete", key_style, DELETE_ACTION)
///     .render(f, area, &mut cs);
/// ```
#[derive(Default)]
pub struct HintRow<'a> {
    spans: Vec<Span<'a>>,
    /// `(start column, width, action_id)`, relative to the row.
    targets: Vec<(u16, u16, u16)>,
    /// Columns used so far; the next segment starts here.
    width: u16,
}

impl<'a> HintRow<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ` [key] label ` segment bound to `action_id`.
    pub fn hint(self, key: &str, label: &str, key_style: Style, action_id: u16) -> Self {
        let key_span = Span::styled(format!(" [{key}]"), key_style);
        let label_span = Span::styled(format!(" {label} "), Style::default().fg(Color::Gray));
        self.segment(vec![key_span, label_span], Some(action_id))
    }

    /// Add a tab-style segment: the whole label is the target.
    pub fn tab(self, label: &str, style: Style, action_id: u16) -> Self {
        self.segment(vec![Span::styled(format!(" {label} "), style)], Some(action_id))
    }

    /// Add plain, non-clickable text.
    pub fn text(self, span: Span<'a>) -> Self {
        self.segment(vec![span], None)
    }

    /// Append spans as one segment. Width is measured in terminal cells
    /// (`Span::width`), so emoji and CJK labels take two columns each.
    fn segment(mut self, spans: Vec<Span<'a>>, action_id: Option<u16>) -> Self {
        let width: u16 = spans.iter().map(|s| s.width() as u16).sum();
        if let Some(id) = action_id {
            self.targets.push((self.width, width, id));
        }
        self.width += width;
        self.spans.extend(spans);
        self
    }

    /// Render into the first row of `area` and register targets clipped to it.
    ///
    /// On a narrow screen the row is cut off on the right; segments that
    /// start past the edge get no target, and a segment straddling the edge
    /// only gets the visible part.
    pub fn render(self, f: &mut Frame, area: Rect, cs: &mut ClickState) {
        if area.height == 0 {
            return;
        }
        let row = Rect::new(area.x, area.y, area.width, 1);
        for &(start, width, id) in &self.targets {
            // Targets are in column order.
            if start >= area.width {
                break;
            }
            let clipped = width.min(area.width - start);
            cs.add_click_target(Rect::new(area.x + start, area.y, clipped, 1), id);
        }
        f.render_widget(Paragraph::new(Line::from(self.spans)), row);
    }
}

// ── ClickableList ──────────────────────────────────────────────

/// Lines paired with click actions. Targets follow their lines, so inserting
/// a header above an item moves the item's target with it.
#[derive(Default)]
pub struct ClickableList<'a> {
    lines: Vec<Line<'a>>,
    /// `(line index, action_id)`.
    actions: Vec<(usize, u16)>,
}

impl<'a> ClickableList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a non-clickable line.
    pub fn push(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    /// Add a line that triggers `action_id` when tapped.
    pub fn push_clickable(&mut self, line: Line<'a>, action_id: u16) {
        self.push_row(line, Some(action_id));
    }

    /// List row whose id may have run out: `None` draws it without a target.
    pub fn push_row(&mut self, line: Line<'a>, action_id: Option<u16>) {
        if let Some(id) = action_id {
            self.actions.push((self.lines.len(), id));
        }
        self.lines.push(line);
    }

    pub fn into_lines(self) -> Vec<Line<'a>> {
        self.lines
    }

    /// Register a row target for every visible clickable line.
    ///
    /// `top` / `bottom` are border rows around the content; `scroll` is how many
    /// lines are scrolled off the top. Lines are assumed not to wrap, so line
    /// `n` sits on screen row `area.y + top + n - scroll`.
    pub fn register_targets(&self, area: Rect, cs: &mut ClickState, top: u16, bottom: u16, scroll: u16) {
        let content_y = area.y.saturating_add(top);
        let content_end = area.y.saturating_add(area.height.saturating_sub(bottom));
        for &(line_idx, action_id) in &self.actions {
            let Some(offset) = line_idx.checked_sub(scroll as usize) else {
                continue;
            };
            let row = match u16::try_from(offset) {
                Ok(offset) => content_y.saturating_add(offset),
                Err(_) => break,
            };
            if row >= content_end {
                break;
            }
            cs.add_row_target(area, row, action_id);
        }
    }
}

/// Scroll offset that keeps `selected` inside a window of `visible` lines.
///
/// Scrolls only as far as needed: the selection sits on the bottom row once
/// it moves past the first screenful.
pub fn scroll_to_show(selected: usize, visible: usize) -> u16 {
    if visible == 0 || selected < visible {
        0
    } else {
        u16::try_from(selected + 1 - visible).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_row_targets_follow_text_widths() {
        let row = HintRow::new()
            .hint("n", "New", Style::default(), 1)
            .text(Span::raw(" | "))
            .hint("x", "Delete", Style::default(), 2);
        // " [n]" (4) + " New " (5) = 9, " | " = 3, " [x]" + " Delete " = 12
        assert_eq!(row.targets, vec![(0, 9, 1), (12, 12, 2)]);
        assert_eq!(row.width, 24);
    }

    #[test]
    fn tab_segments_cover_labels() {
        let row = HintRow::new()
            .tab("Actions", Style::default(), 10)
            .tab("Store", Style::default(), 11);
        assert_eq!(row.targets, vec![(0, 9, 10), (9, 7, 11)]);
    }

    #[test]
    fn clickable_list_rows_with_borders() {
        let mut cl = ClickableList::new();
        cl.push(Line::from("header"));
        cl.push_clickable(Line::from("item 0"), 10);
        cl.push_clickable(Line::from("item 1"), 11);
        assert_eq!(cl.actions, vec![(1, 10), (2, 11)]);

        let area = Rect::new(0, 5, 40, 10);
        let mut cs = ClickState::new();
        cl.register_targets(area, &mut cs, 1, 1, 0);
        assert_eq!(cs.hit_test(3, 6), None);
        assert_eq!(cs.hit_test(3, 7), Some(10));
        assert_eq!(cs.hit_test(3, 8), Some(11));
    }

    #[test]
    fn clickable_list_scroll_and_clip() {
        let mut cl = ClickableList::new();
        for i in 0..10u16 {
            cl.push_clickable(Line::from(format!("item {i}")), 100 + i);
        }
        // 3 content rows, 4 lines scrolled off.
        let area = Rect::new(0, 0, 40, 5);
        let mut cs = ClickState::new();
        cl.register_targets(area, &mut cs, 1, 1, 4);
        assert_eq!(cs.targets.len(), 3);
        assert_eq!(cs.hit_test(0, 1), Some(104));
        assert_eq!(cs.hit_test(0, 3), Some(106));
        assert_eq!(cs.hit_test(0, 4), None);
    }

    #[test]
    fn rows_without_an_id_stay_unclickable() {
        let mut cl = ClickableList::new();
        cl.push_clickable(Line::from("scored"), 7);
        cl.push_row(Line::from("overflow"), None);
        cl.push_row(Line::from("scored too"), Some(9));
        assert_eq!(cl.actions, vec![(0, 7), (2, 9)]);

        let mut cs = ClickState::new();
        cl.register_targets(Rect::new(0, 0, 20, 5), &mut cs, 0, 0, 0);
        assert_eq!(cs.hit_test(2, 1), None);
        assert_eq!(cs.hit_test(2, 2), Some(9));
        assert_eq!(cl.into_lines().len(), 3);
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        assert_eq!(scroll_to_show(0, 5), 0);
        assert_eq!(scroll_to_show(4, 5), 0);
        assert_eq!(scroll_to_show(5, 5), 1);
        assert_eq!(scroll_to_show(12, 5), 8);
        assert_eq!(scroll_to_show(3, 0), 0);
    }
}
