//! Score Tracker rendering (read-only from state).

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};
use crate::widgets::{scroll_to_show, ClickableList, HintRow};

use super::actions::*;
use super::buttons::Polarity;
use super::effects::parse_hex;
use super::logic::{confirm_prompt, DataCommand};
use super::state::{Confirm, Form, Tab, TrackerState, TICKS_PER_MINUTE};

pub fn render(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let is_narrow = is_narrow_layout(area.width);
    let borders = if is_narrow {
        Borders::TOP | Borders::BOTTOM
    } else {
        Borders::ALL
    };
    let toast_height = if state.notifications.is_empty() { 0 } else { 1 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),            // Header
            Constraint::Length(toast_height), // Notification
            Constraint::Length(1),            // Tabs
            Constraint::Min(6),               // Body
        ])
        .split(area);

    render_header(state, f, chunks[0], borders, is_narrow);
    render_toast(state, f, chunks[1], click_state);
    render_tabs(state, f, chunks[2], click_state);

    let (panel, log) = if is_narrow {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(6)])
            .split(chunks[3]);
        (rows[0], rows[1])
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[3]);
        (cols[0], cols[1])
    };

    if let Some(confirm) = &state.confirm {
        render_confirm(state, confirm, f, panel, borders, click_state);
    } else if let Some(form) = &state.form {
        render_form(state, form, f, panel, borders, click_state);
    } else {
        match state.tab {
            Tab::Actions => render_actions(state, f, panel, borders, click_state),
            Tab::Store => render_store(state, f, panel, borders, click_state),
            Tab::Data => render_data(state, f, panel, borders, click_state),
        }
    }
    render_log(state, f, log, borders);
}

// ── Header ─────────────────────────────────────────────────────

fn render_header(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    is_narrow: bool,
) {
    let p = &state.model.progress;
    let palette = &state.palette;
    let score_color = if p.score >= 0 { Color::Green } else { Color::Red };
    let bar_width = if is_narrow { 12 } else { 24 };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                p.score.to_string(),
                Style::default().fg(score_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Level ", Style::default().fg(Color::Gray)),
            Span::styled(
                p.current_level.to_string(),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        xp_line(state, bar_width, is_narrow),
        status_line(state),
    ];

    let title = if is_narrow {
        " Score Tracker "
    } else {
        " Score Tracker - build habits, earn rewards "
    };
    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(palette.border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn xp_line(state: &TrackerState, bar_width: usize, is_narrow: bool) -> Line<'static> {
    let p = &state.model.progress;
    let pct = p.progress_percent();
    let filled = (pct as usize * bar_width).div_ceil(100).min(bar_width);
    let bar = "█".repeat(filled) + &"░".repeat(bar_width - filled);

    let mut spans = vec![
        Span::styled(" XP ", Style::default().fg(Color::Gray)),
        Span::styled(bar, Style::default().fg(state.palette.accent)),
        Span::styled(
            format!(" {}/{} ({}%)", p.current_xp, p.xp_for_next_level(), pct),
            Style::default().fg(state.palette.text),
        ),
    ];
    if !is_narrow {
        spans.push(Span::styled(
            format!("  {} XP to next level", p.xp_remaining()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn status_line(state: &TrackerState) -> Line<'static> {
    let streak = state.model.progress.current_streak;
    let mut spans = vec![Span::styled(
        format!(" 🔥 {} day streak", streak),
        Style::default().fg(if streak > 0 { Color::Yellow } else { Color::DarkGray }),
    )];

    for boost in &state.boosts {
        let minutes = boost.ticks_left.div_ceil(TICKS_PER_MINUTE);
        spans.push(Span::styled(
            format!("  {} {}m", boost.name, minutes),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(until) = state.streak_freeze_until {
        spans.push(Span::styled(
            format!("  🧊 until {}", until.format("%m/%d")),
            Style::default().fg(Color::LightBlue),
        ));
    }
    for feature in &state.features {
        spans.push(Span::styled(
            format!("  ✨ {feature}"),
            Style::default().fg(Color::Magenta),
        ));
    }
    Line::from(spans)
}

fn render_toast(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let Some(latest) = state.notifications.last() else {
        return;
    };
    let more = state.notifications.len() - 1;
    let mut text = format!(" ★ {} ", latest.text);
    if more > 0 {
        text.push_str(&format!("(+{more}) "));
    }
    let style = Style::default()
        .fg(Color::Black)
        .bg(state.palette.accent)
        .add_modifier(Modifier::BOLD);
    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
    click_state
        .borrow_mut()
        .add_click_target(area, DISMISS_NOTIFICATIONS);
}

fn render_tabs(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let style_for = |tab: Tab| {
        if state.tab == tab {
            Style::default()
                .fg(Color::Black)
                .bg(state.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let mut cs = click_state.borrow_mut();
    HintRow::new()
        .tab("Actions", style_for(Tab::Actions), TAB_ACTIONS)
        .tab("Store", style_for(Tab::Store), TAB_STORE)
        .tab("Data", style_for(Tab::Data), TAB_DATA)
        .text(Span::styled(" Tab ⇄", Style::default().fg(Color::DarkGray)))
        .render(f, area, &mut cs);
}

// ── Actions tab ────────────────────────────────────────────────

fn render_actions(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let mut cl = ClickableList::new();
    let actions = state.model.buttons.list();
    if actions.is_empty() {
        cl.push(Line::from(Span::styled(
            " No actions yet. Press n (good) or m (bad) to add one.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, action) in actions.iter().enumerate() {
        let selected = i == state.selected_action;
        let key = if i < 9 {
            format!(" [{}] ", i + 1)
        } else {
            "     ".to_string()
        };
        let value_color = match action.polarity {
            Polarity::Positive => Color::Green,
            Polarity::Negative => Color::Red,
        };
        let label_style = if selected {
            Style::default()
                .fg(state.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(state.palette.text)
        };

        let mut spans = vec![
            Span::styled(if selected { "▶" } else { " " }, label_style),
            Span::styled(key, Style::default().fg(Color::Yellow)),
            Span::styled(action.label.clone(), label_style),
            Span::styled(
                format!("  {}", action.signed_value()),
                Style::default().fg(value_color).add_modifier(Modifier::BOLD),
            ),
        ];
        if selected {
            spans.push(Span::styled(
                format!("  @{:.0},{:.0}", action.position.x, action.position.y),
                Style::default().fg(Color::DarkGray),
            ));
        }
        cl.push_row(Line::from(spans), row_id(ACTIVATE_BASE, i));
    }

    let visible = chunks[0].height.saturating_sub(2) as usize;
    let scroll = scroll_to_show(state.selected_action, visible);
    let block = panel_block(state, borders, " Actions (tap to score) ");

    let mut cs = click_state.borrow_mut();
    cl.register_targets(chunks[0], &mut cs, 1, 1, scroll);
    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).scroll((scroll, 0)),
        chunks[0],
    );

    let key_style = key_style();
    HintRow::new()
        .hint("n", "Good", key_style, NEW_GOOD_ACTION)
        .hint("m", "Bad", key_style, NEW_BAD_ACTION)
        .hint("e", "Edit", key_style, EDIT_ACTION)
        .hint("x", "Del", key_style, DELETE_ACTION)
        .hint("+", "+10", key_style, QUICK_PLUS)
        .hint("-", "-10", key_style, QUICK_MINUS)
        .render(f, chunks[1], &mut cs);
}

// ── Store tab ──────────────────────────────────────────────────

fn render_store(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(2), // Description
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let catalog = &state.model.catalog;
    let score = state.model.progress.score;
    let mut cl = ClickableList::new();
    for (i, item) in catalog.items().iter().enumerate() {
        let selected = i == state.selected_item;
        let owned = catalog.is_owned(&item.id);
        let affordable = catalog.is_affordable(&item.id, score);
        let key = if i < 9 {
            format!(" [{}] ", i + 1)
        } else {
            "     ".to_string()
        };

        let name_color = if owned {
            Color::DarkGray
        } else {
            parse_hex(&item.color).unwrap_or(state.palette.text)
        };
        let mut name_style = Style::default().fg(name_color);
        if selected {
            name_style = name_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        let (status, status_color) = if owned {
            ("✓ Owned".to_string(), Color::Green)
        } else if affordable {
            (format!("{} pts", item.price), Color::Yellow)
        } else {
            (format!("{} pts", item.price), Color::Red)
        };

        cl.push_row(
            Line::from(vec![
                Span::styled(
                    if selected { "▶" } else { " " },
                    Style::default().fg(state.palette.accent),
                ),
                Span::styled(key, Style::default().fg(Color::Yellow)),
                Span::styled(item.name.clone(), name_style),
                Span::styled(format!("  {status}"), Style::default().fg(status_color)),
            ]),
            row_id(BUY_BASE, i),
        );
    }

    let visible = chunks[0].height.saturating_sub(2) as usize;
    let scroll = scroll_to_show(state.selected_item, visible);
    let block = panel_block(state, borders, " Reward Store ");

    let mut cs = click_state.borrow_mut();
    cl.register_targets(chunks[0], &mut cs, 1, 1, scroll);
    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).scroll((scroll, 0)),
        chunks[0],
    );

    let detail = catalog
        .items()
        .get(state.selected_item)
        .map(|item| {
            let origin = if item.is_custom() { "custom" } else { "built-in" };
            format!(" {} ({}, {})", item.description, item.category, origin)
        })
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            detail,
            Style::default().fg(Color::Gray),
        )))
        .wrap(Wrap { trim: true }),
        chunks[1],
    );

    let key_style = key_style();
    HintRow::new()
        .hint("n", "New item", key_style, NEW_ITEM)
        .hint("e", "Edit", key_style, EDIT_ITEM)
        .hint("x", "Delete", key_style, DELETE_ITEM)
        .render(f, chunks[2], &mut cs);
}

// ── Data tab ───────────────────────────────────────────────────

fn render_data(
    state: &TrackerState,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    for (i, cmd) in DataCommand::ALL.iter().enumerate() {
        let color = if cmd.is_destructive() {
            Color::Red
        } else {
            state.palette.text
        };
        cl.push_row(
            Line::from(vec![
                Span::styled(
                    format!(" [{}] ", DataCommand::key(i)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(cmd.label(), Style::default().fg(color)),
            ]),
            row_id(DATA_MENU_BASE, i),
        );
    }

    let block = panel_block(state, borders, " Data ");
    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1, 0);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

// ── Overlays ───────────────────────────────────────────────────

fn render_confirm(
    state: &TrackerState,
    confirm: &Confirm,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let danger = !matches!(confirm, Confirm::Purchase(_));
    let mut cl = ClickableList::new();
    cl.push(Line::from(""));
    cl.push(Line::from(Span::styled(
        format!(" {}", confirm_prompt(state, confirm)),
        Style::default()
            .fg(if danger { Color::Red } else { state.palette.text })
            .add_modifier(Modifier::BOLD),
    )));
    cl.push(Line::from(""));
    cl.push_clickable(
        Line::from(Span::styled(" [y] Yes", Style::default().fg(Color::Green))),
        CONFIRM_YES,
    );
    cl.push_clickable(
        Line::from(Span::styled(" [n] No", Style::default().fg(Color::Gray))),
        CONFIRM_NO,
    );

    let block = panel_block(state, borders, " Confirm ");
    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1, 0);
    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_form(
    state: &TrackerState,
    form: &Form,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let caret = if (state.anim_frame / 5) % 2 == 0 { "█" } else { " " };
    let mut cl = ClickableList::new();
    for (i, field) in form.fields.iter().enumerate() {
        let active = i == form.cursor;
        let label_style = if active {
            Style::default()
                .fg(state.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![
            Span::styled(
                format!(" {} {:<12}", if active { "▶" } else { " " }, field.label),
                label_style,
            ),
            Span::styled(field.value.clone(), Style::default().fg(state.palette.text)),
        ];
        if active {
            spans.push(Span::styled(caret, Style::default().fg(state.palette.accent)));
        }
        cl.push(Line::from(spans));
    }
    cl.push(Line::from(""));
    cl.push_clickable(
        Line::from(Span::styled(" [Tab] Next field", Style::default().fg(Color::Yellow))),
        FORM_NEXT,
    );
    cl.push_clickable(
        Line::from(Span::styled(" [Enter] Save", Style::default().fg(Color::Green))),
        FORM_SUBMIT,
    );
    cl.push_clickable(
        Line::from(Span::styled(" [Esc] Cancel", Style::default().fg(Color::Gray))),
        FORM_CANCEL,
    );

    let title = format!(" {} ", form.title());
    let block = panel_block(state, borders, &title);
    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1, 0);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

// ── Log ────────────────────────────────────────────────────────

fn render_log(state: &TrackerState, f: &mut Frame, area: Rect, borders: Borders) {
    let max_lines = area.height.saturating_sub(2) as usize;
    let start = state.log.len().saturating_sub(max_lines);
    let lines: Vec<Line> = state.log[start..]
        .iter()
        .map(|entry| {
            let style = if entry.is_important {
                Style::default()
                    .fg(state.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(format!(" > {}", entry.text), style))
        })
        .collect();

    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(state.palette.border))
        .title(" Log ");
    let widget = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn panel_block<'a>(state: &TrackerState, borders: Borders, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(borders)
        .border_style(Style::default().fg(state.palette.border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(state.palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
}

fn key_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}
