//! Score Tracker in the browser: a ratzilla terminal UI over the tracker core.
//!
//! `main` wires three DOM callbacks to one shared [`Tracker`]. The draw loop
//! advances time, renders, and records click targets; the mouse and key
//! handlers turn DOM events into [`InputEvent`]s.

mod clock;
mod error;
mod input;
mod tracker;
mod widgets;

use std::{cell::RefCell, io, rc::Rc};

use clock::{TickClock, TICKS_PER_SEC};
use input::{pixel_to_cell, ClickState, InputEvent};
use ratzilla::event::{MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};
use tracker::state::HostRequest;
use tracker::Tracker;

/// Query the grid container's bounding rect and convert pixel coordinates to a cell.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    // Viewport coordinates, same space as the mouse event.
    let rect = grid.get_bounding_client_rect();

    pixel_to_cell(
        mouse_x as f64 - rect.left(),
        mouse_y as f64 - rect.top(),
        rect.width(),
        rect.height(),
        cs.terminal_cols,
        cs.terminal_rows,
    )
}

/// Run `event`, then hand any import/export request to the page.
///
/// The tracker borrow ends before `fulfil`, which borrows again to deliver
/// a pasted import.
fn dispatch(tracker: &Rc<RefCell<Tracker>>, event: &InputEvent) {
    let request = {
        let mut t = tracker.borrow_mut();
        t.handle_input(event);
        t.take_request()
    };
    if let Some(request) = request {
        fulfil(tracker, request);
    }
}

/// Paste-in and copy-out both go through `window.prompt`.
/// Cancelling or pasting nothing leaves the tracker untouched.
fn fulfil(tracker: &Rc<RefCell<Tracker>>, request: HostRequest) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let message = match &request {
        HostRequest::ShowText { title, text } => {
            let message = format!("{title}: copy the JSON below (Ctrl+C / Cmd+C)");
            let _ = window.prompt_with_message_and_default(&message, text);
            return;
        }
        HostRequest::ImportBackup => "Paste a full backup JSON:",
        HostRequest::ImportButtons => "Paste a buttons JSON:",
        HostRequest::ImportStore => "Paste a store items JSON:",
    };
    match window.prompt_with_message_and_default(message, "") {
        Ok(Some(json)) if !json.trim().is_empty() => {
            tracker.borrow_mut().deliver_import(&request, &json);
        }
        Ok(_) => {}
        Err(e) => web_sys::console::error_1(&e),
    }
}

fn main() -> io::Result<()> {
    // Panics show up in the browser console instead of a silent stop.
    console_error_panic_hook::set_once();

    let tracker = Rc::new(RefCell::new(Tracker::new(
        clock::local_today(),
        clock::epoch_ms(),
    )));
    // Written by the draw loop, read by the mouse handler.
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let tick_clock = RefCell::new(TickClock::new(TICKS_PER_SEC));
    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let tracker = tracker.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let action = {
                let cs = click_state.borrow();
                // Nothing drawn yet, so no grid to map onto.
                if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                    return;
                }
                dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs)
                    .and_then(|(col, row)| cs.hit_test(col, row))
            };

            if let Some(id) = action {
                dispatch(&tracker, &InputEvent::Click(id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let tracker = tracker.clone();
        move |key_event| {
            if let Some(event) = InputEvent::from_key_code(&key_event.code) {
                dispatch(&tracker, &event);
            }
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let size = f.area();
            // Whole ticks since the last frame; the remainder carries over.
            let ticks = tick_clock.borrow_mut().advance(clock::frame_ms());

            let mut t = tracker.borrow_mut();
            t.set_clock(clock::local_today(), clock::epoch_ms());
            t.tick(ticks);

            // Fresh targets every frame; render registers what it draws.
            click_state
                .borrow_mut()
                .begin_frame(size.width, size.height);
            t.render(f, size, &click_state);
        }
    });

    Ok(())
}
