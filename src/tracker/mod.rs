//! Score Tracker: good and bad habits move a score, the score buys rewards.

pub mod actions;
pub mod buttons;
pub mod effects;
pub mod logic;
pub mod progress;
pub mod render;
pub mod save;
pub mod state;
pub mod store;
pub mod templates;
pub mod validate;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;

use crate::input::{ClickState, InputEvent};

use actions::*;
use buttons::Polarity;
use logic::{DataCommand, NUDGE_STEP, QUICK_DELTA};
use state::{HostRequest, Tab, TrackerState};

pub struct Tracker {
    pub state: TrackerState,
}

impl Tracker {
    pub fn new(today: NaiveDate, epoch_ms: u64) -> Self {
        let mut state = TrackerState::new(today);
        state.epoch_ms = epoch_ms;

        #[cfg(target_arch = "wasm32")]
        if save::load_state(&mut state.model) {
            state.add_log("Loaded saved data.", false);
        }

        logic::startup(&mut state);
        let mut tracker = Self { state };
        tracker.persist();
        tracker
    }

    /// Handle an input event. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let consumed = self.dispatch(event);
        if consumed {
            self.persist();
        }
        consumed
    }

    pub fn tick(&mut self, delta_ticks: u32) {
        logic::tick(&mut self.state, delta_ticks);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(&self.state, f, area, click_state);
    }

    /// Host clock for streaks, ids and export stamps.
    pub fn set_clock(&mut self, today: NaiveDate, epoch_ms: u64) {
        self.state.today = today;
        self.state.epoch_ms = epoch_ms;
    }

    /// Pending work for the page (prompt for import text, show export text).
    pub fn take_request(&mut self) -> Option<HostRequest> {
        self.state.request.take()
    }

    /// Feed pasted JSON back for an import request.
    pub fn deliver_import(&mut self, request: &HostRequest, json: &str) {
        let result = match request {
            HostRequest::ImportBackup => logic::import_backup(&mut self.state, json).map(drop),
            HostRequest::ImportButtons => logic::import_buttons(&mut self.state, json).map(drop),
            HostRequest::ImportStore => logic::import_store(&mut self.state, json).map(drop),
            HostRequest::ShowText { .. } => Ok(()),
        };
        if let Err(e) = result {
            logic::report_error(&mut self.state, &e);
        }
        self.persist();
    }

    fn persist(&mut self) {
        if self.state.take_dirty() {
            #[cfg(target_arch = "wasm32")]
            save::save_state(&self.state.model);
        }
    }

    fn dispatch(&mut self, event: &InputEvent) -> bool {
        if *event == InputEvent::Click(DISMISS_NOTIFICATIONS) {
            self.state.notifications.clear();
            return true;
        }
        if self.state.confirm.is_some() {
            return self.handle_confirm(event);
        }
        if self.state.form.is_some() {
            return self.handle_form(event);
        }
        if let Some(tab) = self.tab_for(event) {
            logic::switch_tab(&mut self.state, tab);
            return true;
        }
        match event {
            InputEvent::Click(id) => self.handle_click(*id),
            other => match self.state.tab {
                Tab::Actions => self.handle_actions_key(other),
                Tab::Store => self.handle_store_key(other),
                Tab::Data => self.handle_data_key(other),
            },
        }
    }

    fn handle_confirm(&mut self, event: &InputEvent) -> bool {
        let accepted = match event {
            InputEvent::Key('y' | 'Y') | InputEvent::Enter | InputEvent::Click(CONFIRM_YES) => true,
            InputEvent::Key('n' | 'N') | InputEvent::Escape | InputEvent::Click(CONFIRM_NO) => {
                false
            }
            _ => return false,
        };
        logic::resolve_confirm(&mut self.state, accepted);
        true
    }

    fn handle_form(&mut self, event: &InputEvent) -> bool {
        let s = &mut self.state;
        match event {
            InputEvent::Key(c) => logic::form_type(s, *c),
            InputEvent::Backspace => logic::form_backspace(s),
            InputEvent::Tab | InputEvent::Down | InputEvent::Click(FORM_NEXT) => {
                logic::form_move(s, true)
            }
            InputEvent::Up => logic::form_move(s, false),
            InputEvent::Escape | InputEvent::Click(FORM_CANCEL) => logic::cancel_form(s),
            InputEvent::Enter if !s.form.as_ref().is_some_and(|f| f.is_last_field()) => {
                logic::form_move(s, true)
            }
            InputEvent::Enter | InputEvent::Click(FORM_SUBMIT) => {
                if let Err(e) = logic::submit_form(s) {
                    logic::report_error(s, &e);
                }
            }
            _ => return false,
        }
        true
    }

    fn tab_for(&self, event: &InputEvent) -> Option<Tab> {
        let order = [Tab::Actions, Tab::Store, Tab::Data];
        let pos = order.iter().position(|t| *t == self.state.tab).unwrap_or(0);
        match event {
            InputEvent::Click(TAB_ACTIONS) => Some(Tab::Actions),
            InputEvent::Click(TAB_STORE) => Some(Tab::Store),
            InputEvent::Click(TAB_DATA) => Some(Tab::Data),
            InputEvent::Tab | InputEvent::Right => Some(order[(pos + 1) % order.len()]),
            InputEvent::Left => Some(order[(pos + order.len() - 1) % order.len()]),
            _ => None,
        }
    }

    fn handle_click(&mut self, action_id: u16) -> bool {
        if let Some(index) = row_index(ACTIVATE_BASE, action_id) {
            return logic::activate_action(&mut self.state, index);
        }
        if let Some(index) = row_index(BUY_BASE, action_id) {
            return logic::request_purchase(&mut self.state, index);
        }
        if let Some(index) = row_index(DATA_MENU_BASE, action_id) {
            return match DataCommand::ALL.get(index) {
                Some(cmd) => self.run_data(*cmd),
                None => false,
            };
        }

        let s = &mut self.state;
        match action_id {
            NEW_GOOD_ACTION => {
                logic::open_new_action_form(s, Polarity::Positive);
                true
            }
            NEW_BAD_ACTION => {
                logic::open_new_action_form(s, Polarity::Negative);
                true
            }
            EDIT_ACTION => logic::open_edit_action_form(s),
            DELETE_ACTION => logic::confirm_delete_action(s),
            QUICK_PLUS => {
                logic::quick_adjust(s, QUICK_DELTA);
                true
            }
            QUICK_MINUS => {
                logic::quick_adjust(s, -QUICK_DELTA);
                true
            }
            NEW_ITEM => {
                logic::open_new_item_form(s);
                true
            }
            EDIT_ITEM => logic::open_edit_item_form(s),
            DELETE_ITEM => logic::confirm_delete_item(s),
            _ => false,
        }
    }

    fn handle_actions_key(&mut self, event: &InputEvent) -> bool {
        let s = &mut self.state;
        let count = s.model.buttons.len();
        match event {
            InputEvent::Key(c @ '1'..='9') => {
                let index = (*c as u8 - b'1') as usize;
                logic::activate_action(s, index)
            }
            InputEvent::Enter => {
                let index = s.selected_action;
                logic::activate_action(s, index)
            }
            InputEvent::Up if count > 0 => {
                s.selected_action = s.selected_action.saturating_sub(1);
                true
            }
            InputEvent::Down if count > 0 => {
                s.selected_action = (s.selected_action + 1).min(count - 1);
                true
            }
            InputEvent::Key('h') => logic::nudge_selected(s, -NUDGE_STEP, 0.0),
            InputEvent::Key('l') => logic::nudge_selected(s, NUDGE_STEP, 0.0),
            InputEvent::Key('k') => logic::nudge_selected(s, 0.0, -NUDGE_STEP),
            InputEvent::Key('j') => logic::nudge_selected(s, 0.0, NUDGE_STEP),
            InputEvent::Key('n') => self.handle_click(NEW_GOOD_ACTION),
            InputEvent::Key('m') => self.handle_click(NEW_BAD_ACTION),
            InputEvent::Key('e') => self.handle_click(EDIT_ACTION),
            InputEvent::Key('x') => self.handle_click(DELETE_ACTION),
            InputEvent::Key('+' | '=') => self.handle_click(QUICK_PLUS),
            InputEvent::Key('-') => self.handle_click(QUICK_MINUS),
            _ => false,
        }
    }

    fn handle_store_key(&mut self, event: &InputEvent) -> bool {
        let s = &mut self.state;
        let count = s.model.catalog.items().len();
        match event {
            InputEvent::Key(c @ '1'..='9') => {
                let index = (*c as u8 - b'1') as usize;
                logic::request_purchase(s, index)
            }
            InputEvent::Enter => {
                let index = s.selected_item;
                logic::request_purchase(s, index)
            }
            InputEvent::Up if count > 0 => {
                s.selected_item = s.selected_item.saturating_sub(1);
                true
            }
            InputEvent::Down if count > 0 => {
                s.selected_item = (s.selected_item + 1).min(count - 1);
                true
            }
            InputEvent::Key('n') => self.handle_click(NEW_ITEM),
            InputEvent::Key('e') => self.handle_click(EDIT_ITEM),
            InputEvent::Key('x') => self.handle_click(DELETE_ITEM),
            _ => false,
        }
    }

    fn handle_data_key(&mut self, event: &InputEvent) -> bool {
        let InputEvent::Key(c) = event else {
            return false;
        };
        match DataCommand::ALL
            .iter()
            .enumerate()
            .find(|(i, _)| DataCommand::key(*i) == *c)
        {
            Some((_, cmd)) => self.run_data(*cmd),
            None => false,
        }
    }

    fn run_data(&mut self, cmd: DataCommand) -> bool {
        if let Err(e) = logic::run_data_command(&mut self.state, cmd) {
            logic::report_error(&mut self.state, &e);
        }
        true
    }
}
