use chrono::{Local, NaiveDate};
use tracing::info;

use super::state::{self, ActionError, AppState, Commit, Transition};
use crate::stat::{Closet, LedgerError, RunLogEntry, Shoe, ShoeDraft};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Closet,
    History,
    Help,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    AddingShoe,
    LoggingRun,
    EditingRun,
    ConfirmDeleteShoe,
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::invalid(format!("{field} must be YYYY-MM-DD")))
}

fn parse_number(field: &str, raw: &str) -> Result<f64, LedgerError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| LedgerError::invalid(format!("{field} must be a number")))
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShoeForm {
    pub brand: String,
    pub model: String,
    pub color: String,
    pub first_run_date: String,
    pub expected_lifecycle: String,
}
impl Default for ShoeForm {
    fn default() -> Self {
        Self {
            brand: String::new(),
            model: String::new(),
            color: String::new(),
            first_run_date: today(),
            expected_lifecycle: String::from("400"),
        }
    }
}
impl ShoeForm {
    pub const FIELDS: usize = 5;

    pub fn field_mut(&mut self, idx: usize) -> Option<&mut String> {
        match idx {
            0 => Some(&mut self.brand),
            1 => Some(&mut self.model),
            2 => Some(&mut self.color),
            3 => Some(&mut self.first_run_date),
            4 => Some(&mut self.expected_lifecycle),
            _ => None,
        }
    }

    pub fn to_draft(&self) -> Result<ShoeDraft, LedgerError> {
        Ok(ShoeDraft {
            brand: self.brand.clone(),
            model: self.model.clone(),
            color: self.color.clone(),
            first_run_date: parse_date("first run date", &self.first_run_date)?,
            expected_lifecycle: parse_number("expected lifecycle", &self.expected_lifecycle)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunForm {
    pub miles: String,
    pub date: String,
    pub location: String,
    pub zone: String,
}
impl Default for RunForm {
    fn default() -> Self {
        Self {
            miles: String::new(),
            date: today(),
            location: String::new(),
            zone: String::new(),
        }
    }
}
impl RunForm {
    pub const FIELDS: usize = 4;

    pub fn from_entry(entry: &RunLogEntry) -> Self {
        Self {
            miles: entry.miles.to_string(),
            date: entry.date.format("%Y-%m-%d").to_string(),
            location: entry.location.clone(),
            zone: entry.zone.map(|z| z.to_string()).unwrap_or_default(),
        }
    }

    pub fn field_mut(&mut self, idx: usize) -> Option<&mut String> {
        match idx {
            0 => Some(&mut self.miles),
            1 => Some(&mut self.date),
            2 => Some(&mut self.location),
            3 => Some(&mut self.zone),
            _ => None,
        }
    }

    /// Parses the form; the ledger re-checks the values it cares about.
    pub fn to_entry(&self) -> Result<RunLogEntry, LedgerError> {
        let zone = if self.zone.trim().is_empty() {
            None
        } else {
            Some(parse_number("zone", &self.zone)?)
        };
        Ok(RunLogEntry {
            miles: parse_number("miles", &self.miles)?,
            date: parse_date("run date", &self.date)?,
            location: self.location.trim().to_string(),
            zone,
        })
    }
}

/// A write that failed, kept with the state it was computed from so it can
/// only be retried while that state is still current.
#[derive(Clone, Debug)]
pub struct PendingRetry {
    pub base: AppState,
    pub transition: Transition,
    pub reason: String,
}

pub struct App {
    pub state: AppState,
    pub title: String,
    pub current_screen: Screen,
    pub input_mode: InputMode,
    pub log_cursor: usize,
    pub field_idx: usize,
    pub shoe_form: ShoeForm,
    pub run_form: RunForm,
    pub pending_retry: Option<PendingRetry>,
    pub should_quit: bool,
    pub needs_refresh: bool,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
}

impl App {
    pub fn new(shoes: Vec<Shoe>, title: impl Into<String>) -> Self {
        let state = state::reload(&AppState::new(Closet::default()), shoes);
        let selected = if state.closet.is_empty() { None } else { Some(0) };
        Self {
            state: AppState { selected, ..state },
            title: title.into(),
            current_screen: Screen::Closet,
            input_mode: InputMode::Normal,
            log_cursor: 0,
            field_idx: 0,
            shoe_form: ShoeForm::default(),
            run_form: RunForm::default(),
            pending_retry: None,
            should_quit: false,
            needs_refresh: false,
            error_message: None,
            success_message: None,
        }
    }

    pub fn next_screen(&mut self) {
        self.current_screen = match self.current_screen {
            Screen::Closet => Screen::History,
            Screen::History => Screen::Help,
            Screen::Help => Screen::Closet,
        };
    }

    pub fn prev_screen(&mut self) {
        self.current_screen = match self.current_screen {
            Screen::Closet => Screen::Help,
            Screen::History => Screen::Closet,
            Screen::Help => Screen::History,
        };
    }

    fn fail(&mut self, err: impl std::fmt::Display) {
        self.success_message = None;
        self.error_message = Some(err.to_string());
    }

    pub fn clear_messages(&mut self) {
        self.error_message = None;
        self.success_message = None;
    }

    fn selected_log_len(&self) -> usize {
        self.state.selected_shoe().map(|s| s.logs.len()).unwrap_or(0)
    }

    pub fn move_up(&mut self) {
        match self.current_screen {
            Screen::Closet => {
                let next = self.state.selected.map(|i| i.saturating_sub(1)).unwrap_or(0);
                self.select(next);
            }
            Screen::History => self.log_cursor = self.log_cursor.saturating_sub(1),
            Screen::Help => {}
        }
    }

    pub fn move_down(&mut self) {
        match self.current_screen {
            Screen::Closet => {
                let last = self.state.closet.len().saturating_sub(1);
                let next = self.state.selected.map(|i| (i + 1).min(last)).unwrap_or(0);
                self.select(next);
            }
            Screen::History => {
                let last = self.selected_log_len().saturating_sub(1);
                self.log_cursor = (self.log_cursor + 1).min(last);
            }
            Screen::Help => {}
        }
    }

    pub fn deselect(&mut self) {
        self.state = state::clear_selection(&self.state);
        self.log_cursor = 0;
    }

    pub fn select(&mut self, index: usize) {
        if self.state.closet.is_empty() {
            return;
        }
        match state::select_shoe(&self.state, index) {
            Ok(next) => {
                if next.selected != self.state.selected {
                    self.log_cursor = 0;
                }
                self.state = next;
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn open_shoe_form(&mut self) {
        self.shoe_form = ShoeForm::default();
        self.field_idx = 0;
        self.input_mode = InputMode::AddingShoe;
    }

    pub fn open_run_form(&mut self) {
        if self.state.selected_shoe().is_none() {
            self.fail(ActionError::NoSelection);
            return;
        }
        self.run_form = RunForm::default();
        self.field_idx = 0;
        self.input_mode = InputMode::LoggingRun;
    }

    pub fn open_edit_form(&mut self) {
        match state::begin_edit_log(&self.state, self.log_cursor) {
            Ok(next) => {
                self.run_form = next
                    .editing_entry()
                    .map(RunForm::from_entry)
                    .unwrap_or_default();
                self.state = next;
                self.field_idx = 0;
                self.input_mode = InputMode::EditingRun;
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn cancel_input(&mut self) {
        if self.input_mode == InputMode::EditingRun {
            self.state = state::cancel_edit_log(&self.state);
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn next_field(&mut self) {
        let count = match self.input_mode {
            InputMode::AddingShoe => ShoeForm::FIELDS,
            InputMode::LoggingRun | InputMode::EditingRun => RunForm::FIELDS,
            _ => return,
        };
        self.field_idx = (self.field_idx + 1) % count;
    }

    pub fn prev_field(&mut self) {
        let count = match self.input_mode {
            InputMode::AddingShoe => ShoeForm::FIELDS,
            InputMode::LoggingRun | InputMode::EditingRun => RunForm::FIELDS,
            _ => return,
        };
        self.field_idx = (self.field_idx + count - 1) % count;
    }

    pub fn active_field(&mut self) -> Option<&mut String> {
        match self.input_mode {
            InputMode::AddingShoe => self.shoe_form.field_mut(self.field_idx),
            InputMode::LoggingRun | InputMode::EditingRun => self.run_form.field_mut(self.field_idx),
            _ => None,
        }
    }

    /// Runs the reducer for the open form. `None` means the input was refused
    /// and the reason is already in `error_message`.
    pub fn submit_form(&mut self) -> Option<Transition> {
        let result = match self.input_mode {
            InputMode::AddingShoe => self
                .shoe_form
                .to_draft()
                .map_err(ActionError::from)
                .and_then(|draft| state::add_shoe(&self.state, draft)),
            InputMode::LoggingRun => self
                .run_form
                .to_entry()
                .map_err(ActionError::from)
                .and_then(|entry| state::add_miles(&self.state, entry)),
            InputMode::EditingRun => self
                .run_form
                .to_entry()
                .map_err(ActionError::from)
                .and_then(|entry| state::save_log_edit(&self.state, entry)),
            _ => return None,
        };
        match result {
            Ok(t) => Some(t),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn request_delete_shoe(&mut self) {
        if self.state.selected_shoe().is_none() {
            self.fail(ActionError::NoSelection);
            return;
        }
        self.input_mode = InputMode::ConfirmDeleteShoe;
    }

    pub fn confirm_delete_shoe(&mut self) -> Option<Transition> {
        self.input_mode = InputMode::Normal;
        let index = self.state.selected?;
        match state::delete_shoe(&self.state, index) {
            Ok(t) => Some(t),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn delete_log_at_cursor(&mut self) -> Option<Transition> {
        match state::delete_log(&self.state, self.log_cursor) {
            Ok(t) => Some(t),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Takes the failed write back if it still applies to the current state.
    pub fn take_retry(&mut self) -> Option<Transition> {
        let pending = self.pending_retry.take()?;
        if pending.base != self.state {
            self.fail("data changed since the failed write; redo the action instead");
            return None;
        }
        Some(pending.transition)
    }

    pub fn apply(&mut self, outcome: Commit) {
        match outcome {
            Commit::Applied { state, action } => {
                info!(action, "applied");
                self.state = state;
                self.pending_retry = None;
                self.input_mode = InputMode::Normal;
                self.log_cursor = self.log_cursor.min(self.selected_log_len().saturating_sub(1));
                self.error_message = None;
                self.success_message = Some(format!("Saved: {action}"));
            }
            Commit::RolledBack {
                state,
                failed,
                error,
            } => {
                // the edit form is closed, so no run stays marked as edited
                let state = state::cancel_edit_log(&state);
                self.state = state.clone();
                self.input_mode = InputMode::Normal;
                self.fail(format!(
                    "{} failed: {error}. Nothing was changed, press R to retry",
                    failed.action
                ));
                self.pending_retry = Some(PendingRetry {
                    base: state,
                    transition: failed,
                    reason: error.to_string(),
                });
            }
        }
    }

    pub fn reload(&mut self, shoes: Vec<Shoe>) {
        self.state = state::reload(&self.state, shoes);
        self.pending_retry = None;
        self.log_cursor = self.log_cursor.min(self.selected_log_len().saturating_sub(1));
        self.success_message = Some("Data refreshed".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::{StoreError, sample_closet};
    use crate::tui::state::Write;
    use uuid::Uuid;

    fn app() -> App {
        let mut shoes = sample_closet().unwrap().shoes;
        for shoe in &mut shoes {
            shoe.id = Some(Uuid::new_v4());
        }
        App::new(shoes, "test")
    }

    #[test]
    fn run_form_parses_optional_zone() {
        let form = RunForm {
            miles: " 6.5 ".into(),
            date: "2025-07-19".into(),
            location: " park ".into(),
            zone: "".into(),
        };
        let entry = form.to_entry().unwrap();
        assert_eq!(entry.miles, 6.5);
        assert_eq!(entry.location, "park");
        assert_eq!(entry.zone, None);

        let bad = RunForm {
            miles: "six".into(),
            ..form
        };
        assert!(bad.to_entry().is_err());
    }

    #[test]
    fn starts_on_first_shoe() {
        let app = app();
        assert_eq!(app.state.selected, Some(0));
        assert_eq!(App::new(Vec::new(), "empty").state.selected, None);
    }

    #[test]
    fn navigation_clamps() {
        let mut app = app();
        app.move_up();
        assert_eq!(app.state.selected, Some(0));
        for _ in 0..10 {
            app.move_down();
        }
        assert_eq!(app.state.selected, Some(app.state.closet.len() - 1));
    }

    #[test]
    fn refused_form_keeps_state() {
        let mut app = app();
        let before = app.state.clone();
        app.open_run_form();
        app.run_form.miles = "-3".into();
        assert!(app.submit_form().is_none());
        assert!(app.error_message.is_some());
        assert_eq!(app.state, before);
    }

    #[test]
    fn rollback_offers_retry_only_on_same_state() {
        let mut app = app();
        app.open_run_form();
        app.run_form.miles = "4".into();
        let t = app.submit_form().unwrap();
        assert!(matches!(t.write, Write::Update { .. }));

        app.apply(Commit::RolledBack {
            state: app.state.clone(),
            failed: t.clone(),
            error: StoreError::Transport("timeout".into()),
        });
        assert!(app.error_message.as_deref().unwrap().contains("retry"));
        assert_eq!(app.take_retry(), Some(t.clone()));

        app.apply(Commit::RolledBack {
            state: app.state.clone(),
            failed: t,
            error: StoreError::Transport("timeout".into()),
        });
        app.select(1);
        assert_eq!(app.take_retry(), None);
    }

    #[test]
    fn failed_edit_leaves_no_run_marked() {
        let mut app = app();
        app.open_run_form();
        app.run_form.miles = "4".into();
        let added = app.submit_form().unwrap();
        app.apply(Commit::Applied {
            state: added.next,
            action: added.action,
        });

        app.current_screen = Screen::History;
        app.open_edit_form();
        assert_eq!(app.state.editing_log, Some(0));
        app.run_form.miles = "5".into();
        let edit = app.submit_form().unwrap();

        app.apply(Commit::RolledBack {
            state: app.state.clone(),
            failed: edit.clone(),
            error: StoreError::Unavailable("timed out".into()),
        });
        assert_eq!(app.state.editing_log, None);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.state.selected_shoe().unwrap().logs[0].miles, 4.0);
        assert_eq!(app.take_retry(), Some(edit));
    }

    #[test]
    fn deselect_clears_selection_and_edit() {
        let mut app = app();
        app.deselect();
        assert_eq!(app.state.selected, None);
        assert_eq!(app.state.editing_log, None);
        app.open_run_form();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.error_message.is_some());
        app.move_down();
        assert!(app.state.selected.is_some());
    }

    #[test]
    fn delete_needs_confirmation_step() {
        let mut app = app();
        app.request_delete_shoe();
        assert_eq!(app.input_mode, InputMode::ConfirmDeleteShoe);
        let t = app.confirm_delete_shoe().unwrap();
        assert_eq!(t.next.closet.len(), app.state.closet.len() - 1);
        assert_eq!(t.next.selected, None);
        assert_eq!(app.input_mode, InputMode::Normal);
    }
}
