use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use shoe_ledger::tui::ui::{Term, draw_fields, enter_terminal, leave_terminal};
use tokio::runtime::Runtime;
use tracing::warn;

use crate::stat::{Session, login, register};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginMode {
    Email,
    Password,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginStep {
    Choose,
    Login,
    Register,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginAction {
    Nothing,
    Submit,
    Quit,
}

pub struct LoginApp {
    pub base_url: String,
    pub timeout: Duration,
    pub email: String,
    pub password: String,
    pub mode: LoginMode,
    pub step: LoginStep,
    pub error_message: Option<String>,
}

impl LoginApp {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
            email: String::new(),
            password: String::new(),
            mode: LoginMode::Email,
            step: LoginStep::Choose,
            error_message: None,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.mode {
            LoginMode::Email => &mut self.email,
            LoginMode::Password => &mut self.password,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> LoginAction {
        use KeyCode::*;

        if key.kind != KeyEventKind::Press {
            return LoginAction::Nothing;
        }
        if self.step == LoginStep::Choose {
            match key.code {
                Char('l') => self.step = LoginStep::Login,
                Char('r') => self.step = LoginStep::Register,
                Char('q') | Esc => return LoginAction::Quit,
                _ => {}
            }
            return LoginAction::Nothing;
        }

        match key.code {
            Esc => {
                self.step = LoginStep::Choose;
                self.mode = LoginMode::Email;
                self.password.clear();
                self.error_message = None;
            }
            Tab | BackTab | Up | Down => {
                self.mode = match self.mode {
                    LoginMode::Email => LoginMode::Password,
                    LoginMode::Password => LoginMode::Email,
                };
            }
            Enter => match self.mode {
                LoginMode::Email => self.mode = LoginMode::Password,
                LoginMode::Password => {
                    if self.email.trim().is_empty() || self.password.is_empty() {
                        self.error_message = Some("Email and password are required".into());
                    } else {
                        return LoginAction::Submit;
                    }
                }
            },
            Backspace => {
                self.field_mut().pop();
            }
            Char(c) => self.field_mut().push(c),
            _ => {}
        }
        LoginAction::Nothing
    }

    /// Registers first when on the registration step, then signs in.
    async fn submit(&self) -> anyhow::Result<Session> {
        let email = self.email.trim();
        if self.step == LoginStep::Register {
            register(&self.base_url, email, &self.password, self.timeout).await?;
        }
        login(&self.base_url, email, &self.password, self.timeout).await
    }
}

/// Shows the sign-in gate. Returns `None` when the user quits.
pub fn run_login(rt: &Runtime, base_url: &str, timeout: Duration) -> anyhow::Result<Option<Session>> {
    let mut app = LoginApp::new(base_url, timeout);
    let mut terminal = enter_terminal()?;
    let result = login_loop(&mut terminal, &mut app, rt);
    leave_terminal(&mut terminal)?;
    result
}

fn login_loop(terminal: &mut Term, app: &mut LoginApp, rt: &Runtime) -> anyhow::Result<Option<Session>> {
    loop {
        terminal.draw(|f| draw_login(f, app))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match app.handle_key(key) {
            LoginAction::Nothing => {}
            LoginAction::Quit => return Ok(None),
            LoginAction::Submit => match rt.block_on(app.submit()) {
                Ok(session) => return Ok(Some(session)),
                Err(e) => {
                    warn!(error = %e, "sign-in failed");
                    app.password.clear();
                    app.error_message = Some(e.to_string());
                }
            },
        }
    }
}

fn draw_login(f: &mut Frame<'_>, app: &LoginApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let header = Paragraph::new(format!("Shoe Mileage Tracker   |   {}", app.base_url))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    match app.step {
        LoginStep::Choose => {
            let p = Paragraph::new("[l] Sign in\n[r] Register\n[q] Quit")
                .block(Block::default().title("Welcome").borders(Borders::ALL));
            f.render_widget(p, chunks[1]);
        }
        LoginStep::Login | LoginStep::Register => {
            let masked = "*".repeat(app.password.chars().count());
            let fields = [("Email", app.email.as_str()), ("Password", masked.as_str())];
            let active = match app.mode {
                LoginMode::Email => 0,
                LoginMode::Password => 1,
            };
            let title = if app.step == LoginStep::Login { "Sign in" } else { "Register" };
            draw_fields(f, chunks[1], title, &fields, active);
        }
    }

    let footer = match &app.error_message {
        Some(err) => Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("Tab: switch field  Enter: next / submit  Esc: back"),
    };
    f.render_widget(footer.block(Block::default().borders(Borders::ALL)), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut LoginApp, code: KeyCode) -> LoginAction {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut LoginApp, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_fills_the_active_field() {
        let mut app = LoginApp::new("http://localhost:8080", Duration::from_secs(1));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.step, LoginStep::Login);
        type_str(&mut app, "ann@example.com");
        assert_eq!(press(&mut app, KeyCode::Enter), LoginAction::Nothing);
        assert_eq!(app.mode, LoginMode::Password);
        type_str(&mut app, "pw1x");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.email, "ann@example.com");
        assert_eq!(app.password, "pw1");
        assert_eq!(press(&mut app, KeyCode::Enter), LoginAction::Submit);
    }

    #[test]
    fn empty_password_is_not_submitted() {
        let mut app = LoginApp::new("http://localhost:8080", Duration::from_secs(1));
        press(&mut app, KeyCode::Char('r'));
        type_str(&mut app, "ann@example.com");
        press(&mut app, KeyCode::Tab);
        assert_eq!(press(&mut app, KeyCode::Enter), LoginAction::Nothing);
        assert!(app.error_message.is_some());
    }

    #[test]
    fn escape_goes_back_then_quits() {
        let mut app = LoginApp::new("http://localhost:8080", Duration::from_secs(1));
        press(&mut app, KeyCode::Char('l'));
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.step, LoginStep::Choose);
        assert_eq!(press(&mut app, KeyCode::Char('q')), LoginAction::Quit);
    }
}
