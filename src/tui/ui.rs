use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table},
};
use tokio::runtime::Runtime;
use tracing::warn;

use super::app::{App, InputMode, Screen};
use super::state::{Transition, commit};
use crate::stat::{ColorKey, ShoeStore, display_date};

pub type Term = Terminal<CrosstermBackend<Stdout>>;

pub fn enter_terminal() -> anyhow::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn leave_terminal(terminal: &mut Term) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Theme accent for a shoe's colour family.
pub fn accent(key: ColorKey) -> Color {
    match key {
        ColorKey::Black => Color::DarkGray,
        ColorKey::White => Color::White,
        ColorKey::Gray => Color::Gray,
        ColorKey::Red => Color::Red,
        ColorKey::Orange => Color::Rgb(255, 140, 0),
        ColorKey::Yellow => Color::Yellow,
        ColorKey::Green => Color::Green,
        ColorKey::Blue => Color::Blue,
        ColorKey::Purple => Color::Magenta,
        ColorKey::Pink => Color::LightMagenta,
        ColorKey::Brown => Color::Rgb(160, 100, 50),
        ColorKey::Other => Color::Cyan,
    }
}

/// Runs the tracker until the user quits. Writes go through `store` on `rt`.
pub fn run_tui<S: ShoeStore>(app: App, store: &S, rt: &Runtime) -> anyhow::Result<()> {
    let mut app = app;
    let mut terminal = enter_terminal()?;
    let result = event_loop(&mut terminal, &mut app, store, rt);
    leave_terminal(&mut terminal)?;
    result
}

fn event_loop<S: ShoeStore>(
    terminal: &mut Term,
    app: &mut App,
    store: &S,
    rt: &Runtime,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if app.needs_refresh {
            app.needs_refresh = false;
            match rt.block_on(store.list_records()) {
                Ok(shoes) => app.reload(shoes),
                Err(e) => {
                    warn!(error = %e, "refresh failed");
                    app.error_message = Some(format!("Refresh failed: {e}"));
                }
            }
        }

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if let Some(transition) = handle_key_event(app, key) {
                    let outcome = rt.block_on(commit(store, &app.state, transition));
                    app.apply(outcome);
                }
            }
        }
    }
}

/// Returns the transition to commit, if the key produced one.
fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Transition> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match app.input_mode {
        InputMode::Normal => handle_key_normal(app, key),
        InputMode::AddingShoe | InputMode::LoggingRun | InputMode::EditingRun => {
            handle_key_form(app, key)
        }
        InputMode::ConfirmDeleteShoe => handle_key_confirm(app, key),
    }
}

fn handle_key_normal(app: &mut App, key: KeyEvent) -> Option<Transition> {
    use KeyCode::*;

    match key.code {
        Char('q') => app.should_quit = true,

        Tab => app.next_screen(),
        BackTab => app.prev_screen(),

        Up => app.move_up(),
        Down => app.move_down(),
        Esc => app.deselect(),

        Char('?') => app.current_screen = Screen::Help,
        Char('r') => app.needs_refresh = true,
        Char('R') => return app.take_retry(),
        Char('c') => app.clear_messages(),

        Char('n') => app.open_shoe_form(),
        Char('a') => app.open_run_form(),

        Char('e') => {
            if let Screen::History = app.current_screen {
                app.open_edit_form();
            }
        }

        Char('d') => match app.current_screen {
            Screen::Closet => app.request_delete_shoe(),
            Screen::History => return app.delete_log_at_cursor(),
            Screen::Help => {}
        },

        _ => {}
    }
    None
}

fn handle_key_form(app: &mut App, key: KeyEvent) -> Option<Transition> {
    use KeyCode::*;

    match key.code {
        Esc => {
            app.cancel_input();
            app.error_message = None;
        }
        Tab | Down => app.next_field(),
        BackTab | Up => app.prev_field(),
        Enter => {
            app.error_message = None;
            return app.submit_form();
        }
        Backspace => {
            if let Some(field) = app.active_field() {
                field.pop();
            }
        }
        Char(c) => {
            if let Some(field) = app.active_field() {
                field.push(c);
            }
        }
        _ => {}
    }
    None
}

fn handle_key_confirm(app: &mut App, key: KeyEvent) -> Option<Transition> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete_shoe(),
        _ => {
            app.cancel_input();
            None
        }
    }
}

fn ui(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // main
            Constraint::Length(3), // footer
        ])
        .split(f.area());

    let screen_name = match app.current_screen {
        Screen::Closet => "Closet",
        Screen::History => "Run History",
        Screen::Help => "Help",
    };
    let selected = app
        .state
        .selected_shoe()
        .map(|s| format!("{} {}", s.brand, s.model))
        .unwrap_or_else(|| "no shoe selected".to_string());
    let header_text = format!("Shoe Mileage Tracker - {screen_name}   |   {selected}   |   {}", app.title);
    let header = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    match app.current_screen {
        Screen::Closet => draw_closet(f, chunks[1], app),
        Screen::History => draw_history(f, chunks[1], app),
        Screen::Help => draw_help(f, chunks[1]),
    }

    match app.input_mode {
        InputMode::AddingShoe => draw_shoe_form(f, chunks[1], app),
        InputMode::LoggingRun => draw_run_form(f, chunks[1], app, "Add Miles"),
        InputMode::EditingRun => draw_run_form(f, chunks[1], app, "Edit Run"),
        InputMode::ConfirmDeleteShoe => draw_confirm_delete(f, chunks[1], app),
        InputMode::Normal => {}
    }

    let footer_text = if let Some(ref msg) = app.error_message {
        format!("ERROR: {msg} | Press 'c' to clear")
    } else if let Some(ref msg) = app.success_message {
        format!("SUCCESS: {msg} | Press 'c' to clear")
    } else if let Some(ref pending) = app.pending_retry {
        format!("Unsaved: {} ({}) | R: retry", pending.transition.action, pending.reason)
    } else {
        match app.input_mode {
            InputMode::Normal => {
                "Tab: screen | ↑/↓: move | n: new shoe | a: add miles | e: edit run | d: delete | r: refresh | ?: help | q: quit".to_string()
            }
            InputMode::AddingShoe | InputMode::LoggingRun | InputMode::EditingRun => {
                "Tab/↑/↓: switch field | Enter: save | Esc: cancel".to_string()
            }
            InputMode::ConfirmDeleteShoe => "y/Enter: delete | any other key: keep".to_string(),
        }
    };
    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn draw_closet(f: &mut Frame<'_>, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let summary = app.state.closet.summary();
    let rows = summary.iter().map(|s| {
        let life = s
            .life_remaining
            .map(|p| format!("{p:.1}%"))
            .unwrap_or_else(|| "-".to_string());
        let cells = vec![
            format!("{} {}", s.brand, s.model),
            s.color.label().to_string(),
            s.first_run_date.clone(),
            format!("{:.2}", s.miles),
            s.runs.to_string(),
            life,
        ];
        let mut row = Row::new(cells).style(Style::default().fg(accent(s.color)));
        if Some(s.index) == app.state.selected {
            row = row.style(
                Style::default()
                    .fg(accent(s.color))
                    .add_modifier(Modifier::REVERSED),
            );
        }
        row
    });

    let header = Row::new(vec!["Shoe", "Color", "First Run", "Miles", "Runs", "Life Left"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(Span::raw(format!(
                "Shoes ({:.2} total miles)",
                app.state.closet.total_miles()
            )))
            .borders(Borders::ALL),
    );
    f.render_widget(table, chunks[0]);

    if app.state.closet.is_empty() {
        let p = Paragraph::new("No shoes in inventory. Press 'n' to add one.")
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, chunks[1]);
        return;
    }

    if let Some(shoe) = app.state.selected_shoe() {
        let block = Block::default().title("Life Remaining").borders(Borders::ALL);
        match shoe.life_remaining_percent() {
            Ok(percent) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(accent(shoe.color_key())))
                    .ratio(percent / 100.0)
                    .label(format!("{percent:.1}%"));
                f.render_widget(gauge, chunks[1]);
            }
            Err(e) => {
                let p = Paragraph::new(format!("{e}")).block(block);
                f.render_widget(p, chunks[1]);
            }
        }
    }
}

fn draw_history(f: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(shoe) = app.state.selected_shoe() else {
        let p = Paragraph::new("Select a shoe on the Closet screen first.")
            .block(Block::default().title("Run History").borders(Borders::ALL));
        f.render_widget(p, area);
        return;
    };

    let rows = shoe.logs.iter().enumerate().map(|(idx, entry)| {
        let cells = vec![
            (idx + 1).to_string(),
            display_date(entry.date),
            format!("{:.2}", entry.miles),
            entry.location.clone(),
            entry.zone.map(|z| format!("{z}")).unwrap_or_default(),
        ];
        let mut row = Row::new(cells);
        if idx == app.log_cursor {
            row = row.style(Style::default().add_modifier(Modifier::REVERSED));
        }
        if app.state.editing_log == Some(idx) {
            row = row.style(Style::default().fg(Color::Yellow));
        }
        row
    });

    let header = Row::new(vec!["#", "Date", "Miles", "Location", "Zone"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Percentage(50),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(
                "{} {} - {:.2} miles over {} runs",
                shoe.brand,
                shoe.model,
                shoe.miles,
                shoe.logs.len()
            ))
            .borders(Borders::ALL),
    );
    f.render_widget(table, area);
}

fn draw_help(f: &mut Frame<'_>, area: Rect) {
    let text = "\
Tab / Shift+Tab   switch screen
Up / Down         select shoe (Closet) or run (History)
Esc               clear the selection
n                 add a new shoe
a                 add miles to the selected shoe
e                 edit the highlighted run (History)
d                 delete the selected shoe (Closet) or highlighted run (History)
r                 reload from the store
R                 retry the last failed save
c                 clear messages
q                 quit";
    let p = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    f.render_widget(p, area);
}

pub fn popup(area: Rect, height: u16) -> Rect {
    let width = area.width.saturating_mul(3) / 4;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn draw_fields(f: &mut Frame<'_>, area: Rect, title: &str, fields: &[(&str, &str)], active: usize) {
    let mut text = String::new();
    for (idx, (label, value)) in fields.iter().enumerate() {
        let marker = if idx == active { "> " } else { "  " };
        text.push_str(&format!("{marker}{label}: {value}\n"));
    }
    let rect = popup(area, fields.len() as u16 + 2);
    f.render_widget(Clear, rect);
    let p = Paragraph::new(text).block(Block::default().title(title.to_string()).borders(Borders::ALL));
    f.render_widget(p, rect);
}

fn draw_shoe_form(f: &mut Frame<'_>, area: Rect, app: &App) {
    let form = &app.shoe_form;
    let fields = [
        ("Brand", form.brand.as_str()),
        ("Model", form.model.as_str()),
        ("Color", form.color.as_str()),
        ("First Run (YYYY-MM-DD)", form.first_run_date.as_str()),
        ("Expected Lifecycle (miles)", form.expected_lifecycle.as_str()),
    ];
    draw_fields(f, area, "Add New Shoe", &fields, app.field_idx);
}

fn draw_run_form(f: &mut Frame<'_>, area: Rect, app: &App, title: &str) {
    let form = &app.run_form;
    let fields = [
        ("Miles", form.miles.as_str()),
        ("Date (YYYY-MM-DD)", form.date.as_str()),
        ("Location", form.location.as_str()),
        ("Zone (1-5, optional)", form.zone.as_str()),
    ];
    let title = match app.state.selected_shoe() {
        Some(shoe) => format!("{title} - {} {}", shoe.brand, shoe.model),
        None => title.to_string(),
    };
    draw_fields(f, area, &title, &fields, app.field_idx);
}

fn draw_confirm_delete(f: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(shoe) = app.state.selected_shoe() else {
        return;
    };
    let rect = popup(area, 4);
    f.render_widget(Clear, rect);
    let text = format!(
        "Delete {} {} and all {} runs? (y/n)",
        shoe.brand,
        shoe.model,
        shoe.logs.len()
    );
    let p = Paragraph::new(text).block(Block::default().title("Confirm").borders(Borders::ALL));
    f.render_widget(p, rect);
}
