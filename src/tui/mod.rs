mod render;

use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;

use crate::app::App;
use crate::calendar::Month;
use crate::filter::SortKey;
use crate::router::View;
use crate::session::FormField;

const TICK: Duration = Duration::from_millis(100);

/// What keystrokes currently feed into.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    Search(String),
    EditField { field: FormField, buffer: String },
    UploadPath(String),
}

/// Cursor positions and other state that only matters to the terminal.
struct UiState {
    mode: Mode,
    selected: usize,
    sort_column: SortKey,
    form_cursor: usize,
    month: Month,
    quit: bool,
}

impl UiState {
    fn new(sort_column: SortKey) -> Self {
        Self {
            mode: Mode::Normal,
            selected: 0,
            sort_column,
            form_cursor: 0,
            month: Month::containing(Local::now().date_naive()),
            quit: false,
        }
    }
}

/// A form row is either one of the fields or one of the attached documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormRow {
    Field(FormField),
    Document(usize),
}

fn form_rows(app: &App) -> Vec<FormRow> {
    let mut rows: Vec<FormRow> = FormField::ALL.iter().map(|f| FormRow::Field(*f)).collect();
    if let Some(session) = app.router().session().filter(|s| s.is_editing()) {
        rows.extend((0..session.buffer().documents.len()).map(FormRow::Document));
    }
    rows
}

pub fn run(app: &mut App) -> Result<()> {
    app.fetch_jobs();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    let mut ui = UiState::new(app.router().query().sort.key);

    while !ui.quit {
        app.poll();
        clamp_cursors(app, &mut ui);
        terminal.draw(|frame| render::draw(frame, app, &ui))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_key(app, &mut ui, key);
        }
    }
    Ok(())
}

fn clamp_cursors(app: &mut App, ui: &mut UiState) {
    let rows = app.visible_jobs().len();
    ui.selected = ui.selected.min(rows.saturating_sub(1));
    let form_len = form_rows(app).len();
    ui.form_cursor = ui.form_cursor.min(form_len.saturating_sub(1));
}

fn handle_key(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    if app.confirm_pending().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm(false),
            _ => {}
        }
        return;
    }

    match ui.mode.clone() {
        Mode::Search(mut term) => {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => ui.mode = Mode::Normal,
                KeyCode::Backspace => {
                    term.pop();
                    app.set_search_term(&term);
                    ui.mode = Mode::Search(term);
                }
                KeyCode::Char(c) => {
                    term.push(c);
                    app.set_search_term(&term);
                    ui.mode = Mode::Search(term);
                }
                _ => {}
            }
            ui.selected = 0;
        }
        Mode::EditField { field, mut buffer } => match key.code {
            KeyCode::Enter => {
                app.edit_field(field, &buffer);
                ui.mode = Mode::Normal;
            }
            KeyCode::Esc => ui.mode = Mode::Normal,
            KeyCode::Backspace => {
                buffer.pop();
                ui.mode = Mode::EditField { field, buffer };
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                ui.mode = Mode::EditField { field, buffer };
            }
            _ => {}
        },
        Mode::UploadPath(mut buffer) => match key.code {
            KeyCode::Enter => {
                ui.mode = Mode::Normal;
                if !buffer.trim().is_empty() {
                    app.upload(expand_home(buffer.trim()));
                }
            }
            KeyCode::Esc => ui.mode = Mode::Normal,
            KeyCode::Backspace => {
                buffer.pop();
                ui.mode = Mode::UploadPath(buffer);
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                ui.mode = Mode::UploadPath(buffer);
            }
            _ => {}
        },
        Mode::Normal => handle_normal(app, ui, key),
    }
}

fn handle_normal(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    if app.router().view() == View::Form {
        handle_form(app, ui, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => ui.quit = true,
        KeyCode::Char('1') => app.navigate(View::Dashboard),
        KeyCode::Char('2') => app.navigate(View::Calendar),
        KeyCode::Char('3') => app.navigate(View::Reports),
        KeyCode::Char('a') => {
            app.show_add_page();
            ui.form_cursor = 0;
        }
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('r') => app.fetch_jobs(),
        _ => match app.router().view() {
            View::Dashboard => handle_dashboard(app, ui, key),
            View::Calendar => match key.code {
                KeyCode::Left | KeyCode::Char('h') => ui.month = ui.month.prev(),
                KeyCode::Right | KeyCode::Char('l') => ui.month = ui.month.next(),
                _ => {}
            },
            View::Reports | View::Form => {}
        },
    }
}

fn handle_dashboard(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    let selected_id = app.visible_jobs().get(ui.selected).and_then(|j| j.id);
    let rows = app.visible_jobs().len();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            if rows > 0 && ui.selected < rows - 1 {
                ui.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => ui.selected = ui.selected.saturating_sub(1),
        KeyCode::Char('/') => {
            let term = app.router().query().search_term.clone();
            ui.mode = Mode::Search(term);
        }
        KeyCode::Char('s') => {
            ui.sort_column = ui.sort_column.next();
            app.sort_by(ui.sort_column);
        }
        KeyCode::Char('S') => app.sort_by(ui.sort_column),
        KeyCode::Enter | KeyCode::Char('e') => {
            if let Some(id) = selected_id {
                app.show_edit_page(id);
                ui.form_cursor = 0;
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected_id {
                app.request_delete_job(id);
            }
        }
        KeyCode::Esc => app.clear_status(),
        _ => {}
    }
}

fn handle_form(app: &mut App, ui: &mut UiState, key: KeyEvent) {
    let rows = form_rows(app);
    let current = rows.get(ui.form_cursor).copied();

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
        app.save();
        return;
    }

    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
            if ui.form_cursor + 1 < rows.len() {
                ui.form_cursor += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
            ui.form_cursor = ui.form_cursor.saturating_sub(1)
        }
        KeyCode::Left if current == Some(FormRow::Field(FormField::Status)) => app.cycle_status(false),
        KeyCode::Right if current == Some(FormRow::Field(FormField::Status)) => app.cycle_status(true),
        KeyCode::Enter => match current {
            Some(FormRow::Field(FormField::Status)) => app.cycle_status(true),
            Some(FormRow::Field(field)) => {
                let buffer = app
                    .router()
                    .session()
                    .map(|s| s.field_value(field))
                    .unwrap_or_default();
                ui.mode = Mode::EditField { field, buffer };
            }
            Some(FormRow::Document(_)) | None => {}
        },
        KeyCode::Char('u') => {
            if app.router().session().and_then(|s| s.upload_target()).is_some() {
                ui.mode = Mode::UploadPath(String::new());
            } else {
                // Reports why nothing can be attached yet.
                app.upload(PathBuf::new());
            }
        }
        KeyCode::Char('x') => {
            if let Some(FormRow::Document(index)) = current {
                app.request_delete_document(index);
            }
        }
        _ => {}
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(expand_home("~/cv.pdf"), PathBuf::from(home).join("cv.pdf"));
        assert_eq!(expand_home("/tmp/cv.pdf"), PathBuf::from("/tmp/cv.pdf"));
    }
}
