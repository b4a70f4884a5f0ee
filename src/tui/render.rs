use ratatui::{
    prelude::*,
    symbols,
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState, Wrap,
    },
};

use super::{form_rows, FormRow, Mode, UiState};
use crate::app::App;
use crate::calendar::{calendar_events, events_by_day, month_grid};
use crate::filter::SortKey;
use crate::models::JobApplication;
use crate::report::{applications_by_status, applications_over_time, status_summary};
use crate::router::View;
use crate::session::FormField;
use crate::theme::Palette;

pub(super) fn draw(frame: &mut Frame, app: &mut App, ui: &UiState) {
    let palette = app.palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_header(frame, app, &palette, chunks[0]);
    match app.router().view() {
        View::Dashboard => draw_dashboard(frame, app, ui, &palette, chunks[1]),
        View::Calendar => draw_calendar(frame, app, ui, &palette, chunks[1]),
        View::Reports => draw_reports(frame, app, &palette, chunks[1]),
        View::Form => draw_form(frame, app, ui, &palette, chunks[1]),
    }
    draw_footer(frame, app, ui, &palette, chunks[2]);
}

fn draw_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let active = app.router().view();
    let mut spans = vec![Span::styled(
        " JobTracker  ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (key, view) in [("1", View::Dashboard), ("2", View::Calendar), ("3", View::Reports)] {
        let style = if active == view {
            Style::default().bg(palette.highlight_bg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.dim)
        };
        spans.push(Span::styled(format!(" {}:{} ", key, view.title()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("  a:Add Job", Style::default().fg(palette.accent)));
    if app.router().is_loading() {
        spans.push(Span::styled("  loading...", Style::default().fg(palette.dim)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_dashboard(frame: &mut Frame, app: &mut App, ui: &UiState, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Status summary
    let summary = status_summary(app.router().jobs());
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(chunks[0]);
    for ((status, count), cell) in summary.iter().zip(cells.iter()) {
        let text = vec![
            Line::from(Span::styled(
                count.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                status.as_str().to_uppercase(),
                Style::default().fg(palette.status(*status)),
            )),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            *cell,
        );
    }

    // Search bar
    let query = app.router().query().clone();
    let searching = matches!(ui.mode, Mode::Search(_));
    let search_text = if query.search_term.is_empty() && !searching {
        Span::styled("Filter Jobs... (/)", Style::default().fg(palette.dim))
    } else {
        Span::raw(query.search_term.clone())
    };
    let search_style = if searching {
        Style::default().fg(palette.accent)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(Line::from(search_text))
            .block(Block::default().borders(Borders::ALL).border_style(search_style).title(" Search ")),
        chunks[1],
    );

    let loading = app.router().is_loading();
    let empty_list = app.router().jobs().is_empty();
    if loading && empty_list {
        frame.render_widget(
            Paragraph::new("Loading applications...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
        return;
    }

    let rows_data = app.visible_jobs();
    if rows_data.is_empty() {
        frame.render_widget(
            Paragraph::new("No job applications found.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
        return;
    }

    let header = Row::new(SortKey::ALL.iter().map(|key| {
        let arrow = if query.sort.key == *key {
            query.sort.direction.arrow()
        } else {
            ""
        };
        let style = if ui.sort_column == *key {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(format!("{} {}", key.label().to_uppercase(), arrow)).style(style)
    }));

    let rows: Vec<Row> = rows_data.iter().map(|job| job_row(job, palette)).collect();
    let count = rows.len();
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(22),
            Constraint::Percentage(20),
            Constraint::Percentage(14),
            Constraint::Percentage(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Applications ({}) ", count)),
    )
    .row_highlight_style(Style::default().bg(palette.highlight_bg).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(ui.selected));
    frame.render_stateful_widget(table, chunks[2], &mut state);
}

fn job_row<'a>(job: &'a JobApplication, palette: &Palette) -> Row<'a> {
    let position = if job.job_url.is_some() {
        Cell::from(job.job_position.as_str()).style(Style::default().fg(palette.accent))
    } else {
        Cell::from(job.job_position.as_str())
    };
    let saved = job
        .saved_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    Row::new(vec![
        position,
        Cell::from(job.company.as_str()),
        Cell::from(job.location.as_deref().unwrap_or("")),
        Cell::from(job.status.as_str()).style(Style::default().fg(palette.status(job.status))),
        Cell::from(saved),
    ])
}

fn draw_calendar(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette, area: Rect) {
    let events = calendar_events(app.router().jobs());
    let by_day = events_by_day(&events, ui.month);
    let weeks = month_grid(ui.month);

    let header = Row::new(
        ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .iter()
            .map(|d| Cell::from(*d).style(Style::default().add_modifier(Modifier::BOLD))),
    );

    let cell_height = (area.height.saturating_sub(4) / weeks.len().max(1) as u16).max(2);
    let rows: Vec<Row> = weeks
        .iter()
        .map(|week| {
            Row::new(week.iter().map(|day| {
                let Some(day) = day else { return Cell::from("") };
                let mut lines = vec![Line::from(Span::styled(
                    day.to_string(),
                    Style::default().fg(palette.dim),
                ))];
                if let Some(day_events) = by_day.get(day) {
                    for event in day_events {
                        lines.push(Line::from(Span::styled(
                            event.title.clone(),
                            Style::default().fg(palette.accent),
                        )));
                    }
                }
                Cell::from(Text::from(lines))
            }))
            .height(cell_height)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7]).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {}  (h/l: month) ", ui.month.label())),
    );
    frame.render_widget(table, area);
}

fn draw_reports(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let by_status = applications_by_status(app.router().jobs());
    let bars: Vec<(&str, u64)> = by_status.iter().map(|b| (b.name.as_str(), b.count as u64)).collect();
    let bar_chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Applications by Status "))
        .data(&bars[..])
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(palette.chart))
        .value_style(Style::default().fg(palette.background).bg(palette.chart));
    frame.render_widget(bar_chart, chunks[0]);

    let over_time = applications_over_time(app.router().jobs());
    let points: Vec<(f64, f64)> = over_time
        .iter()
        .enumerate()
        .map(|(i, b)| (i as f64, b.count as f64))
        .collect();
    let max_count = over_time.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let x_labels: Vec<String> = match (over_time.first(), over_time.last()) {
        (Some(first), Some(last)) if over_time.len() > 1 => vec![first.name.clone(), last.name.clone()],
        (Some(only), _) => vec![only.name.clone()],
        _ => Vec::new(),
    };
    let dataset = Dataset::default()
        .name("count")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(palette.chart))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Applications Over Time (by Date Saved) "),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(palette.dim))
                .bounds([0.0, (points.len().saturating_sub(1)).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(palette.dim))
                .bounds([0.0, max_count.max(1.0)])
                .labels(vec!["0".to_string(), format!("{}", max_count as u64)]),
        );
    frame.render_widget(chart, chunks[1]);
}

fn draw_form(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette, area: Rect) {
    let Some(session) = app.router().session() else { return };
    let rows = form_rows(app);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let selected = i == ui.form_cursor;
        let marker = if selected { "> " } else { "  " };
        let base = if selected {
            Style::default().bg(palette.highlight_bg)
        } else {
            Style::default()
        };

        match row {
            FormRow::Field(field) => {
                let value = match &ui.mode {
                    Mode::EditField { field: editing, buffer } if editing == field => format!("{}_", buffer),
                    _ => session.field_value(*field),
                };
                let value = if *field == FormField::JobDescription {
                    first_line(&value)
                } else {
                    value
                };
                let required = if field.is_required() { "*" } else { " " };
                let value_style = if *field == FormField::Status {
                    base.fg(palette.status(session.buffer().status))
                } else {
                    base
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{}{}{:<16}", marker, required, field.label()), base.fg(palette.dim)),
                    Span::styled(value, value_style),
                ]));
            }
            FormRow::Document(index) => {
                if *index == 0 {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Documents",
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                }
                if let Some(doc) = session.document_at(*index) {
                    let kind = if doc.is_previewable() { " [pdf]" } else { "" };
                    lines.push(Line::from(Span::styled(
                        format!("{}{}{}", marker, doc.file_name, kind),
                        base,
                    )));
                }
            }
        }
    }
    if session.is_editing() && session.buffer().documents.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "No documents. u: upload",
            Style::default().fg(palette.dim),
        )));
    }

    let title = if session.is_editing() {
        " Edit Application "
    } else {
        " Add Application "
    };
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    // Right panel: description, or links for the selected document
    let detail = match rows.get(ui.form_cursor) {
        Some(FormRow::Document(index)) => match session.document_at(*index) {
            Some(doc) => {
                let endpoints = app.endpoints();
                let mut text = vec![
                    Line::from(Span::styled(
                        doc.file_name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!("Type: {}", doc.content_type)),
                    Line::from(""),
                ];
                if doc.is_previewable() {
                    text.push(Line::from(format!("View: {}", endpoints.view(doc.id))));
                }
                text.push(Line::from(format!("Download: {}", endpoints.download(doc.id))));
                text.push(Line::from(""));
                text.push(Line::from(Span::styled("x: delete", Style::default().fg(palette.dim))));
                Text::from(text)
            }
            None => Text::raw(""),
        },
        _ => {
            let description = session.buffer().job_description.clone().unwrap_or_default();
            let width = chunks[1].width.saturating_sub(2).max(10) as usize;
            Text::from(
                textwrap::fill(&description, width)
                    .lines()
                    .map(|l| Line::from(l.to_string()))
                    .collect::<Vec<_>>(),
            )
        }
    };
    frame.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Detail ")),
        chunks[1],
    );
}

fn first_line(value: &str) -> String {
    let line = value.lines().next().unwrap_or("");
    if line.chars().count() > 40 || value.lines().count() > 1 {
        let short: String = line.chars().take(37).collect();
        format!("{}...", short)
    } else {
        line.to_string()
    }
}

fn draw_footer(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette, area: Rect) {
    let line = if let Some(confirm) = app.confirm_pending() {
        Line::from(Span::styled(
            confirm.prompt(),
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
        ))
    } else if let Mode::UploadPath(buffer) = &ui.mode {
        Line::from(format!(" Upload file: {}_", buffer))
    } else if let Some(status) = app.status() {
        let color = if status.is_error { palette.error } else { palette.accent };
        Line::from(Span::styled(format!(" {}", status.text), Style::default().fg(color)))
    } else {
        let help = match app.router().view() {
            View::Dashboard => " j/k:move  e:edit  d:delete  /:search  s:sort column  S:flip sort  t:theme  r:reload  q:quit",
            View::Calendar => " h/l:month  1/2/3:views  t:theme  q:quit",
            View::Reports => " 1/2/3:views  t:theme  q:quit",
            View::Form => " j/k:field  Enter:edit  ←/→:status  u:upload  x:delete doc  Ctrl-s:save  Esc:cancel",
        };
        Line::from(Span::styled(help, Style::default().fg(palette.dim)))
    };
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_truncates_long_descriptions() {
        assert_eq!(first_line("short"), "short");
        assert_eq!(first_line("one\ntwo"), "one...");
        let long = "x".repeat(50);
        assert_eq!(first_line(&long), format!("{}...", "x".repeat(37)));
    }
}
