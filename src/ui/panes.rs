//! Stateless pane renderers
//!
//! Each function takes the [`App`] state and a target rectangle and draws
//! one pane. Scroll offsets count lines back from the bottom, so `0` always
//! shows the latest output.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, FocusedPane};
use super::theme::DEFAULT_THEME as THEME;
use crate::session::LineKind;

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            THEME.border_focused
        } else {
            THEME.border_normal
        }))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD),
        ))
}

/// Console scrollback: command echoes and their output.
pub fn render_console(f: &mut Frame, app: &App, area: Rect) {
    let block = pane_block("console", app.focused_pane == FocusedPane::Console);
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = app
        .console
        .lines()
        .iter()
        .map(|line| {
            let style = match line.kind {
                LineKind::Plain => Style::default().fg(THEME.fg),
                LineKind::Info => Style::default().fg(THEME.info),
                LineKind::Error => Style::default().fg(THEME.error),
            };
            Line::from(Span::styled(line.text.clone(), style))
        })
        .collect();

    let total = lines.len();
    let first = total
        .saturating_sub(inner_height)
        .saturating_sub(app.console_scroll);
    let visible: Vec<Line> = lines.into_iter().skip(first).take(inner_height).collect();

    f.render_widget(Paragraph::new(visible).block(block), area);
}

/// Current hit list, one `*(type *)address` per line.
pub fn render_hits(f: &mut Frame, app: &App, area: Rect) {
    let count = app.session.hits.len();
    let title = format!("hits ({})", count);
    let block = pane_block(&title, app.focused_pane == FocusedPane::Hits);
    let inner_height = area.height.saturating_sub(2) as usize;

    let first = count.saturating_sub(inner_height).saturating_sub(app.hits_scroll);
    let lines: Vec<Line> = app
        .session
        .hits
        .iter()
        .enumerate()
        .skip(first)
        .take(inner_height)
        .map(|(i, hit)| {
            Line::from(vec![
                Span::styled(format!("{:4}. ", i + 1), Style::default().fg(THEME.comment)),
                Span::styled(
                    format!("*({} *)", hit.vtype),
                    Style::default().fg(THEME.type_name),
                ),
                Span::styled(
                    format!("0x{:08x}", hit.addr),
                    Style::default().fg(THEME.address),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Input line with a prompt marker; the caller positions the cursor.
pub fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let block = pane_block("command", true);
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(THEME.prompt)),
        Span::styled(app.input.clone(), Style::default().fg(THEME.fg)),
    ]);
    f.render_widget(Paragraph::new(line).block(block), area);

    let cursor_x = area.x + 3 + app.cursor as u16;
    let cursor_y = area.y + 1;
    f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), cursor_y));
}

/// One-line status bar: attach state, pointer width, hits, output base.
pub fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let attached = match &app.session.target {
        Some(_) => "attached",
        None => "not attached",
    };
    let text = format!(
        " {} | {}-bit addresses | {} hit{} | base {}{}",
        attached,
        app.session.addr_width().bits(),
        app.session.hits.len(),
        if app.session.hits.len() == 1 { "" } else { "s" },
        app.session.config.cli.base,
        if app.session.config.cli.quiet {
            " | quiet"
        } else {
            ""
        },
    );
    let bar = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(THEME.status_fg).bg(THEME.status_bg),
    )))
    .style(Style::default().bg(THEME.status_bg));
    f.render_widget(bar, area);
}
