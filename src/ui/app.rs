//! Main TUI application state and logic

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use super::panes;
use crate::session::{Console, Session};

/// Which pane scroll keys act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Console,
    Hits,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Console => FocusedPane::Hits,
            FocusedPane::Hits => FocusedPane::Console,
        }
    }
}

/// The main application state
pub struct App {
    pub session: Session,
    pub console: Console,

    /// Current input line and cursor offset into it.
    pub input: String,
    pub cursor: usize,

    /// Command history, oldest first, and the position while browsing.
    pub history: Vec<String>,
    history_pos: Option<usize>,
    /// Stash of the unfinished line while browsing history.
    pending_input: String,

    pub focused_pane: FocusedPane,
    /// Lines scrolled back from the bottom; 0 follows the output.
    pub console_scroll: usize,
    pub hits_scroll: usize,

    pub should_quit: bool,
}

impl App {
    /// Wrap a session (and any output produced before the TUI started).
    pub fn new(session: Session, console: Console) -> App {
        App {
            session,
            console,
            input: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_pos: None,
            pending_input: String::new(),
            focused_pane: FocusedPane::Console,
            console_scroll: 0,
            hits_scroll: 0,
            should_quit: false,
        }
    }

    /// Run the TUI event loop until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit || !self.session.is_running() {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(rows[0]);

        panes::render_console(f, self, columns[0]);
        panes::render_hits(f, self, columns[1]);
        panes::render_input(f, self, rows[1]);
        panes::render_status(f, self, rows[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(self.byte_cursor(), c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.input.remove(self.byte_cursor());
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.input.chars().count() {
                    self.input.remove(self.byte_cursor());
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.input.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.chars().count(),
            KeyCode::Up => self.history_back(),
            KeyCode::Down => self.history_forward(),
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::PageUp => self.scroll(8),
            KeyCode::PageDown => self.scroll_back(8),
            _ => {}
        }
    }

    /// Byte offset of the character cursor, for `String` editing.
    fn byte_cursor(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.history_pos = None;
        self.console_scroll = 0;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.history.last().map(String::as_str) != Some(trimmed) {
            self.history.push(trimmed.to_string());
        }

        self.console.print(format!("> {}", trimmed));
        self.session.execute(trimmed, &mut self.console);
        if !self.session.is_running() {
            self.should_quit = true;
        }
    }

    fn history_back(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.pending_input = self.input.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(pos) => pos - 1,
        };
        self.history_pos = Some(pos);
        self.input = self.history[pos].clone();
        self.cursor = self.input.chars().count();
    }

    fn history_forward(&mut self) {
        let pos = match self.history_pos {
            None => return,
            Some(pos) => pos,
        };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            self.input = self.history[pos + 1].clone();
        } else {
            self.history_pos = None;
            self.input = std::mem::take(&mut self.pending_input);
        }
        self.cursor = self.input.chars().count();
    }

    fn scroll(&mut self, lines: usize) {
        match self.focused_pane {
            FocusedPane::Console => {
                let max = self.console.len().saturating_sub(1);
                self.console_scroll = (self.console_scroll + lines).min(max);
            }
            FocusedPane::Hits => {
                let max = self.session.hits.len().saturating_sub(1);
                self.hits_scroll = (self.hits_scroll + lines).min(max);
            }
        }
    }

    fn scroll_back(&mut self, lines: usize) {
        match self.focused_pane {
            FocusedPane::Console => {
                self.console_scroll = self.console_scroll.saturating_sub(lines)
            }
            FocusedPane::Hits => self.hits_scroll = self.hits_scroll.saturating_sub(lines),
        }
    }
}
