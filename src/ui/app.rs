//! Main TUI application state and logic

use crate::analyser::CompileError;
use crate::instruction::Program;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Listing,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Listing,
            FocusedPane::Listing => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    /// The compiled source
    pub source_code: String,

    /// Instructions compiled so far; empty when compilation failed
    pub program: Program,

    pub error: Option<CompileError>,

    pub focused_pane: FocusedPane,

    /// 1-based line of the source cursor
    pub cursor_line: usize,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub listing_scroll: usize,

    /// Scroll the listing to the cursor line on the next render
    pub follow_cursor: bool,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create a new app from a source text and its compile result
    pub fn new(source_code: String, result: Result<Program, CompileError>) -> Self {
        let (program, error) = match result {
            Ok(program) => (program, None),
            Err(err) => (Program::default(), Some(err)),
        };
        let status_message = match &error {
            Some(err) => err.to_string(),
            None => format!("Compiled {} instructions", program.len()),
        };
        let cursor_line = error.as_ref().map(|e| e.location().line).unwrap_or(1);

        App {
            source_code,
            program,
            error,
            focused_pane: FocusedPane::Source,
            cursor_line,
            source_scroll: 0,
            listing_scroll: 0,
            follow_cursor: true,
            should_quit: false,
            status_message,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key);
                }
            }
        }

        Ok(())
    }

    fn line_count(&self) -> usize {
        self.source_code.lines().count().max(1)
    }

    /// Render the UI
    pub(crate) fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Source (left) | Instructions (right)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        super::panes::render_source_pane(
            frame,
            columns[0],
            &self.source_code,
            self.cursor_line,
            self.error.as_ref().map(|e| e.location().line),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let highlighted = self.program.indices_for_line(self.cursor_line);
        super::panes::render_listing_pane(
            frame,
            columns[1],
            &self.program,
            &highlighted,
            self.focused_pane == FocusedPane::Listing,
            self.follow_cursor,
            &mut self.listing_scroll,
        );
        self.follow_cursor = false;

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.cursor_line,
            self.line_count(),
            self.error.is_some(),
        );
    }

    /// Handle keyboard events
    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Char('e') => {
                let error = self
                    .error
                    .as_ref()
                    .map(|err| (err.location().line, err.to_string()));
                match error {
                    Some((line, message)) => {
                        self.move_cursor_to(line);
                        self.status_message = message;
                    }
                    None => {
                        self.status_message = "No compile error".to_string();
                    }
                }
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => self.move_cursor_to(self.cursor_line.saturating_sub(1)),
                FocusedPane::Listing => {
                    self.listing_scroll = self.listing_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => self.move_cursor_to(self.cursor_line + 1),
                FocusedPane::Listing => {
                    self.listing_scroll = self.listing_scroll.saturating_add(1);
                }
            },
            KeyCode::Home => self.move_cursor_to(1),
            KeyCode::End => self.move_cursor_to(self.line_count()),
            _ => {}
        }
    }

    fn move_cursor_to(&mut self, line: usize) {
        self.cursor_line = line.clamp(1, self.line_count());
        self.follow_cursor = true;
        if self.error.is_none() {
            let emitted = self.program.indices_for_line(self.cursor_line).len();
            self.status_message = format!(
                "Line {}: {} instruction{}",
                self.cursor_line,
                emitted,
                if emitted == 1 { "" } else { "s" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::{compile_program, compile_statements};
    use ratatui::backend::TestBackend;

    #[test]
    fn test_cursor_moves_within_source() {
        let source = "let a: int = 1;\na = 2;\n";
        let mut app = App::new(source.to_string(), compile_statements(source));
        assert_eq!(app.cursor_line, 1);

        app.handle_key_event(KeyEvent::from(KeyCode::Up));
        assert_eq!(app.cursor_line, 1);
        app.handle_key_event(KeyEvent::from(KeyCode::Down));
        app.handle_key_event(KeyEvent::from(KeyCode::Down));
        assert_eq!(app.cursor_line, 2);
        assert_eq!(app.status_message, "Line 2: 2 instructions");

        app.handle_key_event(KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.focused_pane, FocusedPane::Listing);
        app.handle_key_event(KeyEvent::from(KeyCode::Up));
        assert_eq!(app.cursor_line, 2);

        app.handle_key_event(KeyEvent::from(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_error_positions_cursor() {
        let source = "let a: int = 1;\n\nlet b: int = c;\n";
        let mut app = App::new(source.to_string(), compile_program(source));
        assert!(app.program.is_empty());
        assert_eq!(app.cursor_line, 3);

        app.handle_key_event(KeyEvent::from(KeyCode::Home));
        assert_eq!(app.cursor_line, 1);
        app.handle_key_event(KeyEvent::from(KeyCode::Char('e')));
        assert_eq!(app.cursor_line, 3);
        assert!(app.status_message.contains("'c' is not declared"));
    }

    #[test]
    fn test_error_key_jumps_back_to_error() {
        let source = "let a: int = 1;\nlet b: int = 2;\nb = zz;\nlet c: int = 3;\n";
        let mut app = App::new(source.to_string(), compile_statements(source));
        app.handle_key_event(KeyEvent::from(KeyCode::End));
        assert_eq!(app.cursor_line, 4);
        app.status_message.clear();

        app.handle_key_event(KeyEvent::from(KeyCode::Char('e')));
        assert_eq!(app.cursor_line, 3);
        assert!(app.follow_cursor);
        assert_eq!(
            app.status_message,
            "Compile error at line 3, column 5: 'zz' is not declared"
        );

        let clean = "let a: int = 1;\n";
        let mut app = App::new(clean.to_string(), compile_statements(clean));
        app.handle_key_event(KeyEvent::from(KeyCode::Char('e')));
        assert_eq!(app.cursor_line, 1);
        assert_eq!(app.status_message, "No compile error");
    }

    #[test]
    fn test_render_to_buffer() {
        let source = "fn main() -> void {\n    let x: int = 2 * 3;\n}\n";
        let mut app = App::new(source.to_string(), compile_program(source));
        app.handle_key_event(KeyEvent::from(KeyCode::Down));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Source Code"));
        assert!(text.contains("MUL"));
        assert!(!app.follow_cursor);
    }
}
