//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source pane, which displays the C0 program with
//! basic syntax highlighting, the cursor line and the line of a compile error.
//!
//! # Features
//!
//! - Syntax highlighting for C0 keywords, type names, strings and numbers
//! - Cursor line highlighting; the listing pane follows the cursor
//! - Error line shown in the error color
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without running the lexer, so it also works on
//! sources that fail to tokenize.

use crate::analyser::symbols::Ty;
use crate::parser::lexer::TokenKind;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for C0 code
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Strings, either quote
        if c == '"' || c == '\'' {
            if !current_word.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_word)));
            }
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                if chars[end] == '\\' {
                    end += 2;
                } else {
                    end += 1;
                }
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' && c != '.' {
            if !current_word.is_empty() {
                let is_call = c == '(';
                let style = word_style(&current_word, is_call);
                spans.push(Span::styled(std::mem::take(&mut current_word), style));
            }

            let style = match c {
                '{' | '}' | '(' | ')' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    if !current_word.is_empty() {
        let style = word_style(&current_word, false);
        spans.push(Span::styled(current_word, style));
    }

    Line::from(spans)
}

fn word_style(word: &str, is_call: bool) -> Style {
    if Ty::from_name(word).is_some() {
        Style::default().fg(DEFAULT_THEME.type_name)
    } else if TokenKind::keyword(word).is_some() {
        Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD)
    } else if word.starts_with(|c: char| c.is_ascii_digit()) {
        Style::default().fg(DEFAULT_THEME.number)
    } else if is_call {
        Style::default().fg(DEFAULT_THEME.function)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Render the source code pane.
///
/// `scroll_offset` is adjusted so that `cursor_line` stays visible.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    cursor_line: usize,
    error_line: Option<usize>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    let cursor_idx = cursor_line.saturating_sub(1);
    if cursor_idx < *scroll_offset {
        *scroll_offset = cursor_idx;
    } else if cursor_idx >= *scroll_offset + visible_height {
        *scroll_offset = cursor_idx + 1 - visible_height;
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_cursor = line_num == cursor_line;
            let is_error = error_line == Some(line_num);
            let line_num_str = format!("{:4} ", line_num);

            let (num_style, content_base_style) = if is_error {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_cursor {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Style::default().bg(DEFAULT_THEME.current_line_bg),
                )
            } else {
                (Style::default().fg(DEFAULT_THEME.comment), Style::default())
            };

            let mut content_line = highlight_source_code(line);

            if is_error {
                for span in &mut content_line.spans {
                    span.style = content_base_style;
                }
            } else if is_cursor {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(content_base_style);
                }
            }

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);

            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_splits_words() {
        let line = highlight_source_code("let x: int = f(1);");
        assert_eq!(
            texts(&line),
            vec!["let", " ", "x", ":", " ", "int", " ", "=", " ", "f", "(", "1", ")", ";"]
        );
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        assert_eq!(line.spans[5].style.fg, Some(DEFAULT_THEME.type_name));
        assert_eq!(line.spans[9].style.fg, Some(DEFAULT_THEME.function));
        assert_eq!(line.spans[11].style.fg, Some(DEFAULT_THEME.number));
    }

    #[test]
    fn test_highlight_strings() {
        let line = highlight_source_code("x = 'a b';");
        assert!(texts(&line).contains(&"'a b'".to_string()));

        // Unterminated strings run to the end of the line
        let line = highlight_source_code("\"abc");
        assert_eq!(texts(&line), vec!["\"abc"]);
    }
}
