//! Instruction listing pane
//!
//! Shows the compiled [`Program`] one instruction per row: address, operation,
//! operand and the source location that emitted it. Instructions emitted for the
//! source pane's cursor line are highlighted.

use crate::instruction::{Operation, Program};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn operation_style(op: Operation) -> Style {
    match op {
        Operation::Jmp | Operation::Jz | Operation::Call | Operation::Ret => {
            Style::default()
                .fg(DEFAULT_THEME.jump)
                .add_modifier(Modifier::BOLD)
        }
        Operation::Lod | Operation::Sto | Operation::Lodg | Operation::Stog => {
            Style::default().fg(DEFAULT_THEME.type_name)
        }
        Operation::Lit => Style::default().fg(DEFAULT_THEME.number),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Rows for the listing, highlighted rows marked
fn listing_lines(program: &Program, highlighted: &[usize]) -> Vec<Line<'static>> {
    program
        .instructions
        .iter()
        .zip(&program.locations)
        .enumerate()
        .map(|(index, (instruction, location))| {
            let is_highlighted = highlighted.contains(&index);
            let marker = if is_highlighted { "▶" } else { " " };
            let operand = instruction
                .operand
                .map(|n| n.to_string())
                .unwrap_or_default();

            let mut spans = vec![
                Span::styled(
                    format!("{}{:4} ", marker, index),
                    Style::default().fg(if is_highlighted {
                        DEFAULT_THEME.secondary
                    } else {
                        DEFAULT_THEME.comment
                    }),
                ),
                Span::styled(
                    format!("{:<5}", instruction.op.mnemonic()),
                    operation_style(instruction.op),
                ),
                Span::styled(format!("{:>6}", operand), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(
                    format!("   {}:{}", location.line, location.column),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
            ];

            if is_highlighted {
                for span in &mut spans {
                    span.style = span.style.bg(DEFAULT_THEME.current_line_bg);
                }
            }
            Line::from(spans)
        })
        .collect()
}

/// Render the instruction listing.
///
/// When `follow` is set the scroll offset is moved to the first highlighted
/// instruction; otherwise it is only clamped.
pub fn render_listing_pane(
    frame: &mut Frame,
    area: Rect,
    program: &Program,
    highlighted: &[usize],
    is_focused: bool,
    follow: bool,
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
        .title(format!(" Instructions ({}) ", program.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    if program.is_empty() {
        let paragraph = Paragraph::new("(no instructions)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let total = program.len();

    if follow {
        if let Some(&first) = highlighted.first() {
            *scroll_offset = first.saturating_sub(visible_height / 4);
        }
    }
    if total > visible_height {
        *scroll_offset = (*scroll_offset).min(total - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let lines: Vec<Line> = listing_lines(program, highlighted)
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
