pub mod highlight;
pub mod viewport;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Instant;

use crate::buffer::Resident;
use crate::editor::Session;
use crate::mode::Mode;
use highlight::Language;
use viewport::Viewport;

const SHORTCUTS: &str = " ^O Save  ^X Exit  ^C Cancel  ^F Find  ^G Help";

const HELP: &[&str] = &[
    "sedit help",
    "",
    "^O Save    ^X Exit    ^C Cancel    ^F Find",
    "^G Help    Arrows/PgUp/PgDn Move    Mouse Wheel Scroll",
    "",
    "Find: ^F then Enter on an empty entry jumps to the next match, ^C cancels",
    "Exit: if modified, ^X then Enter to save and exit, ^X to force exit, ^C to cancel",
    "Esc while loading cancels the load and keeps the current lines",
    "",
    "Syntax highlighting: cpp/py/js/java/json",
    "",
    "Press any key to return to the editor...",
];

/// Rows available for text in a terminal of `height` rows
pub fn text_height(height: u16) -> usize {
    height.saturating_sub(3).max(1) as usize
}

/// Draw one frame from a locked window
pub fn draw(frame: &mut Frame, session: &Session, resident: &Resident, view: &mut Viewport, mode: &Mode) {
    let area = frame.area();

    if matches!(mode, Mode::Help) {
        let text: Vec<Line> = HELP.iter().map(|l| Line::from(*l)).collect();
        let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let cursor = session.cursor();
    view.set_height(chunks[0].height as usize);
    view.follow(cursor.row);

    draw_text(frame, chunks[0], session, resident, view);
    draw_status(frame, chunks[1], session, resident);
    draw_message(frame, chunks[2], session, mode);
    frame.render_widget(
        Paragraph::new(SHORTCUTS).style(Style::default().add_modifier(Modifier::REVERSED)),
        chunks[3],
    );

    match mode {
        Mode::Prompt(prompt) => {
            let x = (prompt.line().chars().count() as u16).min(area.width.saturating_sub(1));
            frame.set_cursor_position((chunks[2].x + x, chunks[2].y));
        }
        _ => {
            let x = (cursor.col as u16).min(chunks[0].width.saturating_sub(1));
            let y = cursor.row.saturating_sub(view.top) as u16;
            frame.set_cursor_position((chunks[0].x + x, chunks[0].y + y));
        }
    }
}

fn draw_text(frame: &mut Frame, area: Rect, session: &Session, resident: &Resident, view: &Viewport) {
    let language = Language::from_path(session.document().path());
    let highlight = session.search_highlight(Instant::now());

    let lines: Vec<Line> = resident
        .window
        .lines()
        .iter()
        .enumerate()
        .skip(view.top)
        .take(view.height)
        .map(|(row, text)| {
            let mark = highlight
                .filter(|(m, _)| m.row == row)
                .map(|(m, len)| (m.col, len));
            highlight::render_line(text, language, mark)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_status(frame: &mut Frame, area: Rect, session: &Session, resident: &Resident) {
    let document = session.document();
    let mut left = format!(" {}", document.path().display());
    if document.is_new() {
        left.push_str(" (new file)");
    }
    if resident.window.has_dirty() {
        left.push_str(" *");
    }

    let cursor = session.cursor();
    let mut right = format!(
        "Ln {}/{}, Col {} ",
        cursor.absolute_row(&resident.window) + 1,
        resident.total_lines,
        cursor.col + 1
    );
    if session.is_busy() {
        let scanned = session.rows_scanned().unwrap_or(0);
        right = format!("[loading, {} rows scanned] {}", scanned, right);
    }

    let width = area.width as usize;
    let pad = width.saturating_sub(left.chars().count() + right.chars().count());
    let text = format!("{}{}{}", left, " ".repeat(pad), right);

    let style = if session.is_busy() {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_message(frame: &mut Frame, area: Rect, session: &Session, mode: &Mode) {
    let text = match mode {
        Mode::Prompt(prompt) => prompt.line(),
        Mode::ConfirmExit => "File modified. Save? (Enter=Yes, ^X=No, ^C=Cancel)".to_string(),
        _ => session.status().to_string(),
    };
    frame.render_widget(Paragraph::new(text), area);
}
