use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use tweak_core::console::Console;
use tweak_core::logging::LogLevel;

/// What the console overlay shows besides the console state itself.
pub struct ConsoleView<'a> {
    /// Hint shown at the right of the title bar, e.g. the close key.
    pub hint: &'a str,
    /// Question replacing the input line while an answer is pending.
    pub prompt: Option<&'a str>,
    /// Place the terminal cursor in the input line.
    pub show_cursor: bool,
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug => Color::Cyan,
        LogLevel::Trace => Color::DarkGray,
    }
}

/// Render the console part of the overlay into `area`.
///
/// The overlay consists of three bands:
/// 1. **Title bar**: `CONSOLE` label, minimum level shown, and a hint.
/// 2. **Log area**: colour-coded log entries with scroll support.
/// 3. **Input line**: command input with cursor, or a pending prompt.
pub fn render_console(f: &mut Frame, area: Rect, console: &Console, view: ConsoleView<'_>) {
    if area.height < 3 || area.width == 0 {
        return;
    }

    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(1),    // log area
            Constraint::Length(1), // input line
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            " CONSOLE ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  level: {}  ", console.min_level())),
        Span::styled(view.hint, Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        chunks[0],
    );

    // Log lines, newest at the bottom, shifted up by the scroll offset
    let entries: Vec<_> = console.visible_lines().collect();
    let visible_height = chunks[1].height as usize;
    let total = entries.len();
    let end = total.saturating_sub(console.scroll_offset());
    let start = end.saturating_sub(visible_height);

    let lines: Vec<Line> = entries[start..end]
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!(" {:5} ", entry.level),
                    Style::default()
                        .fg(level_color(entry.level))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("[{}] ", entry.target),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(entry.message.as_str()),
            ])
        })
        .collect();

    let log_block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .style(Style::default().bg(Color::Black));

    f.render_widget(
        Paragraph::new(lines)
            .block(log_block)
            .wrap(Wrap { trim: false }),
        chunks[1],
    );

    let input_line = match view.prompt {
        Some(prompt) => Line::from(vec![
            Span::styled(
                "? ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(prompt),
        ]),
        None => Line::from(vec![
            Span::styled(
                "> ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(console.input_buffer.as_str()),
        ]),
    };
    f.render_widget(
        Paragraph::new(input_line).style(Style::default().bg(Color::Black).fg(Color::White)),
        chunks[2],
    );

    if view.show_cursor && view.prompt.is_none() {
        let display_col = console.input_buffer[..console.cursor_pos].width() as u16;
        f.set_cursor_position((chunks[2].x + 2 + display_col, chunks[2].y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_to_rows(
        width: u16,
        height: u16,
        console: &Console,
        view: ConsoleView<'_>,
    ) -> Vec<String> {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_console(f, f.area(), console, view))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| (0..width).map(|x| buffer[(x, y)].symbol().to_string()).collect())
            .collect()
    }

    fn view() -> ConsoleView<'static> {
        ConsoleView {
            hint: "` to close",
            prompt: None,
            show_cursor: true,
        }
    }

    #[test]
    fn shows_title_logs_and_input() {
        let mut console = Console::new(10);
        console.push_line(LogLevel::Info, "tweak", "registered Jump");
        console.set_input("run Jump");
        let rows = render_to_rows(60, 6, &console, view());
        assert!(rows[0].contains("CONSOLE"));
        assert!(rows[0].contains("level: TRACE"));
        assert!(rows[0].contains("` to close"));
        assert!(rows[1].contains("INFO"));
        assert!(rows[1].contains("[tweak] registered Jump"));
        assert!(rows[5].starts_with("> run Jump"));
    }

    #[test]
    fn newest_lines_fill_the_bottom() {
        let mut console = Console::new(50);
        for i in 0..10 {
            console.push_line(LogLevel::Info, "t", format!("line {}", i));
        }
        let rows = render_to_rows(40, 5, &console, view());
        assert!(rows[1].contains("line 7"));
        assert!(rows[3].contains("line 9"));

        console.scroll_up(2);
        let rows = render_to_rows(40, 5, &console, view());
        assert!(rows[3].contains("line 7"));
    }

    #[test]
    fn level_filter_hides_lines() {
        let mut console = Console::new(10);
        console.push_line(LogLevel::Debug, "t", "chatter");
        console.push_line(LogLevel::Error, "t", "boom");
        console.set_min_level(LogLevel::Warn);
        let text = render_to_rows(40, 5, &console, view()).join("\n");
        assert!(!text.contains("chatter"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn prompt_replaces_input_line() {
        let mut console = Console::new(10);
        console.set_input("typed");
        let rows = render_to_rows(
            50,
            4,
            &console,
            ConsoleView {
                hint: "",
                prompt: Some("Run 'Reset Arena'? (y/n)"),
                show_cursor: true,
            },
        );
        assert!(rows[3].starts_with("? Run 'Reset Arena'? (y/n)"));
        assert!(!rows[3].contains("typed"));
    }

    #[test]
    fn too_small_area_draws_nothing() {
        let console = Console::new(10);
        let rows = render_to_rows(20, 2, &console, view());
        assert!(rows.iter().all(|r| r.trim().is_empty()));
    }
}
