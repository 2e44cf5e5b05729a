use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::layout::screen_layout;

/// Contents of the status line drawn above the host's own view.
pub struct ShellView<'a> {
    pub title: &'a str,
    pub status_line: &'a str,
    /// Key that opens the console, shown as a hint.
    pub toggle_key: char,
}

/// Draw the status line and hand the remaining area to `hero`.
pub fn render_shell(
    f: &mut Frame,
    area: Rect,
    view: ShellView<'_>,
    hero: impl FnOnce(&mut Frame, Rect),
) {
    let rects = screen_layout(area);

    let top = Line::from(vec![
        Span::styled(
            format!(" {} ", view.title),
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} ", view.status_line)),
        Span::styled(
            format!("| {} console", view.toggle_key),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(top), rects.top);

    hero(f, rects.hero);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn status_line_and_hero_area() {
        let backend = TestBackend::new(50, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut hero_area = Rect::default();
        terminal
            .draw(|f| {
                let view = ShellView {
                    title: "ARENA",
                    status_line: "enemies: 3",
                    toggle_key: '`',
                };
                render_shell(f, f.area(), view, |_, area| hero_area = area);
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let top: String = (0..50).map(|x| buffer[(x, 0)].symbol().to_string()).collect();
        assert!(top.starts_with(" ARENA  enemies: 3 | ` console"));
        assert_eq!(hero_area, Rect::new(0, 1, 50, 5));
    }
}
