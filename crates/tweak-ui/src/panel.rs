use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem as Row, ListState},
    Frame,
};

use crate::list_item::ListItem;

/// Selection within the actions panel.
#[derive(Debug, Default)]
pub struct PanelState {
    list: ListState,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list.selected()
    }

    /// Move down one row, wrapping to the top.
    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.list.select(None);
            return;
        }
        let next = match self.list.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list.select(Some(next));
    }

    /// Move up one row, wrapping to the bottom.
    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            self.list.select(None);
            return;
        }
        let prev = match self.list.selected() {
            Some(0) | None => len - 1,
            Some(i) => (i - 1).min(len - 1),
        };
        self.list.select(Some(prev));
    }

    /// Keep the selection inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        match self.list.selected() {
            _ if len == 0 => self.list.select(None),
            Some(i) if i >= len => self.list.select(Some(len - 1)),
            _ => {}
        }
    }
}

fn header_style(collapsed: bool) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    if collapsed {
        style.fg(Color::DarkGray)
    } else {
        style.fg(Color::Yellow)
    }
}

fn rows(items: &[ListItem]) -> Vec<Row<'_>> {
    let mut in_group = false;
    items
        .iter()
        .map(|item| {
            let line = match item {
                ListItem::Group { key, title, collapsed } => {
                    let marker = if *collapsed { "▸" } else { "▾" };
                    // sections have bare keys; sub-groups are `section/group`
                    in_group = key.contains('/');
                    let indent = if in_group { "  " } else { "" };
                    Line::from(Span::styled(
                        format!("{}{} {}", indent, marker, title),
                        header_style(*collapsed),
                    ))
                }
                ListItem::Action(action) => {
                    let indent = if in_group { "    " } else { "  " };
                    let mut spans = vec![Span::raw(format!("{}{}", indent, action.name))];
                    if action.requires_confirmation {
                        spans.push(Span::styled(" !", Style::default().fg(Color::Red)));
                    }
                    Line::from(spans)
                }
                ListItem::Variable(var) => {
                    let indent = if in_group { "    " } else { "  " };
                    let value_style = if var.read_only {
                        Style::default().fg(Color::DarkGray)
                    } else if var.is_default {
                        Style::default().fg(Color::White)
                    } else {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    };
                    Line::from(vec![
                        Span::raw(format!("{}{} ", indent, var.name)),
                        Span::styled(var.value.clone(), value_style),
                    ])
                }
            };
            Row::new(line)
        })
        .collect()
}

/// Render the actions panel. The selected row is highlighted only while the
/// panel has focus.
pub fn render_actions_panel(
    f: &mut Frame,
    area: Rect,
    items: &[ListItem],
    state: &mut PanelState,
    focused: bool,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    state.clamp(items.len());

    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" ACTIONS ")
        .style(Style::default().bg(Color::Black));

    if items.is_empty() {
        f.render_widget(block, area);
        return;
    }

    let highlight = if focused {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let list = List::new(rows(items))
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol(if focused { "> " } else { "  " });
    f.render_stateful_widget(list, area, &mut state.list);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_item::{ActionItem, VariableItem};
    use ratatui::{backend::TestBackend, Terminal};
    use tweak_core::action::ActionId;
    use tweak_core::variable::{VarKind, VariableId};

    fn sample() -> Vec<ListItem> {
        vec![
            ListItem::group("Actions", "Actions", false),
            ListItem::Action(ActionItem {
                id: ActionId(0),
                name: "Jump".into(),
                requires_confirmation: false,
            }),
            ListItem::group("Actions/Weapons", "Weapons", false),
            ListItem::Action(ActionItem {
                id: ActionId(1),
                name: "Nuke".into(),
                requires_confirmation: true,
            }),
            ListItem::group("Variables", "Variables", true),
            ListItem::Variable(VariableItem {
                id: VariableId(0),
                name: "lives".into(),
                value: "3".into(),
                kind: VarKind::Int,
                is_default: true,
                read_only: false,
            }),
        ]
    }

    fn render_to_text(
        width: u16,
        height: u16,
        items: &[ListItem],
        state: &mut PanelState,
    ) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_actions_panel(f, f.area(), items, state, true))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect()
    }

    #[test]
    fn renders_headers_and_rows() {
        let mut state = PanelState::new();
        let text = render_to_text(40, 10, &sample(), &mut state);
        assert!(text.contains("ACTIONS"));
        assert!(text.contains("▾ Actions"));
        assert!(text.contains("▾ Weapons"));
        assert!(text.contains("Nuke !"));
        assert!(text.contains("▸ Variables"));
        assert!(text.contains("lives 3"));
    }

    #[test]
    fn highlights_selected_row() {
        let mut state = PanelState::new();
        state.select_next(6);
        state.select_next(6);
        let text = render_to_text(40, 10, &sample(), &mut state);
        assert!(text.contains(">   Jump"));
    }

    #[test]
    fn no_panic_with_zero_area_or_no_items() {
        let mut state = PanelState::new();
        render_to_text(1, 1, &sample(), &mut state);
        let text = render_to_text(30, 5, &[], &mut state);
        assert!(text.contains("ACTIONS"));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut state = PanelState::new();
        state.select_prev(3);
        assert_eq!(state.selected(), Some(2));
        state.select_next(3);
        assert_eq!(state.selected(), Some(0));
        state.select_next(3);
        assert_eq!(state.selected(), Some(1));
        state.select_next(0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn clamp_follows_shrinking_list() {
        let mut state = PanelState::new();
        state.select_prev(5);
        assert_eq!(state.selected(), Some(4));
        state.clamp(2);
        assert_eq!(state.selected(), Some(1));
        state.clamp(0);
        assert_eq!(state.selected(), None);
    }
}
