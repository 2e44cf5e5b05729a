use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen split of the host: one status line above the game area.
#[derive(Debug, Clone, Copy)]
pub struct ScreenRects {
    pub top: Rect,
    pub hero: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenRects {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status line
            Constraint::Min(1),    // hero
        ])
        .split(area);
    ScreenRects {
        top: chunks[0],
        hero: chunks[1],
    }
}

/// Drop-down overlay: log and input on the left, actions panel on the right.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRects {
    pub overlay: Rect,
    pub console: Rect,
    pub panel: Rect,
}

/// Below this width the panel is dropped and the console takes the overlay.
const MIN_SPLIT_WIDTH: u16 = 60;

/// Lay out the overlay covering `fraction` of the screen height, anchored at
/// the top. Returns `None` when the fraction rounds to nothing.
pub fn overlay_layout(area: Rect, fraction: f64) -> Option<OverlayRects> {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction <= 0.0 || area.height == 0 {
        return None;
    }
    // title + log + input need three rows
    let height = ((area.height as f64) * fraction).round() as u16;
    let height = height.max(3).min(area.height);
    let overlay = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height,
    };

    if overlay.width < MIN_SPLIT_WIDTH {
        return Some(OverlayRects {
            overlay,
            console: overlay,
            panel: Rect { width: 0, ..overlay },
        });
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(overlay);
    Some(OverlayRects {
        overlay,
        console: cols[0],
        panel: cols[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_layout_reserves_status_line() {
        let rects = screen_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(rects.top.height, 1);
        assert_eq!(rects.hero.y, 1);
        assert_eq!(rects.hero.height, 23);
    }

    #[test]
    fn overlay_covers_fraction_of_height() {
        let rects = overlay_layout(Rect::new(0, 0, 100, 40), 0.5).unwrap();
        assert_eq!(rects.overlay.height, 20);
        assert_eq!(rects.console.width + rects.panel.width, 100);
        assert!(rects.panel.width > 0);
        assert_eq!(rects.panel.x, rects.console.width);
    }

    #[test]
    fn overlay_has_minimum_height() {
        let rects = overlay_layout(Rect::new(0, 0, 100, 10), 0.1).unwrap();
        assert_eq!(rects.overlay.height, 3);
    }

    #[test]
    fn zero_fraction_hides_overlay() {
        assert!(overlay_layout(Rect::new(0, 0, 100, 40), 0.0).is_none());
        assert!(overlay_layout(Rect::new(0, 0, 0, 0), 0.5).is_none());
    }

    #[test]
    fn narrow_screen_drops_panel() {
        let rects = overlay_layout(Rect::new(0, 0, 40, 20), 1.0).unwrap();
        assert_eq!(rects.console, rects.overlay);
        assert_eq!(rects.panel.width, 0);
        assert_eq!(rects.overlay.height, 20);
    }
}
