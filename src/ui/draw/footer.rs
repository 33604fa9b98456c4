//! Footer: view buttons, briefing control, negotiation button and key hints

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::dashboard::{Dashboard, View};
use crate::ui::theme::Theme;

/// Height of the control bar including borders, plus the hint line
pub(super) const FOOTER_HEIGHT: u16 = 4;

const KEY_HINTS: &str =
    " 1-9/Tab: case | d/m/s: view | e/x: en route/scan | n: negotiate | r: brief | q: quit";

fn view_key(view: View) -> char {
    match view {
        View::Drone => 'd',
        View::Map => 'm',
        View::Summary => 's',
    }
}

pub(super) fn draw_footer(f: &mut Frame, dashboard: &Dashboard, area: Rect, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let selected = Style::default()
        .fg(theme.selection_fg)
        .bg(theme.selection_bg)
        .add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(theme.foreground).bg(theme.panel);

    let mut spans = Vec::new();
    for view in View::ALL {
        let style = if view == dashboard.view() { selected } else { idle };
        spans.push(Span::styled(format!(" [{}] {} ", view_key(view), view.label()), style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw("  "));
    if dashboard.is_reading() {
        spans.push(Span::styled(" Reading... ", Style::default().fg(theme.accent).bg(theme.panel)));
    } else if dashboard.briefing_available() {
        spans.push(Span::styled(" [r] Read Briefing ", idle));
    } else {
        spans.push(Span::styled(
            " [r] Read Briefing ",
            Style::default().fg(theme.dimmed_alt).bg(theme.panel),
        ));
    }

    spans.push(Span::raw(" "));
    let negotiate = if dashboard.negotiation_unlocked() {
        Style::default()
            .fg(theme.background)
            .bg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.dimmed_alt).bg(theme.panel)
    };
    spans.push(Span::styled(" [n] Negotiate ", negotiate));

    if let Some(error) = dashboard.briefing_error() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error.to_string(), Style::default().fg(theme.alert)));
    }

    let controls = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.dimmed_alt))
            .style(Style::default().bg(theme.background)),
    );
    f.render_widget(controls, chunks[0]);

    let hints = Paragraph::new(KEY_HINTS).style(Style::default().fg(theme.dimmed).bg(theme.background));
    f.render_widget(hints, chunks[1]);
}
