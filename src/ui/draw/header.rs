//! Header: case selector, sync clock and mission status line

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::clock::format_timer;
use crate::dashboard::Dashboard;
use crate::phase::{Phase, PhaseState};
use crate::ui::theme::Theme;

/// Height including borders
pub(super) const HEADER_HEIGHT: u16 = 4;

/// One-line description of where the mission stands
pub(crate) fn status_line(state: PhaseState) -> String {
    match state.phase {
        Phase::Idle => "Awaiting drone tasking".to_string(),
        Phase::EnRoute => format!("Trip ETA: {}", format_timer(state.remaining_secs)),
        Phase::Scanning if state.detected => "Weapon detected, negotiation available".to_string(),
        Phase::Scanning => "Drone scanning on-site".to_string(),
        Phase::Negotiation => "Negotiation channel active".to_string(),
    }
}

pub(super) fn draw_header(f: &mut Frame, dashboard: &Dashboard, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(" THREAT CONSOLE ")
        .style(Style::default().bg(theme.background));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(12)])
        .split(rows[0]);

    // Case buttons
    let mut spans = Vec::new();
    for case in dashboard.cases() {
        let style = if case.id == dashboard.selected_id() {
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dimmed).bg(theme.panel)
        };
        spans.push(Span::styled(format!(" CASE {} ", case.id), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), top[0]);

    let sync = Paragraph::new(format!("SYNC {}", format_timer(dashboard.sync_seconds())))
        .style(Style::default().fg(theme.dimmed).bg(theme.background))
        .alignment(Alignment::Right);
    f.render_widget(sync, top[1]);

    let case = dashboard.active_case();
    let state = dashboard.phase_state();
    let mission = Line::from(vec![
        Span::styled("MISSION ", Style::default().fg(theme.dimmed)),
        Span::styled(
            case.mission.clone(),
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  |  ", Style::default().fg(theme.dimmed_alt)),
        Span::styled(
            state.phase.label(),
            Style::default().fg(theme.status).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default()),
        Span::styled(status_line(state), Style::default().fg(theme.status)),
    ]);
    f.render_widget(
        Paragraph::new(mission).style(Style::default().bg(theme.background)),
        rows[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(PhaseState::IDLE), "Awaiting drone tasking");

        let en_route = PhaseState {
            phase: Phase::EnRoute,
            remaining_secs: 75,
            detected: false,
        };
        assert_eq!(status_line(en_route), "Trip ETA: 01:15");

        let scanning = PhaseState {
            phase: Phase::Scanning,
            remaining_secs: 0,
            detected: false,
        };
        assert_eq!(status_line(scanning), "Drone scanning on-site");
        assert_eq!(
            status_line(PhaseState {
                detected: true,
                ..scanning
            }),
            "Weapon detected, negotiation available"
        );
    }
}
