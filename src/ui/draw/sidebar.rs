//! Sidebar: threat level, people/weapon counts and detected subjects

use parking_lot::Mutex;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui_image::{Resize, StatefulImage};
use std::sync::Arc;

use crate::case::Case;
use crate::dashboard::Dashboard;
use crate::media::{MediaSlot, ThumbnailManager};
use crate::ui::layout::SubjectGrid;
use crate::ui::subject_card::{SubjectCard, THUMB_WIDTH};
use crate::ui::theme::Theme;

pub(crate) const NO_SUBJECT: &str = "NO SUBJECT DETECTED";

pub(super) fn draw_sidebar(
    f: &mut Frame,
    dashboard: &Dashboard,
    area: Rect,
    thumbnails: Option<&Arc<Mutex<ThumbnailManager>>>,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Threat level
            Constraint::Length(4), // Counts
            Constraint::Min(3),    // Subjects
        ])
        .split(area);

    let case = dashboard.active_case();
    draw_threat_level(f, case, chunks[0], theme);
    draw_counts(f, case, chunks[1], theme);
    draw_subjects(f, dashboard, chunks[2], thumbnails, theme);
}

fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dimmed_alt))
        .title(title)
        .style(Style::default().bg(theme.panel))
}

fn draw_threat_level(f: &mut Frame, case: &Case, area: Rect, theme: &Theme) {
    let color = case.severity.color();
    let level = Paragraph::new(Line::styled(
        case.severity.label(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(panel(" THREAT LEVEL ", theme).border_style(Style::default().fg(color)));
    f.render_widget(level, area);
}

fn draw_counts(f: &mut Frame, case: &Case, area: Rect, theme: &Theme) {
    let weapon_color = if case.weapon_count > 0 {
        theme.alert
    } else {
        theme.foreground
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(" PEOPLE   ", Style::default().fg(theme.dimmed)),
            Span::styled(
                case.people_count.to_string(),
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(" WEAPONS  ", Style::default().fg(theme.dimmed)),
            Span::styled(
                case.weapon_count.to_string(),
                Style::default().fg(weapon_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines).block(panel(" DETECTIONS ", theme)), area);
}

fn draw_subjects(
    f: &mut Frame,
    dashboard: &Dashboard,
    area: Rect,
    thumbnails: Option<&Arc<Mutex<ThumbnailManager>>>,
    theme: &Theme,
) {
    let case = dashboard.active_case();
    let title = format!(" SUBJECTS ({}) ", case.subjects.len());
    let block = panel(&title, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if case.subjects.is_empty() {
        let empty = Paragraph::new(NO_SUBJECT)
            .style(Style::default().fg(theme.dimmed_alt))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let has_graphics = thumbnails
        .as_ref()
        .map(|m| m.lock().supports_graphics())
        .unwrap_or(false);

    // Collect cached thumbnails under the lock, render after releasing it
    let mut thumbs_to_render = Vec::new();
    let grid = SubjectGrid::default();
    {
        let mgr = thumbnails.map(|m| m.lock());

        for (idx, subject) in case.subjects.iter().enumerate() {
            let Some(card_area) = grid.card_area(inner, idx) else {
                continue;
            };

            let failed = dashboard
                .media()
                .is_failed(&MediaSlot::SubjectImage(subject.name.clone()));
            let protocol = match (&mgr, &subject.image) {
                (Some(mgr), Some(image)) if has_graphics && !failed => mgr.get_cached(image),
                _ => None,
            };

            let card = SubjectCard::new(subject, theme)
                .image_failed(failed)
                .thumb_space(protocol.is_some());
            f.render_widget(card, card_area);

            if let Some(protocol) = protocol {
                thumbs_to_render.push((card_area, protocol));
            }
        }
    }

    for (card_area, protocol) in thumbs_to_render {
        let thumb_area = Rect {
            x: card_area.x + 1,
            y: card_area.y,
            width: THUMB_WIDTH.min(card_area.width.saturating_sub(1)),
            height: card_area.height,
        };
        let image = StatefulImage::new(None).resize(Resize::Fit(None));
        let mut proto = protocol.lock();
        f.render_stateful_widget(image, thumb_area, &mut *proto);
    }
}
