//! Primary panel: drone feed, mission map or AI summary
//!
//! Videos are never decoded; the drone feed shows the clip reference with a
//! phase overlay. The map image goes through the thumbnail cache like the
//! subject pictures.

use parking_lot::Mutex;
use ratatui::{
    layout::{Alignment, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use ratatui_image::{Resize, StatefulImage};
use std::sync::Arc;

use super::header::status_line;
use crate::config::AssetsConfig;
use crate::dashboard::{Dashboard, View};
use crate::media::{MediaSlot, ThumbnailManager};
use crate::phase::Phase;
use crate::ui::theme::Theme;

pub(crate) const NO_SIGNAL: &str = "NO SIGNAL DETECTED";
pub(crate) const STANDING_BY: &str = "DRONE STANDING BY";
pub(crate) const MAP_UNAVAILABLE: &str = "MAP DATA UNAVAILABLE.";

pub(super) fn draw_primary(
    f: &mut Frame,
    dashboard: &Dashboard,
    assets: &AssetsConfig,
    area: Rect,
    thumbnails: Option<&Arc<Mutex<ThumbnailManager>>>,
    theme: &Theme,
) {
    let view = dashboard.view();

    let mut tag = Vec::new();
    if view == View::Drone {
        tag.push(Span::styled("● REC ", Style::default().fg(theme.alert)));
    }
    tag.push(Span::styled(format!("{} ", view.tag()), Style::default().fg(theme.dimmed)));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dimmed_alt))
        .title(format!(" {} ", view.title()))
        .title(Line::from(tag).right_aligned())
        .style(Style::default().bg(theme.panel));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    match view {
        View::Drone => draw_drone(f, dashboard, assets, inner, theme),
        View::Map => draw_map(f, dashboard, assets, inner, thumbnails, theme),
        View::Summary => draw_summary(f, dashboard, inner, theme),
    }
}

/// Pad `lines` at the top so they sit in the vertical middle of `height`
fn centered(mut lines: Vec<Line<'static>>, height: u16) -> Vec<Line<'static>> {
    let pad = (height as usize).saturating_sub(lines.len()) / 2;
    let mut out = vec![Line::default(); pad];
    out.append(&mut lines);
    out
}

fn draw_drone(f: &mut Frame, dashboard: &Dashboard, assets: &AssetsConfig, area: Rect, theme: &Theme) {
    let state = dashboard.phase_state();
    let placeholder = Style::default().fg(theme.dimmed_alt).add_modifier(Modifier::BOLD);

    let lines = if dashboard.media().is_failed(&MediaSlot::DroneFeed) {
        vec![Line::styled(NO_SIGNAL, placeholder)]
    } else {
        match dashboard.drone_feed_source(assets) {
            None => vec![Line::styled(STANDING_BY, placeholder)],
            Some(source) => {
                let mut lines = vec![
                    Line::styled(format!("▶ {}", source), Style::default().fg(theme.dimmed)),
                    Line::default(),
                    Line::styled(
                        state.phase.label(),
                        Style::default().fg(theme.status).add_modifier(Modifier::BOLD),
                    ),
                    Line::styled(status_line(state), Style::default().fg(theme.foreground)),
                ];
                if state.phase == Phase::Scanning && state.detected {
                    lines.push(Line::default());
                    lines.push(Line::styled(
                        "WEAPON DETECTED",
                        Style::default().fg(theme.alert).add_modifier(Modifier::BOLD),
                    ));
                }
                lines
            }
        }
    };

    let feed = Paragraph::new(centered(lines, area.height)).alignment(Alignment::Center);
    f.render_widget(feed, area);
}

fn draw_map(
    f: &mut Frame,
    dashboard: &Dashboard,
    assets: &AssetsConfig,
    area: Rect,
    thumbnails: Option<&Arc<Mutex<ThumbnailManager>>>,
    theme: &Theme,
) {
    if dashboard.media().is_failed(&MediaSlot::Map) {
        let lines = vec![Line::styled(
            MAP_UNAVAILABLE,
            Style::default().fg(theme.dimmed_alt).add_modifier(Modifier::BOLD),
        )];
        f.render_widget(
            Paragraph::new(centered(lines, area.height)).alignment(Alignment::Center),
            area,
        );
        return;
    }

    // Only cached protocols, never block the frame on disk
    let protocol = thumbnails.and_then(|m| m.lock().get_cached(&assets.map_image));
    if let Some(protocol) = protocol {
        let image = StatefulImage::new(None).resize(Resize::Fit(None));
        let mut proto = protocol.lock();
        f.render_stateful_widget(image, area, &mut *proto);
        return;
    }

    let case = dashboard.active_case();
    let lines = vec![
        Line::styled(
            format!("MISSION {}", case.mission),
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        ),
        Line::styled(format!("Map: {}", assets.map_image), Style::default().fg(theme.dimmed)),
    ];
    f.render_widget(
        Paragraph::new(centered(lines, area.height)).alignment(Alignment::Center),
        area,
    );
}

fn draw_summary(f: &mut Frame, dashboard: &Dashboard, area: Rect, theme: &Theme) {
    let case = dashboard.active_case();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("CASE {} ", case.id),
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("| {}", case.mission), Style::default().fg(theme.dimmed)),
        ]),
        Line::default(),
        Line::styled(case.summary.clone(), Style::default().fg(theme.foreground)),
    ];

    if dashboard.is_reading() {
        lines.push(Line::default());
        lines.push(Line::styled("Reading briefing...", Style::default().fg(theme.accent)));
    }

    let summary = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(summary, area.inner(Margin::new(1, 0)));
}
